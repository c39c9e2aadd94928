// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    /// Tab-separated text that spreadsheet tools open directly.
    Excel,
}

impl ExportFormat {
    pub const fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Excel => b'\t',
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "export.csv",
            Self::Excel => "export.xlsx",
        }
    }

    /// Pick the format from a file extension; anything but xls/xlsx/tsv is csv.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("xls" | "xlsx" | "tsv") => Self::Excel,
            _ => Self::Csv,
        }
    }
}

// Display names whose record key differs from the normalised name.
const COLUMN_ALIASES: [(&str, &str); 1] = [("selling_price", "unit_price")];

fn column_key(column: &str) -> String {
    column
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch })
        .collect()
}

fn cell(record: &Value, column: &str) -> String {
    let Some(object) = record.as_object() else {
        return String::new();
    };
    let key = column_key(column);
    let alias = COLUMN_ALIASES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, target)| *target);

    let value = object
        .iter()
        .find(|(name, _)| column_key(name) == key)
        .or_else(|| {
            alias.and_then(|alias| object.iter().find(|(name, _)| column_key(name) == alias))
        })
        .map(|(_, value)| value);

    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render records as a header row plus one line per record, columns in the given order.
pub fn render<T: Serialize>(
    records: &[T],
    columns: &[String],
    format: ExportFormat,
) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(Vec::new());
    writer
        .write_record(columns)
        .context("write export header")?;

    for record in records {
        let value = serde_json::to_value(record).context("serialize export record")?;
        let row: Vec<String> = columns.iter().map(|column| cell(&value, column)).collect();
        writer.write_record(&row).context("write export row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("flush export: {}", err.error()))?;
    String::from_utf8(bytes).context("export is not valid utf-8")
}

#[cfg(test)]
mod tests {
    use super::{ExportFormat, render};
    use crate::{Item, ItemId, ItemStatus};
    use anyhow::Result;
    use std::path::Path;

    fn item() -> Item {
        Item {
            id: ItemId::new(9),
            name: "Nail Glue, Pink".to_owned(),
            barcode: "0123".to_owned(),
            sku: "NG-1".to_owned(),
            unit_price: "3.50".to_owned(),
            category: "Nails".to_owned(),
            company: String::new(),
            supplier: "Acme".to_owned(),
            status: ItemStatus::Active,
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn csv_quotes_cells_with_commas() -> Result<()> {
        let output = render(
            &[item()],
            &columns(&["Barcode", "Name", "Selling Price", "Sub-subcategory"]),
            ExportFormat::Csv,
        )?;
        assert_eq!(
            output,
            "Barcode,Name,Selling Price,Sub-subcategory\n0123,\"Nail Glue, Pink\",3.50,\n"
        );
        Ok(())
    }

    #[test]
    fn excel_variant_uses_tabs() -> Result<()> {
        let output = render(&[item()], &columns(&["SKU", "Status", "Id"]), ExportFormat::Excel)?;
        assert_eq!(output, "SKU\tStatus\tId\nNG-1\tActive\t9\n");
        Ok(())
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.XLSX")), ExportFormat::Excel);
        assert_eq!(ExportFormat::from_path(Path::new("out.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
    }
}
