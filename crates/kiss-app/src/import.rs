// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Bulk item import: CSV parsing, per-row validation and the sequential
//! create loop.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::{ItemId, ItemStatus};

pub const REQUIRED_HEADERS: [&str; 5] = [
    "item_name",
    "sku",
    "description",
    "barcode",
    "selling_price",
];

/// Optional columns checked while parsing; blank cells are allowed.
pub const CHECKED_HEADERS: [&str; 3] = ["cost", "msrp", "status"];

/// Columns of the downloadable import template.
pub const TEMPLATE_HEADERS: [&str; 12] = [
    "item_name",
    "barcode",
    "sku",
    "selling_price",
    "category",
    "cost",
    "msrp",
    "status",
    "company",
    "brand",
    "on_hand",
    "description",
];

pub fn template_csv() -> String {
    format!("{}\n", TEMPLATE_HEADERS.join(","))
}

/// One validated data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRow {
    /// 1-based position among the data rows.
    pub row: usize,
    pub item_name: String,
    pub sku: String,
    pub description: String,
    pub barcode: String,
    pub selling_price: f64,
    pub cost: Option<f64>,
    pub msrp: Option<f64>,
    pub status: Option<ItemStatus>,
    /// Non-empty cells under any other header.
    pub extras: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Missing,
    InvalidPrice,
    InvalidStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowProblem {
    pub row: usize,
    pub field: String,
    pub kind: ProblemKind,
}

impl fmt::Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ProblemKind::Missing => write!(f, "row {}: {} is empty", self.row, self.field),
            ProblemKind::InvalidPrice => {
                write!(f, "row {}: {} is not a valid price", self.row, self.field)
            }
            ProblemKind::InvalidStatus => write!(
                f,
                "row {}: {} must be one of Not Confirmed, Active, Inactive, Discontinued",
                self.row, self.field
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file is empty -- start from the import template")]
    Empty,
    #[error("file has a header row but no data rows")]
    NoRows,
    #[error("missing columns: {} -- add them to the header row", .0.join(", "))]
    MissingHeaders(Vec<String>),
    #[error("{} problem(s) in data rows: {}", .0.len(), join_problems(.0))]
    InvalidRows(Vec<RowProblem>),
    #[error("could not read csv")]
    Csv(#[from] csv::Error),
}

fn join_problems(problems: &[RowProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse and validate an import file. Nothing is returned unless every row
/// is usable.
pub fn parse_item_csv(text: &str) -> Result<Vec<ImportRow>, ImportError> {
    let text = text.trim_start_matches('\u{FEFF}');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::Empty);
    }

    let mut columns: HashMap<String, usize> = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        columns.entry(header.to_lowercase()).or_insert(index);
    }

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|header| !columns.contains_key(**header))
        .map(|header| (*header).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingHeaders(missing));
    }

    let mut rows = Vec::new();
    let mut problems = Vec::new();
    let mut row = 0;
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        row += 1;

        let cell = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|index| record.get(*index))
                .unwrap_or_default()
                .to_owned()
        };

        for header in REQUIRED_HEADERS {
            if cell(header).is_empty() {
                problems.push(RowProblem {
                    row,
                    field: header.to_owned(),
                    kind: ProblemKind::Missing,
                });
            }
        }

        let raw_price = cell("selling_price");
        let selling_price = match parse_price(&raw_price) {
            Some(price) => price,
            None => {
                if !raw_price.is_empty() {
                    problems.push(RowProblem {
                        row,
                        field: "selling_price".to_owned(),
                        kind: ProblemKind::InvalidPrice,
                    });
                }
                0.0
            }
        };

        let mut optional_price = |name: &str| -> Option<f64> {
            let raw = cell(name);
            if raw.is_empty() {
                return None;
            }
            let parsed = parse_price(&raw);
            if parsed.is_none() {
                problems.push(RowProblem {
                    row,
                    field: name.to_owned(),
                    kind: ProblemKind::InvalidPrice,
                });
            }
            parsed
        };
        let cost = optional_price("cost");
        let msrp = optional_price("msrp");

        let raw_status = cell("status");
        let status = if raw_status.is_empty() {
            None
        } else {
            let parsed = ItemStatus::parse(&raw_status);
            if parsed.is_none() {
                problems.push(RowProblem {
                    row,
                    field: "status".to_owned(),
                    kind: ProblemKind::InvalidStatus,
                });
            }
            parsed
        };

        let extras = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| {
                let header = header.to_lowercase();
                !header.is_empty()
                    && !REQUIRED_HEADERS.contains(&header.as_str())
                    && !CHECKED_HEADERS.contains(&header.as_str())
            })
            .filter_map(|(index, header)| {
                record
                    .get(index)
                    .filter(|value| !value.is_empty())
                    .map(|value| (header.to_lowercase(), value.to_owned()))
            })
            .collect();

        rows.push(ImportRow {
            row,
            item_name: cell("item_name"),
            sku: cell("sku"),
            description: cell("description"),
            barcode: cell("barcode"),
            selling_price,
            cost,
            msrp,
            status,
            extras,
        });
    }

    if !problems.is_empty() {
        return Err(ImportError::InvalidRows(problems));
    }
    if rows.is_empty() {
        return Err(ImportError::NoRows);
    }
    Ok(rows)
}

fn parse_price(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim_start_matches('$').parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Destination for imported rows; one call per row.
pub trait ItemSink {
    fn create_item(&mut self, row: &ImportRow) -> anyhow::Result<ItemId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

impl ImportProgress {
    fn new(done: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            u8::try_from(done.min(total) * 100 / total).unwrap_or(100)
        };
        Self {
            done,
            total,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowResult {
    Created(ItemId),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub row: usize,
    pub barcode: String,
    pub result: RowResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub outcomes: Vec<RowOutcome>,
}

impl ImportReport {
    pub fn created_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.result, RowResult::Created(_)))
            .count()
    }

    pub fn failures(&self) -> Vec<&RowOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.result, RowResult::Failed(_)))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures().is_empty()
    }
}

/// Create every row in order. A failed row is recorded and the loop moves on.
pub fn import_rows<S, P>(sink: &mut S, rows: &[ImportRow], mut progress: P) -> ImportReport
where
    S: ItemSink + ?Sized,
    P: FnMut(ImportProgress),
{
    let total = rows.len();
    info!(total, "importing items");
    progress(ImportProgress::new(0, total));

    let mut report = ImportReport::default();
    for (index, row) in rows.iter().enumerate() {
        let result = match sink.create_item(row) {
            Ok(id) => RowResult::Created(id),
            Err(err) => {
                error!(row = row.row, barcode = %row.barcode, "item import failed: {err:#}");
                RowResult::Failed(format!("{err:#}"))
            }
        };
        report.outcomes.push(RowOutcome {
            row: row.row,
            barcode: row.barcode.clone(),
            result,
        });
        progress(ImportProgress::new(index + 1, total));
    }

    info!(
        created = report.created_count(),
        failed = report.failures().len(),
        "import finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::{
        ImportError, ImportProgress, ImportRow, ItemSink, ProblemKind, RowResult, import_rows,
        parse_item_csv, template_csv,
    };
    use crate::ItemId;
    use anyhow::{Result, bail};

    const HEADER: &str = "item_name,sku,description,barcode,selling_price";

    struct FlakySink {
        calls: Vec<String>,
        fail_barcode: &'static str,
    }

    impl ItemSink for FlakySink {
        fn create_item(&mut self, row: &ImportRow) -> Result<ItemId> {
            self.calls.push(row.barcode.clone());
            if row.barcode == self.fail_barcode {
                bail!("barcode {} already exists", row.barcode);
            }
            Ok(ItemId::new(i64::try_from(self.calls.len())?))
        }
    }

    #[test]
    fn parses_rows_with_quoted_commas_and_extras() -> Result<()> {
        let text = format!(
            "{HEADER},brand\n\
             Gel Polish, GP-1 ,\"Long wear, high shine\",111,9.99,Kiss\n\
             \n\
             Lash Glue,LG-2,Clear,222,$4.50,\n"
        );
        let rows = parse_item_csv(&text)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sku, "GP-1");
        assert_eq!(rows[0].description, "Long wear, high shine");
        assert_eq!(rows[0].extras.get("brand").map(String::as_str), Some("Kiss"));
        assert_eq!(rows[1].row, 2);
        assert_eq!(rows[1].selling_price, 4.5);
        assert!(rows[1].extras.is_empty());
        Ok(())
    }

    #[test]
    fn missing_headers_are_all_named() {
        let error = parse_item_csv("item_name,description,barcode\nA,B,1\n")
            .expect_err("sku and selling_price are missing");
        match error {
            ImportError::MissingHeaders(missing) => {
                assert_eq!(missing, vec!["sku".to_owned(), "selling_price".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_bad_cell_is_reported_with_its_row() {
        let text = format!("{HEADER}\nA,S1,D,1,2.0\nB,,D,2\nC,S3,D,3,free\n");
        let error = parse_item_csv(&text).expect_err("rows 2 and 3 are bad");
        let ImportError::InvalidRows(problems) = error else {
            panic!("expected row problems");
        };
        let found: Vec<(usize, &str, ProblemKind)> = problems
            .iter()
            .map(|problem| (problem.row, problem.field.as_str(), problem.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                (2, "sku", ProblemKind::Missing),
                (2, "selling_price", ProblemKind::Missing),
                (3, "selling_price", ProblemKind::InvalidPrice),
            ]
        );
    }

    #[test]
    fn optional_price_and_status_cells_are_checked() {
        let text = format!(
            "{HEADER},cost,msrp,status\n\
             A,S1,D,1,2.0,abc,-5,Active\n\
             B,S2,D,2,3.0,,,Retired\n"
        );
        let error = parse_item_csv(&text).expect_err("bad optional cells should abort");
        let ImportError::InvalidRows(problems) = error else {
            panic!("expected row problems");
        };
        let found: Vec<(usize, &str, ProblemKind)> = problems
            .iter()
            .map(|problem| (problem.row, problem.field.as_str(), problem.kind))
            .collect();
        assert_eq!(
            found,
            vec![
                (1, "cost", ProblemKind::InvalidPrice),
                (1, "msrp", ProblemKind::InvalidPrice),
                (2, "status", ProblemKind::InvalidStatus),
            ]
        );
    }

    #[test]
    fn optional_columns_are_typed_when_valid() -> Result<()> {
        let text = format!("{HEADER},cost,msrp,status\nA,S1,D,1,2.0,$1.25,,Inactive\n");
        let rows = parse_item_csv(&text)?;
        assert_eq!(rows[0].cost, Some(1.25));
        assert_eq!(rows[0].msrp, None);
        assert_eq!(rows[0].status, Some(crate::ItemStatus::Inactive));
        assert!(rows[0].extras.is_empty());
        Ok(())
    }

    #[test]
    fn problem_messages_name_row_and_field() {
        let text = format!("{HEADER}\nA,,D,1,2\n");
        let error = parse_item_csv(&text).expect_err("sku missing");
        assert!(error.to_string().contains("row 1: sku is empty"));
    }

    #[test]
    fn empty_and_header_only_files_are_rejected() {
        assert!(matches!(parse_item_csv(""), Err(ImportError::Empty)));
        assert!(matches!(
            parse_item_csv(&format!("{HEADER}\n\n")),
            Err(ImportError::NoRows)
        ));
    }

    #[test]
    fn template_parses_as_a_header_row() {
        let template = template_csv();
        assert!(template.starts_with("item_name,barcode,sku,selling_price"));
        assert!(template.ends_with("description\n"));
    }

    #[test]
    fn failed_rows_do_not_stop_the_batch() -> Result<()> {
        let text = format!("{HEADER}\nA,S1,D,111,1\nB,S2,D,222,2\nC,S3,D,333,3\n");
        let rows = parse_item_csv(&text)?;
        let mut sink = FlakySink {
            calls: Vec::new(),
            fail_barcode: "222",
        };
        let mut seen = Vec::new();
        let report = import_rows(&mut sink, &rows, |progress: ImportProgress| {
            seen.push(progress.percent);
        });

        assert_eq!(sink.calls, vec!["111", "222", "333"]);
        assert_eq!(report.created_count(), 2);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].row, 2);
        assert!(matches!(
            &failures[0].result,
            RowResult::Failed(message) if message.contains("already exists")
        ));
        assert_eq!(seen, vec![0, 33, 66, 100]);
        Ok(())
    }
}
