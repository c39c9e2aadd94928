// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::Serialize;

use crate::fields::FieldSequencer;
use crate::import::ImportRow;
use crate::{CategoryId, FormKind, ItemId, ItemStatus, LabelTemplateField};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFormInput {
    pub item_name: String,
    pub barcode: String,
    pub sku: String,
    pub selling_price: Option<f64>,
    pub cost: Option<f64>,
    pub msrp: Option<f64>,
    pub status: ItemStatus,
    pub company: String,
    pub parent_company: String,
    pub brand: String,
    pub description: String,
}

impl ItemFormInput {
    /// Form values for one imported row; a blank status uses the default.
    pub fn from_import_row(row: &ImportRow) -> Self {
        let extra = |key: &str| row.extras.get(key).cloned().unwrap_or_default();
        Self {
            item_name: row.item_name.clone(),
            barcode: row.barcode.clone(),
            sku: row.sku.clone(),
            selling_price: Some(row.selling_price),
            cost: row.cost,
            msrp: row.msrp,
            status: row.status.unwrap_or_default(),
            company: extra("company"),
            parent_company: String::new(),
            brand: extra("brand"),
            description: row.description.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.item_name.trim().is_empty() {
            bail!("item name is required -- enter a name and retry");
        }
        if self.barcode.trim().is_empty() {
            bail!("item barcode is required -- scan or type a barcode and retry");
        }
        for (label, price) in [
            ("selling price", self.selling_price),
            ("cost", self.cost),
            ("msrp", self.msrp),
        ] {
            if let Some(price) = price
                && (!price.is_finite() || price < 0.0)
            {
                bail!("item {label} cannot be negative");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFormInput {
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub status: String,
    pub item_ids: Vec<ItemId>,
    /// Set when editing an existing category.
    pub category_id: Option<CategoryId>,
}

impl CategoryFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("category name is required -- enter a name and retry");
        }
        if let (Some(parent_id), Some(category_id)) = (self.parent_id, self.category_id)
            && parent_id == category_id
        {
            bail!("a category cannot be its own parent -- choose another parent");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxFormInput {
    pub name: String,
    pub amount: f64,
    pub amount_type: String,
    pub type_tax_use: String,
    pub active: bool,
    pub description: String,
}

impl TaxFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("tax name is required -- enter a name and retry");
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            bail!("tax amount cannot be negative");
        }
        if self.amount_type == "percent" && self.amount > 100.0 {
            bail!("tax rate must be between 0 and 100 percent");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTemplateFormInput {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub price: f64,
    pub is_default: bool,
    pub fields: Vec<LabelTemplateField>,
}

impl LabelTemplateFormInput {
    /// Template fields taken from the chooser, `sequence` following the selected order.
    pub fn from_sequencer(name: &str, width: f64, height: f64, sequencer: &FieldSequencer) -> Self {
        let fields = sequencer
            .selected_fields()
            .into_iter()
            .map(|field| LabelTemplateField {
                field_name: field.name.clone(),
                sequence: field.order,
                is_visible: true,
            })
            .collect();
        Self {
            name: name.to_owned(),
            width,
            height,
            price: 0.0,
            is_default: false,
            fields,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("template name is required -- enter a name and retry");
        }
        if !(self.width.is_finite()
            && self.width > 0.0
            && self.height.is_finite()
            && self.height > 0.0)
        {
            bail!("label width and height must be positive");
        }
        if self.price < 0.0 {
            bail!("template price cannot be negative");
        }
        if self.fields.is_empty() {
            bail!("template needs at least one field -- select a field and retry");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormPayload {
    Item(ItemFormInput),
    Category(CategoryFormInput),
    Tax(TaxFormInput),
    LabelTemplate(LabelTemplateFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Item(_) => FormKind::Item,
            Self::Category(_) => FormKind::Category,
            Self::Tax(_) => FormKind::Tax,
            Self::LabelTemplate(_) => FormKind::LabelTemplate,
        }
    }

    pub fn blank_for(kind: FormKind) -> Self {
        match kind {
            FormKind::Item => Self::Item(ItemFormInput {
                item_name: String::new(),
                barcode: String::new(),
                sku: String::new(),
                selling_price: None,
                cost: None,
                msrp: None,
                status: ItemStatus::NotConfirmed,
                company: String::new(),
                parent_company: String::new(),
                brand: String::new(),
                description: String::new(),
            }),
            FormKind::Category => Self::Category(CategoryFormInput {
                name: String::new(),
                parent_id: None,
                status: "Active".to_owned(),
                item_ids: Vec::new(),
                category_id: None,
            }),
            FormKind::Tax => Self::Tax(TaxFormInput {
                name: String::new(),
                amount: 0.0,
                amount_type: "percent".to_owned(),
                type_tax_use: "sale".to_owned(),
                active: true,
                description: String::new(),
            }),
            FormKind::LabelTemplate => Self::LabelTemplate(LabelTemplateFormInput {
                name: String::new(),
                width: 2.0,
                height: 1.0,
                price: 0.0,
                is_default: false,
                fields: Vec::new(),
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Item(item) => item.validate(),
            Self::Category(category) => category.validate(),
            Self::Tax(tax) => tax.validate(),
            Self::LabelTemplate(template) => template.validate(),
        }
    }
}
