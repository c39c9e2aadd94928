// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    #[serde(rename = "Not Confirmed")]
    NotConfirmed,
    Active,
    Inactive,
    Discontinued,
}

impl ItemStatus {
    pub const ALL: [Self; 4] = [
        Self::NotConfirmed,
        Self::Active,
        Self::Inactive,
        Self::Discontinued,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotConfirmed => "Not Confirmed",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Discontinued => "Discontinued",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Not Confirmed" => Some(Self::NotConfirmed),
            "Active" => Some(Self::Active),
            "Inactive" => Some(Self::Inactive),
            "Discontinued" => Some(Self::Discontinued),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemTab {
    All,
    NotConfirmed,
}

impl ItemTab {
    pub const ALL: [Self; 2] = [Self::All, Self::NotConfirmed];

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NotConfirmed => "not_confirmed",
        }
    }
}

/// Dimensions offered by the item list filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterDimension {
    Brands,
    PriceRange,
    ItemType,
    ItemUnit,
    Categories,
    Suppliers,
    TaxCodes,
}

impl FilterDimension {
    pub const ALL: [Self; 7] = [
        Self::Brands,
        Self::PriceRange,
        Self::ItemType,
        Self::ItemUnit,
        Self::Categories,
        Self::Suppliers,
        Self::TaxCodes,
    ];

    /// Key used for this dimension in the filter payload.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brands => "brands",
            Self::PriceRange => "price_range",
            Self::ItemType => "item_type",
            Self::ItemUnit => "item_unit",
            Self::Categories => "categories",
            Self::Suppliers => "suppliers",
            Self::TaxCodes => "tax_codes",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == value)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Brands => "Brands",
            Self::PriceRange => "Price Range",
            Self::ItemType => "Item Type",
            Self::ItemUnit => "Item Unit",
            Self::Categories => "Item Category",
            Self::Suppliers => "Supplier",
            Self::TaxCodes => "Tax Code",
        }
    }

    pub const fn is_set_valued(self) -> bool {
        !matches!(self, Self::PriceRange)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Item,
    Category,
    Tax,
    LabelTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default = "default_category_status")]
    pub status: String,
}

fn default_category_status() -> String {
    "Active".to_owned()
}

/// A category placed in the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub category: Category,
    pub level: usize,
    pub children: Vec<CategoryId>,
}

impl CategoryNode {
    pub fn id(&self) -> CategoryId {
        self.category.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub unit_price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ItemId,
    #[serde(default)]
    pub item_name: String,
    #[serde(default, deserialize_with = "odoo_text")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "odoo_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "odoo_text")]
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatusUpdate {
    pub item_id: ItemId,
    pub item_status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: SavedFilterId,
    pub name: String,
    #[serde(default)]
    pub filter_parameters: serde_json::Value,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, deserialize_with = "odoo_text")]
    pub created_date: Option<String>,
    #[serde(default, deserialize_with = "odoo_text")]
    pub modified_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTemplateField {
    pub field_name: String,
    pub sequence: u32,
    #[serde(default = "default_true")]
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTemplate {
    pub id: LabelTemplateId,
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub fields: Vec<LabelTemplateField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    pub id: TaxId,
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, deserialize_with = "odoo_text")]
    pub type_tax_use: Option<String>,
    #[serde(default, deserialize_with = "odoo_text")]
    pub amount_type: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, deserialize_with = "odoo_text")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "odoo_text")]
    pub company_name: Option<String>,
    #[serde(default)]
    pub status: String,
}

fn default_true() -> bool {
    true
}

// The ORM renders unset char fields as `false` rather than null.
fn odoo_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) if !text.is_empty() => Some(text),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}
