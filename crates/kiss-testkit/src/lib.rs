// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use kiss_app::fields::{FieldSequencer, OrderableField};
use kiss_app::filters::FilterOption;
use kiss_app::{Category, CategoryId, FieldId, Item, ItemId, ItemStatus};
use std::path::PathBuf;

const CATEGORY_NAMES: [&str; 16] = [
    "Nails",
    "Lashes",
    "Lips",
    "Hair Care",
    "Skin Care",
    "Tools",
    "Accessories",
    "Fragrance",
    "Gel Polish",
    "Press-On",
    "Adhesives",
    "Brushes",
    "Wigs",
    "Extensions",
    "Cleansers",
    "Gift Sets",
];

const PRODUCT_ADJECTIVES: [&str; 12] = [
    "Glossy", "Matte", "Classic", "Salon", "Quick", "Ultra", "Soft", "Bold", "Natural", "Velvet",
    "Crystal", "Express",
];

const PRODUCT_NOUNS: [&str; 12] = [
    "Top Coat",
    "Lash Glue",
    "Nail File",
    "Lip Tint",
    "Brow Gel",
    "Cuticle Oil",
    "Base Coat",
    "Lash Strip",
    "Hair Clip",
    "Buffer Block",
    "Nail Tips",
    "Remover",
];

const BRANDS: [&str; 8] = [
    "Kiss", "Ivy", "Red", "Vluxe", "Falscara", "imPRESS", "Broadway", "Ruby Kisses",
];

const SUPPLIERS: [&str; 6] = [
    "Acme Beauty",
    "Globex Supply",
    "Northwind",
    "Lumen Trading",
    "Harbor Wholesale",
    "Summit Imports",
];

const FIELD_NAMES: [&str; 10] = [
    "Barcode",
    "SKU",
    "Description",
    "Selling Price",
    "Category",
    "Subcategory",
    "Sub-subcategory",
    "Company Code",
    "Brand",
    "Supplier",
];

/// One edit against a field chooser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    Toggle(FieldId),
    Remove(FieldId),
    SelectAll,
    Drag { source: FieldId, target: FieldId },
}

impl FieldOp {
    pub fn apply(self, sequencer: &mut FieldSequencer) {
        match self {
            Self::Toggle(id) => {
                sequencer.toggle_select(id);
            }
            Self::Remove(id) => {
                sequencer.remove(id);
            }
            Self::SelectAll => sequencer.select_all(),
            Self::Drag { source, target } => {
                sequencer.drag_start(source);
                sequencer.drag_over(target);
                sequencer.drop(target);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

#[derive(Debug, Clone)]
pub struct CatalogFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl CatalogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// An acyclic category forest with ids `1..=count`, in shuffled order.
    pub fn category_forest(&mut self, count: usize) -> Vec<Category> {
        let mut categories: Vec<Category> = (1..=count)
            .map(|index| {
                let parent_id = if index == 1 || self.rng.int_n(3) == 0 {
                    None
                } else {
                    Some(CategoryId::new(self.rng.int_n(index - 1) as i64 + 1))
                };
                Category {
                    id: CategoryId::new(index as i64),
                    name: format!("{} {index}", self.pick(&CATEGORY_NAMES)),
                    parent_id,
                    status: "Active".to_owned(),
                }
            })
            .collect();
        self.shuffle(&mut categories);
        categories
    }

    pub fn item(&mut self, id: i64) -> Item {
        let status = ItemStatus::ALL[self.rng.int_n(ItemStatus::ALL.len())];
        Item {
            id: ItemId::new(id),
            name: self.product_name(),
            barcode: self.barcode(),
            sku: format!("SKU-{id:05}"),
            unit_price: format!("{}.{:02}", self.int_range(1, 80), self.int_range(0, 99)),
            category: self.pick(&CATEGORY_NAMES).to_owned(),
            company: self.pick(&BRANDS).to_owned(),
            supplier: self.pick(&SUPPLIERS).to_owned(),
            status,
        }
    }

    pub fn items(&mut self, count: usize) -> Vec<Item> {
        (1..=count).map(|id| self.item(id as i64)).collect()
    }

    pub fn brand_options(&self) -> Vec<FilterOption> {
        BRANDS
            .iter()
            .enumerate()
            .map(|(index, name)| FilterOption::new(index as i64 + 1, name))
            .collect()
    }

    /// A well-formed import file with `rows` data rows. Some descriptions
    /// carry quoted commas.
    pub fn import_csv(&mut self, rows: usize) -> String {
        let mut text = String::from("item_name,sku,description,barcode,selling_price,brand\n");
        for row in 1..=rows {
            let description = if self.rng.bool() {
                format!("\"{}, {}\"", self.pick(&PRODUCT_ADJECTIVES), self.pick(&PRODUCT_NOUNS))
            } else {
                self.pick(&PRODUCT_NOUNS).to_owned()
            };
            text.push_str(&format!(
                "{},IMP-{row:04},{description},{},{}.{:02},{}\n",
                self.product_name(),
                self.barcode(),
                self.int_range(1, 60),
                self.int_range(0, 99),
                self.pick(&BRANDS),
            ));
        }
        text
    }

    /// Chooser fields with a random selection and scrambled relative orders.
    pub fn fields(&mut self, count: usize) -> Vec<OrderableField> {
        (0..count)
            .map(|index| {
                let selected = self.rng.bool();
                let order = if selected { self.int_range(1, 50) as u32 } else { 0 };
                OrderableField::new(
                    index as i64 + 1,
                    FIELD_NAMES[index % FIELD_NAMES.len()],
                    selected,
                    order,
                )
            })
            .collect()
    }

    /// Random chooser edits; ids may point past `field_count` to hit unknown fields.
    pub fn field_ops(&mut self, count: usize, field_count: usize) -> Vec<FieldOp> {
        let id_space = field_count + 2;
        (0..count)
            .map(|_| {
                let first = FieldId::new(self.rng.int_n(id_space) as i64 + 1);
                let second = FieldId::new(self.rng.int_n(id_space) as i64 + 1);
                match self.rng.int_n(7) {
                    0 | 1 => FieldOp::Toggle(first),
                    2 => FieldOp::Remove(first),
                    3 => FieldOp::SelectAll,
                    _ => FieldOp::Drag {
                        source: first,
                        target: second,
                    },
                }
            })
            .collect()
    }

    fn shuffle<T>(&mut self, values: &mut [T]) {
        for index in (1..values.len()).rev() {
            let other = self.rng.int_n(index + 1);
            values.swap(index, other);
        }
    }

    fn product_name(&mut self) -> String {
        format!(
            "{} {} {}",
            self.pick(&BRANDS),
            self.pick(&PRODUCT_ADJECTIVES),
            self.pick(&PRODUCT_NOUNS)
        )
    }

    fn barcode(&mut self) -> String {
        (0..12)
            .map(|_| char::from(b'0' + self.rng.int_n(10) as u8))
            .collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

/// Write `contents` to a file inside a fresh temp dir.
pub fn temp_file(name: &str, contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(name);
    std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}
