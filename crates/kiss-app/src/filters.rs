// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{FilterDimension, OptionId};

pub const DEFAULT_MIN_PRICE: f64 = 0.0;
pub const DEFAULT_MAX_PRICE: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: OptionId,
    pub name: String,
}

impl FilterOption {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id: OptionId::new(id),
            name: name.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn is_blank(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        for bound in [self.min, self.max].into_iter().flatten() {
            if !bound.is_finite() {
                bail!("price range bounds must be numbers");
            }
            if bound < 0.0 {
                bail!("price range bounds cannot be negative");
            }
        }
        // Blank bounds are compared with the defaults they are sent as.
        let PriceBounds {
            min_price,
            max_price,
        } = self.bounds();
        if min_price > max_price {
            bail!(
                "minimum price {min_price} is above maximum price {max_price} -- lower the minimum or raise the maximum and retry"
            );
        }
        Ok(())
    }

    /// Payload bounds; a blank min becomes 0 and a blank max becomes 1000.
    pub fn bounds(&self) -> PriceBounds {
        PriceBounds {
            min_price: self.min.unwrap_or(DEFAULT_MIN_PRICE),
            max_price: self.max.unwrap_or(DEFAULT_MAX_PRICE),
        }
    }

    /// Parse one bound as typed into the panel; blank input clears it.
    pub fn parse_bound(raw: &str) -> Result<Option<f64>> {
        let trimmed = raw.trim().trim_start_matches('$');
        if trimmed.is_empty() {
            return Ok(None);
        }
        let value: f64 = trimmed
            .parse()
            .with_context(|| format!("invalid price {raw:?}"))?;
        Ok(Some(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min_price: f64,
    pub max_price: f64,
}

/// Body sent to the item list endpoint. Empty dimensions are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceBounds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_type: Vec<OptionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_unit: Vec<OptionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<OptionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppliers: Vec<OptionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tax_codes: Vec<OptionId>,
}

impl FilterPayload {
    pub fn is_empty(&self) -> bool {
        self.active_dimensions().is_empty()
    }

    pub fn active_dimensions(&self) -> Vec<FilterDimension> {
        FilterDimension::ALL
            .into_iter()
            .filter(|dimension| match dimension {
                FilterDimension::Brands => !self.brands.is_empty(),
                FilterDimension::PriceRange => self.price_range.is_some(),
                other => self.ids(*other).is_some_and(|ids| !ids.is_empty()),
            })
            .collect()
    }

    fn ids(&self, dimension: FilterDimension) -> Option<&[OptionId]> {
        match dimension {
            FilterDimension::ItemType => Some(&self.item_type),
            FilterDimension::ItemUnit => Some(&self.item_unit),
            FilterDimension::Categories => Some(&self.categories),
            FilterDimension::Suppliers => Some(&self.suppliers),
            FilterDimension::TaxCodes => Some(&self.tax_codes),
            FilterDimension::Brands | FilterDimension::PriceRange => None,
        }
    }

    fn ids_mut(&mut self, dimension: FilterDimension) -> Option<&mut Vec<OptionId>> {
        match dimension {
            FilterDimension::ItemType => Some(&mut self.item_type),
            FilterDimension::ItemUnit => Some(&mut self.item_unit),
            FilterDimension::Categories => Some(&mut self.categories),
            FilterDimension::Suppliers => Some(&mut self.suppliers),
            FilterDimension::TaxCodes => Some(&mut self.tax_codes),
            FilterDimension::Brands | FilterDimension::PriceRange => None,
        }
    }
}

/// Candidate and applied selections for every filter dimension.
///
/// Candidates are edited live; `apply_filters` commits the active dimension
/// only, leaving every other applied selection untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterAggregator {
    active: FilterDimension,
    options: BTreeMap<FilterDimension, Vec<FilterOption>>,
    candidates: BTreeMap<FilterDimension, BTreeMap<OptionId, bool>>,
    applied: BTreeMap<FilterDimension, Vec<OptionId>>,
    price_candidate: PriceRange,
    applied_price: PriceRange,
}

impl Default for FilterAggregator {
    fn default() -> Self {
        Self {
            active: FilterDimension::Brands,
            options: BTreeMap::new(),
            candidates: BTreeMap::new(),
            applied: BTreeMap::new(),
            price_candidate: PriceRange::default(),
            applied_price: PriceRange::default(),
        }
    }
}

impl FilterAggregator {
    pub fn set_options(&mut self, dimension: FilterDimension, options: Vec<FilterOption>) {
        self.options.insert(dimension, options);
    }

    pub fn options(&self, dimension: FilterDimension) -> &[FilterOption] {
        self.options
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn active_dimension(&self) -> FilterDimension {
        self.active
    }

    pub fn select_dimension(&mut self, dimension: FilterDimension) {
        self.active = dimension;
    }

    /// Flip `id` in the active dimension's candidate map; returns the new state.
    pub fn toggle_candidate(&mut self, id: OptionId) -> bool {
        let entry = self
            .candidates
            .entry(self.active)
            .or_default()
            .entry(id)
            .or_insert(false);
        *entry = !*entry;
        *entry
    }

    pub fn set_candidate(&mut self, id: OptionId, selected: bool) {
        self.candidates
            .entry(self.active)
            .or_default()
            .insert(id, selected);
    }

    pub fn is_candidate(&self, dimension: FilterDimension, id: OptionId) -> bool {
        self.candidates
            .get(&dimension)
            .and_then(|map| map.get(&id))
            .copied()
            .unwrap_or(false)
    }

    pub fn set_price_min(&mut self, min: Option<f64>) {
        self.price_candidate.min = min;
    }

    pub fn set_price_max(&mut self, max: Option<f64>) {
        self.price_candidate.max = max;
    }

    pub fn price_candidate(&self) -> PriceRange {
        self.price_candidate
    }

    pub fn applied(&self, dimension: FilterDimension) -> &[OptionId] {
        self.applied
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn applied_price(&self) -> PriceRange {
        self.applied_price
    }

    /// Commit the active dimension's candidate selection.
    pub fn apply_filters(&mut self) -> Result<FilterDimension> {
        let dimension = self.active;
        if dimension == FilterDimension::PriceRange {
            self.price_candidate.validate()?;
            self.applied_price = self.price_candidate;
            return Ok(dimension);
        }

        let selected = self.materialize(dimension);
        if selected.is_empty() {
            self.applied.remove(&dimension);
        } else {
            self.applied.insert(dimension, selected);
        }
        Ok(dimension)
    }

    pub fn clear_dimension(&mut self, dimension: FilterDimension) {
        if dimension == FilterDimension::PriceRange {
            self.price_candidate = PriceRange::default();
            self.applied_price = PriceRange::default();
            return;
        }
        self.candidates.remove(&dimension);
        self.applied.remove(&dimension);
    }

    pub fn clear_all(&mut self) {
        for dimension in FilterDimension::ALL {
            self.clear_dimension(dimension);
        }
    }

    pub fn applied_count(&self) -> usize {
        self.format_filters_for_payload().active_dimensions().len()
    }

    pub fn format_filters_for_payload(&self) -> FilterPayload {
        let mut payload = FilterPayload::default();
        for dimension in FilterDimension::ALL {
            match dimension {
                FilterDimension::Brands => {
                    let options = self.options(dimension);
                    payload.brands = self
                        .applied(dimension)
                        .iter()
                        .filter_map(|id| {
                            let name = options
                                .iter()
                                .find(|option| option.id == *id)
                                .map(|option| option.name.clone());
                            if name.is_none() {
                                warn!(
                                    brand_id = %id,
                                    "applied brand is missing from the brand catalog"
                                );
                            }
                            name
                        })
                        .collect();
                }
                FilterDimension::PriceRange => {
                    if !self.applied_price.is_blank() {
                        payload.price_range = Some(self.applied_price.bounds());
                    }
                }
                other => {
                    if let Some(ids) = payload.ids_mut(other) {
                        *ids = self.applied(other).to_vec();
                    }
                }
            }
        }
        payload
    }

    /// Load a saved payload into both candidate and applied state.
    pub fn restore(&mut self, payload: &FilterPayload) {
        self.clear_all();

        let brand_ids: Vec<OptionId> = payload
            .brands
            .iter()
            .filter_map(|name| {
                let found = self
                    .options(FilterDimension::Brands)
                    .iter()
                    .find(|option| option.name == *name)
                    .map(|option| option.id);
                if found.is_none() {
                    warn!(brand = %name, "saved filter references an unknown brand");
                }
                found
            })
            .collect();
        self.restore_ids(FilterDimension::Brands, &brand_ids);

        for dimension in FilterDimension::ALL {
            if let Some(ids) = payload.ids(dimension) {
                self.restore_ids(dimension, ids);
            }
        }

        if let Some(bounds) = payload.price_range {
            let range = PriceRange {
                min: Some(bounds.min_price),
                max: Some(bounds.max_price),
            };
            self.price_candidate = range;
            self.applied_price = range;
        }
    }

    fn restore_ids(&mut self, dimension: FilterDimension, ids: &[OptionId]) {
        if ids.is_empty() {
            return;
        }
        let map = self.candidates.entry(dimension).or_default();
        for id in ids {
            map.insert(*id, true);
        }
        let selected = self.materialize(dimension);
        self.applied.insert(dimension, selected);
    }

    // Catalog order first, then ids the catalog does not know in id order.
    fn materialize(&self, dimension: FilterDimension) -> Vec<OptionId> {
        let options = self.options(dimension);
        let mut selected: Vec<OptionId> = self
            .candidates
            .get(&dimension)
            .map(|map| {
                map.iter()
                    .filter(|(_, selected)| **selected)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default();
        // Brands go out by name, so an id the catalog cannot name is dropped.
        if dimension == FilterDimension::Brands {
            selected.retain(|id| {
                let known = options.iter().any(|option| option.id == *id);
                if !known {
                    warn!(brand_id = %id, "ignoring brand missing from the brand catalog");
                }
                known
            });
        }
        selected.sort_by_key(|id| {
            let position = options
                .iter()
                .position(|option| option.id == *id)
                .unwrap_or(usize::MAX);
            (position, *id)
        });
        selected
    }
}
