// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Ordered field chooser shared by the export dialog and the label template form.

use serde::{Deserialize, Serialize};

use crate::FieldId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderableField {
    pub id: FieldId,
    pub name: String,
    pub selected: bool,
    /// 1-based position among selected fields; 0 while unselected.
    pub order: u32,
}

impl OrderableField {
    pub fn new(id: i64, name: &str, selected: bool, order: u32) -> Self {
        Self {
            id: FieldId::new(id),
            name: name.to_owned(),
            selected,
            order,
        }
    }
}

/// Fields offered by the export dialog.
pub fn export_fields() -> Vec<OrderableField> {
    vec![
        OrderableField::new(1, "Barcode", true, 1),
        OrderableField::new(2, "SKU", true, 2),
        OrderableField::new(3, "Description", true, 3),
        OrderableField::new(4, "Selling Price", true, 4),
        OrderableField::new(5, "Category", false, 0),
        OrderableField::new(6, "Subcategory", false, 0),
        OrderableField::new(7, "Sub-subcategory", false, 0),
        OrderableField::new(8, "Company Code", false, 0),
    ]
}

/// Fields a printed label can show.
pub fn label_fields() -> Vec<OrderableField> {
    let mut fields = export_fields();
    fields.retain(|field| field.name != "Company Code");
    fields
}

/// Keeps the selected fields in a strict `1..=N` order through every edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSequencer {
    fields: Vec<OrderableField>,
    dragging: Option<FieldId>,
    drag_target: Option<FieldId>,
    search: String,
}

impl FieldSequencer {
    /// Incoming orders only need to be relative; they are renumbered here.
    pub fn new(fields: Vec<OrderableField>) -> Self {
        let mut sequencer = Self {
            fields,
            ..Self::default()
        };
        sequencer.renumber();
        sequencer
    }

    pub fn fields(&self) -> &[OrderableField] {
        &self.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&OrderableField> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn selected_count(&self) -> usize {
        self.fields.iter().filter(|field| field.selected).count()
    }

    pub fn selected_fields(&self) -> Vec<&OrderableField> {
        let mut selected: Vec<&OrderableField> =
            self.fields.iter().filter(|field| field.selected).collect();
        selected.sort_by_key(|field| field.order);
        selected
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.selected_fields()
            .into_iter()
            .map(|field| field.name.clone())
            .collect()
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_owned();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Unselected fields matching the search string, in catalog order.
    pub fn available_fields(&self) -> Vec<&OrderableField> {
        let term = self.search.trim().to_lowercase();
        self.fields
            .iter()
            .filter(|field| !field.selected)
            .filter(|field| term.is_empty() || field.name.to_lowercase().contains(&term))
            .collect()
    }

    /// Flip selection of `id`. Returns whether the field ends up selected.
    pub fn toggle_select(&mut self, id: FieldId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if self.fields[index].selected {
            self.deselect(index);
            false
        } else {
            let next = self.max_order() + 1;
            let field = &mut self.fields[index];
            field.selected = true;
            field.order = next;
            true
        }
    }

    /// Deselect `id`. Returns false when it was not selected.
    pub fn remove(&mut self, id: FieldId) -> bool {
        match self.position(id) {
            Some(index) if self.fields[index].selected => {
                self.deselect(index);
                true
            }
            _ => false,
        }
    }

    pub fn select_all(&mut self) {
        let mut next = self.max_order();
        for field in self.fields.iter_mut().filter(|field| !field.selected) {
            next += 1;
            field.selected = true;
            field.order = next;
        }
    }

    pub fn drag_start(&mut self, id: FieldId) {
        if self.field(id).is_some_and(|field| field.selected) {
            self.dragging = Some(id);
            self.drag_target = None;
        }
    }

    pub fn drag_over(&mut self, id: FieldId) {
        if self.dragging.is_some() {
            self.drag_target = Some(id);
        }
    }

    pub fn dragging(&self) -> Option<FieldId> {
        self.dragging
    }

    pub fn drag_target(&self) -> Option<FieldId> {
        self.drag_target
    }

    /// Drop the dragged field onto `target`. Returns whether anything moved.
    pub fn drop(&mut self, target: FieldId) -> bool {
        let source = self.dragging.take();
        self.drag_target = None;
        source.is_some_and(|source| self.move_field(source, target))
    }

    pub fn drag_end(&mut self) {
        self.dragging = None;
        self.drag_target = None;
    }

    /// Move `source` into `target`'s slot, shifting the selected fields between them.
    pub fn move_field(&mut self, source: FieldId, target: FieldId) -> bool {
        if source == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.selected_order(source), self.selected_order(target))
        else {
            return false;
        };

        for field in self.fields.iter_mut().filter(|field| field.selected) {
            if field.id == source {
                field.order = to;
            } else if from < to && field.order > from && field.order <= to {
                field.order -= 1;
            } else if from > to && field.order >= to && field.order < from {
                field.order += 1;
            }
        }
        true
    }

    /// True when selected orders are exactly `1..=N` and unselected ones are 0.
    pub fn is_well_ordered(&self) -> bool {
        let mut orders: Vec<u32> = self
            .fields
            .iter()
            .filter(|field| field.selected)
            .map(|field| field.order)
            .collect();
        orders.sort_unstable();
        let contiguous = orders
            .iter()
            .enumerate()
            .all(|(index, order)| usize::try_from(*order).is_ok_and(|order| order == index + 1));
        contiguous
            && self
                .fields
                .iter()
                .filter(|field| !field.selected)
                .all(|field| field.order == 0)
    }

    fn position(&self, id: FieldId) -> Option<usize> {
        self.fields.iter().position(|field| field.id == id)
    }

    fn selected_order(&self, id: FieldId) -> Option<u32> {
        self.field(id)
            .filter(|field| field.selected)
            .map(|field| field.order)
    }

    fn max_order(&self) -> u32 {
        self.fields
            .iter()
            .filter(|field| field.selected)
            .map(|field| field.order)
            .max()
            .unwrap_or(0)
    }

    fn deselect(&mut self, index: usize) {
        let removed = self.fields[index].order;
        self.fields[index].selected = false;
        self.fields[index].order = 0;
        for field in self.fields.iter_mut().filter(|field| field.selected) {
            if field.order > removed {
                field.order -= 1;
            }
        }
        if self.dragging == Some(self.fields[index].id) {
            self.drag_end();
        }
    }

    fn renumber(&mut self) {
        let mut selected: Vec<usize> = (0..self.fields.len())
            .filter(|index| self.fields[*index].selected)
            .collect();
        selected.sort_by_key(|index| (self.fields[*index].order, *index));
        for (position, index) in selected.into_iter().enumerate() {
            self.fields[index].order = u32::try_from(position + 1).unwrap_or(u32::MAX);
        }
        for field in self.fields.iter_mut().filter(|field| !field.selected) {
            field.order = 0;
        }
    }
}
