// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::filters::{FilterAggregator, FilterPayload};
use crate::{FilterDimension, Item, ItemId, ItemStatus, ItemStatusUpdate, ItemTab, OptionId};

/// Item list screen state.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemListState {
    pub items: Vec<Item>,
    pub active_tab: ItemTab,
    pub search_query: String,
    pub show_filters: bool,
    pub filters: FilterAggregator,
    pub selected: BTreeSet<ItemId>,
    pub is_loading: bool,
    pub status_line: Option<String>,
}

impl Default for ItemListState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            active_tab: ItemTab::All,
            search_query: String::new(),
            show_filters: false,
            filters: FilterAggregator::default(),
            selected: BTreeSet::new(),
            is_loading: false,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemListCommand {
    SwitchTab(ItemTab),
    ToggleFilterPanel,
    SelectDimension(FilterDimension),
    ToggleCandidate(OptionId),
    SetPriceMin(Option<f64>),
    SetPriceMax(Option<f64>),
    ApplyFilters,
    ClearFilters,
    SetSearch(String),
    BeginLoading,
    ItemsLoaded(Vec<Item>),
    LoadFailed(String),
    ToggleItem(ItemId),
    ToggleAllVisible,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemListEvent {
    TabChanged(ItemTab),
    FilterPanelChanged(bool),
    DimensionSelected(FilterDimension),
    CandidateToggled { id: OptionId, selected: bool },
    /// The list should be reloaded with this payload.
    FiltersApplied(FilterPayload),
    FiltersCleared,
    SearchChanged(String),
    LoadingStarted,
    LoadRejected,
    ItemsReplaced(usize),
    SelectionChanged(usize),
    StatusUpdated(String),
    StatusCleared,
}

impl ItemListState {
    pub fn dispatch(&mut self, command: ItemListCommand) -> Vec<ItemListEvent> {
        match command {
            ItemListCommand::SwitchTab(tab) => {
                self.active_tab = tab;
                vec![ItemListEvent::TabChanged(tab)]
            }
            ItemListCommand::ToggleFilterPanel => {
                self.show_filters = !self.show_filters;
                vec![ItemListEvent::FilterPanelChanged(self.show_filters)]
            }
            ItemListCommand::SelectDimension(dimension) => {
                self.filters.select_dimension(dimension);
                vec![ItemListEvent::DimensionSelected(dimension)]
            }
            ItemListCommand::ToggleCandidate(id) => {
                let selected = self.filters.toggle_candidate(id);
                vec![ItemListEvent::CandidateToggled { id, selected }]
            }
            ItemListCommand::SetPriceMin(min) => {
                self.filters.set_price_min(min);
                Vec::new()
            }
            ItemListCommand::SetPriceMax(max) => {
                self.filters.set_price_max(max);
                Vec::new()
            }
            ItemListCommand::ApplyFilters => match self.filters.apply_filters() {
                Ok(dimension) => {
                    self.show_filters = false;
                    let label = format!("{} filter applied", dimension.label());
                    vec![
                        ItemListEvent::FilterPanelChanged(false),
                        ItemListEvent::FiltersApplied(self.filters.format_filters_for_payload()),
                        self.set_status(&label),
                    ]
                }
                Err(err) => vec![self.set_status(&format!("{err:#}"))],
            },
            ItemListCommand::ClearFilters => {
                self.filters.clear_all();
                vec![
                    ItemListEvent::FiltersCleared,
                    ItemListEvent::FiltersApplied(FilterPayload::default()),
                ]
            }
            ItemListCommand::SetSearch(query) => {
                self.search_query = query.clone();
                vec![ItemListEvent::SearchChanged(query)]
            }
            ItemListCommand::BeginLoading => {
                if self.is_loading {
                    return vec![ItemListEvent::LoadRejected];
                }
                self.is_loading = true;
                vec![ItemListEvent::LoadingStarted]
            }
            ItemListCommand::ItemsLoaded(items) => {
                self.is_loading = false;
                self.items = items;
                let known: BTreeSet<ItemId> = self.items.iter().map(|item| item.id).collect();
                self.selected.retain(|id| known.contains(id));
                vec![ItemListEvent::ItemsReplaced(self.items.len())]
            }
            ItemListCommand::LoadFailed(message) => {
                self.is_loading = false;
                vec![self.set_status(&message)]
            }
            ItemListCommand::ToggleItem(id) => {
                if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
                vec![ItemListEvent::SelectionChanged(self.selected.len())]
            }
            ItemListCommand::ToggleAllVisible => {
                let visible: Vec<ItemId> =
                    self.visible_items().iter().map(|item| item.id).collect();
                if visible.iter().all(|id| self.selected.contains(id)) {
                    for id in &visible {
                        self.selected.remove(id);
                    }
                } else {
                    self.selected.extend(visible);
                }
                vec![ItemListEvent::SelectionChanged(self.selected.len())]
            }
            ItemListCommand::ClearStatus => {
                self.status_line = None;
                vec![ItemListEvent::StatusCleared]
            }
        }
    }

    /// Items on the active tab that match the search query.
    pub fn visible_items(&self) -> Vec<&Item> {
        let query = self.search_query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| match self.active_tab {
                ItemTab::All => true,
                ItemTab::NotConfirmed => item.status == ItemStatus::NotConfirmed,
            })
            .filter(|item| {
                query.is_empty()
                    || [&item.name, &item.barcode, &item.sku]
                        .iter()
                        .any(|text| text.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn not_confirmed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::NotConfirmed)
            .count()
    }

    pub fn has_not_confirmed_items(&self) -> bool {
        self.not_confirmed_count() > 0
    }

    /// Status changes for every selected item, in list order.
    pub fn status_updates(&self, status: ItemStatus) -> Vec<ItemStatusUpdate> {
        self.items
            .iter()
            .filter(|item| self.selected.contains(&item.id))
            .map(|item| ItemStatusUpdate {
                item_id: item.id,
                item_status: status,
            })
            .collect()
    }

    fn set_status(&mut self, message: &str) -> ItemListEvent {
        self.status_line = Some(message.to_owned());
        ItemListEvent::StatusUpdated(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemListCommand, ItemListEvent, ItemListState};
    use crate::filters::{FilterOption, FilterPayload};
    use crate::{FilterDimension, Item, ItemId, ItemStatus, ItemTab, OptionId};

    fn item(id: i64, name: &str, status: ItemStatus) -> Item {
        Item {
            id: ItemId::new(id),
            name: name.to_owned(),
            barcode: format!("BC{id}"),
            sku: format!("SKU-{id}"),
            unit_price: "1.00".to_owned(),
            category: String::new(),
            company: String::new(),
            supplier: String::new(),
            status,
        }
    }

    fn loaded() -> ItemListState {
        let mut state = ItemListState::default();
        state.dispatch(ItemListCommand::ItemsLoaded(vec![
            item(1, "Gel Polish", ItemStatus::Active),
            item(2, "Lash Glue", ItemStatus::NotConfirmed),
            item(3, "Nail File", ItemStatus::NotConfirmed),
        ]));
        state
    }

    #[test]
    fn not_confirmed_tab_filters_items() {
        let mut state = loaded();
        assert!(state.has_not_confirmed_items());

        let events = state.dispatch(ItemListCommand::SwitchTab(ItemTab::NotConfirmed));
        assert_eq!(events, vec![ItemListEvent::TabChanged(ItemTab::NotConfirmed)]);
        let ids: Vec<i64> = state.visible_items().iter().map(|item| item.id.get()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn search_matches_name_barcode_or_sku() {
        let mut state = loaded();
        state.dispatch(ItemListCommand::SetSearch("nail".to_owned()));
        assert_eq!(state.visible_items().len(), 1);
        state.dispatch(ItemListCommand::SetSearch("bc2".to_owned()));
        assert_eq!(state.visible_items()[0].id, ItemId::new(2));
    }

    #[test]
    fn second_load_is_rejected_while_one_is_in_flight() {
        let mut state = ItemListState::default();
        assert_eq!(
            state.dispatch(ItemListCommand::BeginLoading),
            vec![ItemListEvent::LoadingStarted]
        );
        assert_eq!(
            state.dispatch(ItemListCommand::BeginLoading),
            vec![ItemListEvent::LoadRejected]
        );

        state.dispatch(ItemListCommand::LoadFailed("server unreachable".to_owned()));
        assert!(!state.is_loading);
        assert_eq!(state.status_line.as_deref(), Some("server unreachable"));
        assert_eq!(
            state.dispatch(ItemListCommand::BeginLoading),
            vec![ItemListEvent::LoadingStarted]
        );
    }

    #[test]
    fn apply_closes_panel_and_emits_payload() {
        let mut state = ItemListState::default();
        state.filters.set_options(
            FilterDimension::Brands,
            vec![FilterOption::new(1, "Kiss"), FilterOption::new(2, "Ivy")],
        );
        state.dispatch(ItemListCommand::ToggleFilterPanel);
        state.dispatch(ItemListCommand::SelectDimension(FilterDimension::Brands));
        let toggled = state.dispatch(ItemListCommand::ToggleCandidate(OptionId::new(2)));
        assert_eq!(
            toggled,
            vec![ItemListEvent::CandidateToggled {
                id: OptionId::new(2),
                selected: true,
            }]
        );

        let events = state.dispatch(ItemListCommand::ApplyFilters);
        assert!(!state.show_filters);
        let expected = FilterPayload {
            brands: vec!["Ivy".to_owned()],
            ..FilterPayload::default()
        };
        assert_eq!(events[1], ItemListEvent::FiltersApplied(expected));
        assert_eq!(state.status_line.as_deref(), Some("Brands filter applied"));
    }

    #[test]
    fn invalid_price_range_keeps_panel_open() {
        let mut state = ItemListState::default();
        state.dispatch(ItemListCommand::ToggleFilterPanel);
        state.dispatch(ItemListCommand::SelectDimension(FilterDimension::PriceRange));
        state.dispatch(ItemListCommand::SetPriceMin(Some(9.0)));
        state.dispatch(ItemListCommand::SetPriceMax(Some(1.0)));

        let events = state.dispatch(ItemListCommand::ApplyFilters);
        assert!(state.show_filters);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ItemListEvent::StatusUpdated(message) if message.contains("above maximum")
        ));
    }

    #[test]
    fn toggle_all_visible_then_build_status_updates() {
        let mut state = loaded();
        state.dispatch(ItemListCommand::SwitchTab(ItemTab::NotConfirmed));
        assert_eq!(
            state.dispatch(ItemListCommand::ToggleAllVisible),
            vec![ItemListEvent::SelectionChanged(2)]
        );

        let updates = state.status_updates(ItemStatus::Active);
        let ids: Vec<i64> = updates.iter().map(|update| update.item_id.get()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(updates.iter().all(|update| update.item_status == ItemStatus::Active));

        assert_eq!(
            state.dispatch(ItemListCommand::ToggleAllVisible),
            vec![ItemListEvent::SelectionChanged(0)]
        );
    }

    #[test]
    fn reload_drops_selection_of_missing_items() {
        let mut state = loaded();
        state.dispatch(ItemListCommand::ToggleItem(ItemId::new(3)));
        state.dispatch(ItemListCommand::ItemsLoaded(vec![item(
            1,
            "Gel Polish",
            ItemStatus::Active,
        )]));
        assert!(state.selected.is_empty());
    }
}
