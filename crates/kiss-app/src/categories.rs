// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Category hierarchy flattening and the tree view built on top of it.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::warn;

use crate::{Category, CategoryId, CategoryNode};

/// Horizontal indent per tree level, in pixels.
pub const INDENT_PX: usize = 20;

/// Flatten an unordered category list into pre-order tree rows.
///
/// Roots (no parent, or a parent missing from the input) keep their input
/// order, as do siblings under a common parent. Records that are only
/// reachable through a parent cycle are promoted to roots, first in input
/// order first, so the walk always terminates.
pub fn flatten(categories: &[Category]) -> Vec<CategoryNode> {
    let mut records: Vec<&Category> = Vec::with_capacity(categories.len());
    let mut index_of: HashMap<CategoryId, usize> = HashMap::with_capacity(categories.len());
    for category in categories {
        if index_of.contains_key(&category.id) {
            warn!(category_id = %category.id, "dropping duplicate category record");
            continue;
        }
        index_of.insert(category.id, records.len());
        records.push(category);
    }

    let mut child_lists: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut roots = Vec::new();
    for (index, category) in records.iter().enumerate() {
        match category
            .parent_id
            .and_then(|parent_id| index_of.get(&parent_id).copied())
        {
            Some(parent) if parent != index => child_lists[parent].push(index),
            _ => roots.push(index),
        }
    }

    let mut visited = vec![false; records.len()];
    let mut order: Vec<(usize, usize)> = Vec::with_capacity(records.len());
    for root in roots {
        walk(root, &child_lists, &mut visited, &mut order);
    }

    // Whatever is left hangs off a parent cycle.
    for index in 0..records.len() {
        if !visited[index] {
            warn!(
                category_id = %records[index].id,
                parent_id = ?records[index].parent_id,
                "category parent chain loops; treating it as a root"
            );
            walk(index, &child_lists, &mut visited, &mut order);
        }
    }

    let mut placed_children: Vec<Vec<CategoryId>> = vec![Vec::new(); records.len()];
    let mut level_of = vec![0_usize; records.len()];
    let mut stack: Vec<usize> = Vec::new();
    for &(index, level) in &order {
        stack.truncate(level);
        if let Some(&parent) = stack.last() {
            placed_children[parent].push(records[index].id);
        }
        level_of[index] = level;
        stack.push(index);
    }

    order
        .into_iter()
        .map(|(index, _)| CategoryNode {
            category: records[index].clone(),
            level: level_of[index],
            children: std::mem::take(&mut placed_children[index]),
        })
        .collect()
}

fn walk(
    root: usize,
    child_lists: &[Vec<usize>],
    visited: &mut [bool],
    order: &mut Vec<(usize, usize)>,
) {
    let mut stack = vec![(root, 0_usize)];
    while let Some((index, level)) = stack.pop() {
        if visited[index] {
            continue;
        }
        visited[index] = true;
        order.push((index, level));
        for &child in child_lists[index].iter().rev() {
            if !visited[child] {
                stack.push((child, level + 1));
            }
        }
    }
}

/// Rows whose name contains `term`, ignoring case. A blank term keeps all rows.
pub fn search<'a>(nodes: &'a [CategoryNode], term: &str) -> Vec<&'a CategoryNode> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return nodes.iter().collect();
    }
    nodes
        .iter()
        .filter(|node| node.category.name.to_lowercase().contains(&term))
        .collect()
}

pub const fn indentation(level: usize) -> usize {
    level * INDENT_PX
}

/// Flattened categories plus the per-row expand/collapse state of the list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTree {
    nodes: Vec<CategoryNode>,
    expanded: BTreeSet<CategoryId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow<'a> {
    pub node: &'a CategoryNode,
    pub indent_px: usize,
    pub has_children: bool,
    pub expanded: bool,
}

impl CategoryTree {
    pub fn new(categories: &[Category]) -> Self {
        Self {
            nodes: flatten(categories),
            expanded: BTreeSet::new(),
        }
    }

    pub fn nodes(&self) -> &[CategoryNode] {
        &self.nodes
    }

    pub fn toggle_expand(&mut self, id: CategoryId) -> bool {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
        self.is_expanded(id)
    }

    pub fn is_expanded(&self, id: CategoryId) -> bool {
        self.expanded.contains(&id)
    }

    pub fn expand_all(&mut self) {
        self.expanded = self
            .nodes
            .iter()
            .filter(|node| !node.children.is_empty())
            .map(CategoryNode::id)
            .collect();
    }

    /// Rows to render: roots, plus descendants whose ancestors are all expanded.
    pub fn visible_rows(&self) -> Vec<CategoryRow<'_>> {
        let mut rows = Vec::new();
        let mut hidden_below: Option<usize> = None;
        for node in &self.nodes {
            if let Some(level) = hidden_below {
                if node.level > level {
                    continue;
                }
                hidden_below = None;
            }
            let expanded = self.is_expanded(node.id());
            if !expanded {
                hidden_below = Some(node.level);
            }
            rows.push(CategoryRow {
                node,
                indent_px: indentation(node.level),
                has_children: !node.children.is_empty(),
                expanded,
            });
        }
        rows
    }

    /// Ids of `id` and every category below it.
    pub fn subtree_ids(&self, id: CategoryId) -> Vec<CategoryId> {
        let Some(start) = self.nodes.iter().position(|node| node.id() == id) else {
            return Vec::new();
        };
        let level = self.nodes[start].level;
        let mut ids = vec![id];
        ids.extend(
            self.nodes[start + 1..]
                .iter()
                .take_while(|node| node.level > level)
                .map(CategoryNode::id),
        );
        ids
    }
}

/// Ids referenced as a parent that are missing from the input.
pub fn dangling_parents(categories: &[Category]) -> Vec<CategoryId> {
    let known: HashSet<CategoryId> = categories.iter().map(|category| category.id).collect();
    let mut missing: Vec<CategoryId> = categories
        .iter()
        .filter_map(|category| category.parent_id)
        .filter(|parent_id| !known.contains(parent_id))
        .collect();
    missing.sort();
    missing.dedup();
    missing
}

#[cfg(test)]
mod tests {
    use super::{CategoryTree, dangling_parents, flatten, indentation, search};
    use crate::{Category, CategoryId};

    fn category(id: i64, name: &str, parent: Option<i64>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            parent_id: parent.map(CategoryId::new),
            status: "Active".to_owned(),
        }
    }

    fn ids_and_levels(categories: &[Category]) -> Vec<(i64, usize)> {
        flatten(categories)
            .iter()
            .map(|node| (node.id().get(), node.level))
            .collect()
    }

    #[test]
    fn parent_then_child() {
        let input = vec![category(1, "A", None), category(2, "B", Some(1))];
        assert_eq!(ids_and_levels(&input), vec![(1, 0), (2, 1)]);

        let nodes = flatten(&input);
        assert_eq!(nodes[0].children, vec![CategoryId::new(2)]);
        assert!(nodes[1].children.is_empty());
    }

    #[test]
    fn child_listed_before_parent_still_follows_it() {
        let input = vec![
            category(3, "Lipstick", Some(2)),
            category(1, "Cosmetics", None),
            category(2, "Lips", Some(1)),
            category(4, "Hair", None),
            category(5, "Gloss", Some(2)),
        ];
        assert_eq!(
            ids_and_levels(&input),
            vec![(1, 0), (2, 1), (3, 2), (5, 2), (4, 0)]
        );
    }

    #[test]
    fn orphan_becomes_root_in_input_position() {
        let input = vec![
            category(1, "A", None),
            category(2, "Orphan", Some(99)),
            category(3, "C", Some(1)),
        ];
        assert_eq!(ids_and_levels(&input), vec![(1, 0), (3, 1), (2, 0)]);
        assert_eq!(dangling_parents(&input), vec![CategoryId::new(99)]);
    }

    #[test]
    fn two_node_cycle_terminates_with_first_member_as_root() {
        let input = vec![
            category(1, "Root", None),
            category(2, "X", Some(3)),
            category(3, "Y", Some(2)),
            category(4, "Z", Some(3)),
        ];
        assert_eq!(ids_and_levels(&input), vec![(1, 0), (2, 0), (3, 1), (4, 2)]);
    }

    #[test]
    fn self_parent_is_a_root() {
        let input = vec![category(7, "Self", Some(7))];
        assert_eq!(ids_and_levels(&input), vec![(7, 0)]);
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let input = vec![category(1, "First", None), category(1, "Second", None)];
        let nodes = flatten(&input);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].category.name, "First");
    }

    #[test]
    fn search_ignores_case_and_blank_terms() {
        let nodes = flatten(&[
            category(1, "Nail Polish", None),
            category(2, "Lipstick", None),
        ]);
        assert_eq!(search(&nodes, "  ").len(), 2);
        let hits = search(&nodes, "POLISH");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), CategoryId::new(1));
    }

    #[test]
    fn collapsed_parents_hide_descendants() {
        let mut tree = CategoryTree::new(&[
            category(1, "A", None),
            category(2, "B", Some(1)),
            category(3, "C", Some(2)),
            category(4, "D", None),
        ]);
        let visible: Vec<i64> = tree
            .visible_rows()
            .iter()
            .map(|row| row.node.id().get())
            .collect();
        assert_eq!(visible, vec![1, 4]);

        assert!(tree.toggle_expand(CategoryId::new(1)));
        let rows = tree.visible_rows();
        let visible: Vec<i64> = rows.iter().map(|row| row.node.id().get()).collect();
        assert_eq!(visible, vec![1, 2, 4]);
        assert_eq!(rows[1].indent_px, indentation(1));
        assert!(rows[1].has_children);

        tree.expand_all();
        assert_eq!(tree.visible_rows().len(), 4);

        assert!(!tree.toggle_expand(CategoryId::new(1)));
        assert_eq!(tree.visible_rows().len(), 2);
    }

    #[test]
    fn subtree_ids_cover_all_descendants() {
        let tree = CategoryTree::new(&[
            category(1, "A", None),
            category(2, "B", Some(1)),
            category(3, "C", Some(2)),
            category(4, "D", None),
        ]);
        let ids: Vec<i64> = tree
            .subtree_ids(CategoryId::new(1))
            .into_iter()
            .map(CategoryId::get)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(tree.subtree_ids(CategoryId::new(42)).is_empty());
    }
}
