// src/records/search.rs
//! Full-text filtering over displayed columns and the selection set bound to
//! the filtered view.

use std::collections::HashSet;

use super::definitions::{ColumnList, ModuleDataset, Row, RowId};

/// Rows where any displayed column's text contains `query`, ignoring case.
/// A blank query keeps every row. Order is preserved.
pub fn filter<'a>(rows: &'a [Row], columns: &ColumnList, query: &str) -> Vec<&'a Row> {
    if query.trim().is_empty() {
        return rows.iter().collect();
    }
    let needle = query.to_lowercase();
    rows.iter()
        .filter(|row| row_matches(row, columns, &needle))
        .collect()
}

fn row_matches(row: &Row, columns: &ColumnList, needle: &str) -> bool {
    columns.iter().any(|column| {
        row.get(column)
            .and_then(|value| value.display_text())
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

/// Identities currently ticked in the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(HashSet<RowId>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.0.contains(id)
    }

    pub fn ids(&self) -> &HashSet<RowId> {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Flips membership of `id`.
    pub fn toggle(&mut self, id: &RowId) {
        if !self.0.remove(id) {
            self.0.insert(id.clone());
        }
    }

    /// True when every visible row is selected and there is at least one.
    pub fn covers(&self, visible: &[RowId]) -> bool {
        !visible.is_empty() && self.0.len() == visible.len() && visible.iter().all(|id| self.0.contains(id))
    }

    /// Selects exactly the visible rows, or clears when they already are.
    pub fn select_all(&mut self, visible: &[RowId]) {
        if self.covers(visible) {
            self.0.clear();
        } else {
            self.0 = visible.iter().cloned().collect();
        }
    }

    /// Drops ids that are not visible any more.
    pub fn retain_visible(&mut self, visible: &[RowId]) {
        let visible: HashSet<&RowId> = visible.iter().collect();
        self.0.retain(|id| visible.contains(&id));
    }
}

/// Query, filtered ids and selection for one module as shown to a user.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    query: String,
    visible: Vec<RowId>,
    selection: Selection,
}

impl SearchView {
    pub fn new(dataset: &ModuleDataset) -> Self {
        let mut view = Self::default();
        view.refresh(dataset);
        view
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn visible(&self) -> &[RowId] {
        &self.visible
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Recomputes the visible ids after the dataset changed. The selection
    /// keeps only ids that are still visible.
    pub fn refresh(&mut self, dataset: &ModuleDataset) {
        self.visible = filter(&dataset.rows, &dataset.columns, &self.query)
            .into_iter()
            .map(|row| row.id.clone())
            .collect();
        self.selection.retain_visible(&self.visible);
    }

    /// A new query clears the selection.
    pub fn set_query(&mut self, query: &str, dataset: &ModuleDataset) {
        if self.query != query {
            self.selection.clear();
        }
        self.query = query.to_string();
        self.refresh(dataset);
    }

    /// Moving to another module resets query and selection.
    pub fn switch_module(&mut self, dataset: &ModuleDataset) {
        self.query.clear();
        self.selection.clear();
        self.refresh(dataset);
    }

    /// Ignores ids outside the current view.
    pub fn toggle(&mut self, id: &RowId) {
        if self.visible.contains(id) {
            self.selection.toggle(id);
        }
    }

    pub fn toggle_all(&mut self) {
        self.selection.select_all(&self.visible);
    }

    pub fn all_selected(&self) -> bool {
        self.selection.covers(&self.visible)
    }
}
