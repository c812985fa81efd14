// src/records/logic/delete_rows.rs

use std::collections::HashSet;
use tracing::{debug, trace};

use crate::records::definitions::{ModuleDataset, RowId};

/// Drops every row whose identity is in `ids`, keeping the order of the rest.
/// Returns the next dataset and how many rows went away.
pub fn delete_rows(dataset: &ModuleDataset, ids: &HashSet<RowId>) -> (ModuleDataset, usize) {
    if ids.is_empty() {
        trace!("Delete requested with no ids.");
    }
    let rows: Vec<_> = dataset
        .rows
        .iter()
        .filter(|row| !ids.contains(&row.id))
        .cloned()
        .collect();
    let removed = dataset.rows.len() - rows.len();
    debug!("Deleted {} of {} requested row(s).", removed, ids.len());
    (
        ModuleDataset {
            columns: dataset.columns.clone(),
            rows,
        },
        removed,
    )
}

/// The `([], [])` state written by a clear-all.
pub fn clear_all() -> ModuleDataset {
    ModuleDataset::empty()
}
