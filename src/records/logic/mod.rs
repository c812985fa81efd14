// src/records/logic/mod.rs
//! Pure dataset transitions. Each takes the current dataset and returns the
//! next one; persistence is the store's concern.

mod delete_rows;
mod import_merge;
mod normalize;
mod upsert_row;

pub use delete_rows::{clear_all, delete_rows};
pub use import_merge::import_merge;
pub use normalize::from_snapshot;
pub use upsert_row::upsert_row;

use std::collections::HashSet;

use super::definitions::{ModuleDataset, RowId};

pub(crate) fn taken_ids(dataset: &ModuleDataset) -> HashSet<RowId> {
    dataset.row_ids().cloned().collect()
}
