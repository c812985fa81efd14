// src/records/logic/normalize.rs

use std::collections::HashSet;
use tracing::warn;

use crate::records::definitions::{ModuleDataset, ModuleSnapshot, Row};
use crate::records::identity::allocate_unique;
use crate::records::schema::{discover_columns, merge};

/// Builds a dataset from a stored snapshot. Rows without an identity get one;
/// a row repeating an earlier row's identity is re-keyed, and keys found only in
/// rows are appended to the column list. Nothing is written
/// back here, the repaired state is persisted by the next mutation.
pub fn from_snapshot(snapshot: ModuleSnapshot) -> ModuleDataset {
    let columns = merge(
        &snapshot.columns,
        discover_columns(snapshot.columns.as_slice(), &snapshot.rows),
    );
    if columns.len() > snapshot.columns.len() {
        warn!(
            "Added {} column(s) found only in stored rows.",
            columns.len() - snapshot.columns.len()
        );
    }

    let mut taken: HashSet<_> = HashSet::with_capacity(snapshot.rows.len());
    let mut repaired = 0usize;

    let rows = snapshot
        .rows
        .into_iter()
        .map(|raw| {
            let id = match raw.id {
                Some(id) if taken.insert(id.clone()) => id,
                _ => {
                    repaired += 1;
                    allocate_unique(&mut taken)
                }
            };
            Row::new(id, raw.values)
        })
        .collect::<Vec<_>>();

    if repaired > 0 {
        warn!("Assigned fresh identities to {} stored row(s).", repaired);
    }
    ModuleDataset { columns, rows }
}
