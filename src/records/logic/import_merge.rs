// src/records/logic/import_merge.rs

use tracing::debug;

use super::taken_ids;
use crate::records::codec::DecodedSheet;
use crate::records::definitions::{ModuleDataset, Row};
use crate::records::identity::allocate_unique;
use crate::records::schema::{discover_columns, merge};

/// Appends every decoded row under a fresh identity and extends the column
/// list with any new names. Existing rows are never matched or overwritten.
pub fn import_merge(dataset: &ModuleDataset, decoded: &DecodedSheet) -> ModuleDataset {
    let mut taken = taken_ids(dataset);

    let discovered = decoded
        .columns
        .iter()
        .map(String::as_str)
        .chain(discover_columns(&decoded.columns, &decoded.rows));
    let columns = merge(&dataset.columns, discovered);

    let mut rows = dataset.rows.clone();
    rows.extend(
        decoded
            .rows
            .iter()
            .map(|raw| Row::new(allocate_unique(&mut taken), raw.values.clone())),
    );

    debug!(
        "Import merge: {} -> {} columns, {} -> {} rows.",
        dataset.columns.len(),
        columns.len(),
        dataset.rows.len(),
        rows.len()
    );
    ModuleDataset { columns, rows }
}
