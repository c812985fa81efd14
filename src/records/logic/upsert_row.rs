// src/records/logic/upsert_row.rs

use tracing::{debug, trace};

use super::taken_ids;
use crate::records::definitions::{ColumnList, ModuleDataset, Record, Row, RowId, IDENTITY_FIELD};
use crate::records::identity::allocate_unique;
use crate::records::schema::merge;

/// Replaces the values of the row with `edit_id` in place, or appends a new
/// row when `edit_id` is absent or unknown. Creating into a dataset without
/// columns installs `default_columns` first. Form keys the column list lacks
/// are appended to it.
pub fn upsert_row(
    dataset: &ModuleDataset,
    mut form: Record,
    edit_id: Option<&RowId>,
    default_columns: &ColumnList,
) -> (ModuleDataset, RowId) {
    form.remove(IDENTITY_FIELD);

    let editing = edit_id.filter(|id| dataset.row(id).is_some());

    let base_columns = if editing.is_none() && dataset.columns.is_empty() {
        trace!("Installing {} default columns on first create.", default_columns.len());
        default_columns.clone()
    } else {
        dataset.columns.clone()
    };
    let columns = merge(&base_columns, form.keys());

    let mut rows = dataset.rows.clone();
    let id = match editing {
        Some(id) => {
            if let Some(row) = rows.iter_mut().find(|row| &row.id == id) {
                row.values = form;
            }
            debug!("Edited row '{}'.", id);
            id.clone()
        }
        None => {
            if let Some(unknown) = edit_id {
                debug!("Edit target '{}' not found; appending as a new row.", unknown);
            }
            let mut taken = taken_ids(dataset);
            let id = allocate_unique(&mut taken);
            rows.push(Row::new(id.clone(), form));
            id
        }
    };

    (ModuleDataset { columns, rows }, id)
}
