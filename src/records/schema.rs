// src/records/schema.rs
//! Column list reconciliation for imports and form saves.

use super::definitions::{ColumnList, RawRow};

/// Returns `existing` followed by every name of `discovered` it lacks, in
/// first-encounter order. Existing columns are never dropped or reordered and
/// the identity field is never added.
pub fn merge<I, S>(existing: &ColumnList, discovered: I) -> ColumnList
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged = existing.clone();
    for name in discovered {
        merged.push_unique(name.as_ref());
    }
    merged
}

/// Keys of `rows` in scan order: rows top to bottom, keys in `column_order`
/// first, then any remaining keys of the row.
pub fn discover_columns<'a>(column_order: &'a [String], rows: &'a [RawRow]) -> Vec<&'a str> {
    let mut seen = ColumnList::new();
    let mut order = Vec::new();
    for row in rows {
        let ordered = column_order
            .iter()
            .filter(|c| row.values.contains_key(c.as_str()));
        let rest = row
            .values
            .keys()
            .filter(|k| !column_order.iter().any(|c| c == *k));
        for key in ordered.chain(rest) {
            if seen.push_unique(key) {
                order.push(key.as_str());
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::definitions::{CellValue, Record, IDENTITY_FIELD};
    use proptest::prelude::*;

    fn cols(names: &[&str]) -> ColumnList {
        names.iter().collect()
    }

    #[test]
    fn merge_appends_only_new_names_in_order() {
        let existing = cols(&["Name", "Dept"]);
        let merged = merge(&existing, ["Phone", "Name", IDENTITY_FIELD, "Email", "Phone"]);
        assert_eq!(merged, cols(&["Name", "Dept", "Phone", "Email"]));
    }

    #[test]
    fn merge_is_case_sensitive() {
        let merged = merge(&cols(&["name"]), ["Name"]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn discover_columns_follows_header_order_then_row_keys() {
        let mut first = Record::new();
        first.insert("B".into(), CellValue::text("1"));
        let mut second = Record::new();
        second.insert("A".into(), CellValue::text("2"));
        second.insert("B".into(), CellValue::text("3"));
        second.insert("Z".into(), CellValue::text("4"));
        let rows = vec![RawRow::from_values(first), RawRow::from_values(second)];
        let order = vec!["B".to_string(), "A".to_string()];
        assert_eq!(discover_columns(&order, &rows), vec!["B", "A", "Z"]);
    }

    proptest! {
        #[test]
        fn merge_laws(
            existing in proptest::collection::vec("[a-d]{1,2}", 0..8),
            discovered in proptest::collection::vec("[a-f]{1,2}", 0..8),
        ) {
            let existing: ColumnList = existing.iter().collect();
            let once = merge(&existing, &discovered);
            let twice = merge(&once, &discovered);
            prop_assert_eq!(&once, &twice);

            prop_assert_eq!(&once.as_slice()[..existing.len()], existing.as_slice());

            let new_names: ColumnList = discovered
                .iter()
                .filter(|d| !existing.contains(d.as_str()))
                .collect();
            prop_assert_eq!(once.len(), existing.len() + new_names.len());
        }
    }
}
