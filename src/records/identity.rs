// src/records/identity.rs
//! Row identity allocation: random base-36 tokens.

use rand::Rng;
use std::collections::HashSet;

use super::definitions::{RawRow, Row, RowId};

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of row identities. 36^13 values keeps collisions negligible.
pub const ROW_ID_LEN: usize = 13;

/// Returns a fresh random row identity.
pub fn allocate() -> RowId {
    allocate_with_len(ROW_ID_LEN)
}

pub fn allocate_with_len(len: usize) -> RowId {
    let mut rng = rand::rng();
    let token: String = (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    RowId::new(token)
}

/// Allocates an identity not present in `taken` and records it there.
pub fn allocate_unique(taken: &mut HashSet<RowId>) -> RowId {
    loop {
        let id = allocate();
        if taken.insert(id.clone()) {
            return id;
        }
        tracing::warn!("Row id collision on '{}', drawing again.", id);
    }
}

/// Keeps an existing identity, otherwise assigns a fresh one.
pub fn ensure_identity(row: RawRow) -> Row {
    let id = row.id.unwrap_or_else(allocate);
    Row::new(id, row.values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::definitions::{CellValue, Record};

    #[test]
    fn allocated_ids_are_base36_and_fixed_length() {
        let id = allocate();
        assert_eq!(id.as_str().len(), ROW_ID_LEN);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn ten_thousand_allocations_do_not_collide() {
        let ids: HashSet<RowId> = (0..10_000).map(|_| allocate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn ensure_identity_keeps_existing_id() {
        let mut values = Record::new();
        values.insert("Name".into(), CellValue::text("An"));
        let row = ensure_identity(RawRow {
            id: Some(RowId::from("keep")),
            values: values.clone(),
        });
        assert_eq!(row.id, RowId::from("keep"));
        assert_eq!(row.values, values);

        let fresh = ensure_identity(RawRow::from_values(values));
        assert_eq!(fresh.id.as_str().len(), ROW_ID_LEN);
    }

    #[test]
    fn allocate_unique_records_the_new_id() {
        let mut taken = HashSet::new();
        let a = allocate_unique(&mut taken);
        let b = allocate_unique(&mut taken);
        assert_ne!(a, b);
        assert!(taken.contains(&a) && taken.contains(&b));
    }
}
