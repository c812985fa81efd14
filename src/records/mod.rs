// src/records/mod.rs
//! Dynamic-schema record modules: identity, column merging, spreadsheet
//! transfer, filtering and the persist-first table store.

pub mod codec;
pub mod definitions;
pub mod error;
pub mod identity;
pub mod logic;
pub mod schema;
pub mod search;
pub mod store;

pub use codec::{CodecError, DecodedSheet, SpreadsheetFormat};
pub use definitions::{
    format_number, CellValue, ColumnList, ModuleDataset, ModuleKey, ModuleSnapshot, RawRow,
    Record, Row, RowId, IDENTITY_FIELD,
};
pub use error::{StoreError, StoreResult, ValidationError};
pub use search::{SearchView, Selection};
pub use store::TableStore;
