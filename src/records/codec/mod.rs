// src/records/codec/mod.rs
//! Spreadsheet interchange: binary workbooks and CSV text to and from
//! `(columns, rows)`.

mod delimited;
mod workbook;

pub use delimited::decode_csv;
pub use workbook::{decode, encode, sanitize_sheet_title};

use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::definitions::RawRow;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Not a supported spreadsheet file: {0}")]
    Unreadable(#[from] calamine::Error),
    #[error("Spreadsheet contains no sheets.")]
    NoSheets,
    #[error("CSV input could not be read: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("Sheet too large to export: {rows} rows x {columns} columns.")]
    TooLarge { rows: usize, columns: usize },
    #[error("No data to import or export.")]
    NoData,
    #[error("Spreadsheet worker failed: {0}")]
    Worker(String),
}

/// Decoder output: header names in sheet order and one mapping per data row.
/// Rows carry no identity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedSheet {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl DecodedSheet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// xlsx, xlsm, xlsb, xls or ods, detected from the content.
    Workbook,
    Csv,
}

impl SpreadsheetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SpreadsheetFormat::Csv,
            _ => SpreadsheetFormat::Workbook,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<DecodedSheet, CodecError> {
        match self {
            SpreadsheetFormat::Workbook => decode(bytes),
            SpreadsheetFormat::Csv => decode_csv(bytes),
        }
    }
}

/// Decodes on the blocking pool so large uploads do not stall the runtime.
pub async fn decode_async(
    bytes: Vec<u8>,
    format: SpreadsheetFormat,
) -> Result<DecodedSheet, CodecError> {
    debug!("Decoding {} byte {:?} upload on worker.", bytes.len(), format);
    tokio::task::spawn_blocking(move || format.decode(&bytes))
        .await
        .map_err(|e| CodecError::Worker(e.to_string()))?
}

/// Encodes on the blocking pool.
pub async fn encode_async(
    columns: Vec<String>,
    rows: Vec<RawRow>,
    sheet_title: String,
) -> Result<Vec<u8>, CodecError> {
    tokio::task::spawn_blocking(move || encode(&columns, &rows, &sheet_title))
        .await
        .map_err(|e| CodecError::Worker(e.to_string()))?
}

/// Names header cells the way common spreadsheet tooling does: blanks become
/// `__EMPTY`, repeats get `_1`, `_2`, ... suffixes.
pub(crate) fn unique_header(raw: &str, taken: &mut Vec<String>) -> String {
    let base = if raw.trim().is_empty() { "__EMPTY" } else { raw };
    let mut candidate = base.to_string();
    let mut n = 0;
    while taken.iter().any(|t| t == &candidate) {
        n += 1;
        candidate = format!("{}_{}", base, n);
    }
    taken.push(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SpreadsheetFormat::from_path(Path::new("in/Stock.CSV")),
            SpreadsheetFormat::Csv
        );
        assert_eq!(
            SpreadsheetFormat::from_path(Path::new("stock.xlsx")),
            SpreadsheetFormat::Workbook
        );
        assert_eq!(
            SpreadsheetFormat::from_path(Path::new("noext")),
            SpreadsheetFormat::Workbook
        );
    }

    #[test]
    fn header_naming_handles_blanks_and_repeats() {
        let mut taken = Vec::new();
        let names: Vec<String> = ["Name", "", "Name", " ", "Name"]
            .iter()
            .map(|h| unique_header(h, &mut taken))
            .collect();
        assert_eq!(names, vec!["Name", "__EMPTY", "Name_1", "__EMPTY_1", "Name_2"]);
    }
}
