// src/records/codec/delimited.rs

use csv::ReaderBuilder;
use tracing::debug;

use super::{unique_header, CodecError, DecodedSheet};
use crate::records::definitions::{CellValue, RawRow, Record, IDENTITY_FIELD};

/// Reads UTF-8 CSV with a header line. Numeric-looking cells become numbers,
/// blank cells become empty. Blank lines between records are kept as
/// all-empty rows; trailing ones are dropped.
pub fn decode_csv(bytes: &[u8]) -> Result<DecodedSheet, CodecError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut taken = Vec::new();
    let header: Vec<(usize, String)> = reader
        .headers()?
        .iter()
        .enumerate()
        .filter(|(_, raw)| *raw != IDENTITY_FIELD)
        .map(|(col, raw)| (col, unique_header(raw, &mut taken)))
        .collect();

    let mut rows = Vec::new();
    let mut filled_len = 0;
    for record in reader.records() {
        let record = record?;
        let blank = record.iter().all(|cell| cell.trim().is_empty());
        let values: Record = header
            .iter()
            .map(|(col, name)| {
                let value = record
                    .get(*col)
                    .map(CellValue::parse_loose)
                    .unwrap_or_default();
                (name.clone(), value)
            })
            .collect();
        rows.push(RawRow::from_values(values));
        if !blank {
            filled_len = rows.len();
        }
    }
    rows.truncate(filled_len);

    debug!("Decoded CSV: {} columns, {} rows.", header.len(), rows.len());
    Ok(DecodedSheet {
        columns: header.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}
