// src/records/codec/workbook.rs

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use tracing::{debug, trace};

use super::{unique_header, CodecError, DecodedSheet};
use crate::records::definitions::{format_number, CellValue, RawRow, Record, IDENTITY_FIELD};

const MAX_SHEET_ROWS: usize = 1_048_576;
const MAX_SHEET_COLUMNS: usize = 16_384;
const MAX_SHEET_TITLE_LEN: usize = 31;

/// Reads the first sheet of a workbook. The first row of the used range is the
/// header; every later row up to the last non-blank one becomes a record, so
/// blank rows in between come back as all-empty records.
pub fn decode(bytes: &[u8]) -> Result<DecodedSheet, CodecError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook.worksheet_range_at(0).ok_or(CodecError::NoSheets)??;

    let mut rows_iter = range.rows();
    let Some(header_cells) = rows_iter.next() else {
        debug!("First sheet is empty; nothing decoded.");
        return Ok(DecodedSheet::default());
    };
    let mut data_rows: Vec<&[Data]> = rows_iter.collect();
    let last_filled = data_rows
        .iter()
        .rposition(|cells| cells.iter().any(|c| cell_value(c) != CellValue::Empty));
    data_rows.truncate(last_filled.map_or(0, |idx| idx + 1));

    // Blank header cells only name a column when data sits beneath them.
    let mut taken = Vec::new();
    let mut header: Vec<(usize, String)> = Vec::new();
    for (col, cell) in header_cells.iter().enumerate() {
        let raw = header_text(cell);
        if raw == IDENTITY_FIELD {
            trace!("Skipping identity column at index {} on import.", col);
            continue;
        }
        let has_data = data_rows
            .iter()
            .any(|cells| cells.get(col).map(cell_value).unwrap_or_default() != CellValue::Empty);
        if raw.trim().is_empty() && !has_data {
            continue;
        }
        header.push((col, unique_header(&raw, &mut taken)));
    }

    let rows = data_rows
        .iter()
        .map(|cells| {
            let values: Record = header
                .iter()
                .map(|(col, name)| {
                    let value = cells.get(*col).map(cell_value).unwrap_or_default();
                    (name.clone(), value)
                })
                .collect();
            RawRow::from_values(values)
        })
        .collect();

    let decoded = DecodedSheet {
        columns: header.into_iter().map(|(_, name)| name).collect(),
        rows,
    };
    debug!(
        "Decoded workbook: {} columns, {} rows.",
        decoded.columns.len(),
        decoded.rows.len()
    );
    Ok(decoded)
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        CellValue::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Float(v) => CellValue::Number(*v),
        Data::Bool(v) => CellValue::Text(v.to_string()),
        Data::DateTime(v) => CellValue::Number(v.as_f64()),
        Data::DateTimeIso(v) => CellValue::Text(v.clone()),
        Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Writes a single-sheet xlsx: header row exactly `columns`, then one row per
/// record in order. Missing or empty values leave the cell blank and the
/// identity field is never written.
pub fn encode(columns: &[String], rows: &[RawRow], sheet_title: &str) -> Result<Vec<u8>, CodecError> {
    if columns.len() > MAX_SHEET_COLUMNS || rows.len() + 1 > MAX_SHEET_ROWS {
        return Err(CodecError::TooLarge {
            rows: rows.len(),
            columns: columns.len(),
        });
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sanitize_sheet_title(sheet_title))?;

    let exported: Vec<(u16, &String)> = columns
        .iter()
        .filter(|name| name.as_str() != IDENTITY_FIELD)
        .enumerate()
        .map(|(idx, name)| (idx as u16, name))
        .collect();

    for (col, name) in &exported {
        worksheet.write_string(0, *col, name.as_str())?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let sheet_row = (idx + 1) as u32;
        for (col, name) in &exported {
            match row.values.get(name.as_str()) {
                Some(CellValue::Text(s)) if !s.is_empty() => {
                    worksheet.write_string(sheet_row, *col, s.as_str())?;
                }
                Some(CellValue::Number(n)) if n.is_finite() => {
                    worksheet.write_number(sheet_row, *col, *n)?;
                }
                Some(CellValue::Number(n)) => {
                    worksheet.write_string(sheet_row, *col, &format_number(*n))?;
                }
                _ => {}
            }
        }
    }

    let buffer = workbook.save_to_buffer()?;
    debug!(
        "Encoded sheet '{}': {} columns, {} rows, {} bytes.",
        sheet_title,
        exported.len(),
        rows.len(),
        buffer.len()
    );
    Ok(buffer)
}

/// Applies worksheet naming rules: at most 31 characters, none of `[]:*?/\`,
/// no surrounding apostrophes, never blank.
pub fn sanitize_sheet_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let truncated: String = cleaned.chars().take(MAX_SHEET_TITLE_LEN).collect();
    if truncated.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        truncated
    }
}
