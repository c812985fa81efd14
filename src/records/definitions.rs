// src/records/definitions.rs
use serde::{de::Deserializer, ser::Serializer, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::error::ValidationError;

/// Name of the hidden per-row identity field. Never part of a `ColumnList`.
pub const IDENTITY_FIELD: &str = "_id";

const MAX_MODULE_KEY_LEN: usize = 64;

/// Values of one row keyed by column name. Never holds `IDENTITY_FIELD`.
pub type Record = BTreeMap<String, CellValue>;

// --- Module key ---

/// Address of one independently-schemaed dataset (e.g. `inventory`, `hr`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_MODULE_KEY_LEN
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidModuleKey(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human title: `inventory-items` becomes `Inventory Items`.
    pub fn title(&self) -> String {
        self.0
            .split('-')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<'de> Deserialize<'de> for ModuleKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ModuleKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Row identity ---

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// --- Cell values ---

/// Opaque cell content. No typing beyond text vs. number is enforced.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// String form used for display and search. `None` for empty cells.
    pub fn display_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
        }
    }

    /// Typed-in value: kept verbatim as text, blanks become empty.
    pub fn from_input(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    /// Reads a cell from delimited text. A number is only recognised when it
    /// prints back to the same text, so `0901234567` or a 20-digit account
    /// number stays text.
    pub fn parse_loose(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() && format_number(n) == trimmed => CellValue::Number(n),
            _ => CellValue::Text(raw.to_string()),
        }
    }
}

/// Shortest rendering of a number: integral values print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text().unwrap_or_default())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Empty => serializer.serialize_none(),
        }
    }
}

// Legacy snapshots may hold booleans or nested JSON; those are kept as text.
impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::String(s) => CellValue::Text(s),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Text(n.to_string()),
            },
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        })
    }
}

// --- Rows ---

/// A stored row: identity plus values. Serializes flat, with `_id` beside the columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "_id")]
    pub id: RowId,
    #[serde(flatten)]
    pub values: Record,
}

impl Row {
    pub fn new(id: RowId, mut values: Record) -> Self {
        values.remove(IDENTITY_FIELD);
        Self { id, values }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }
}

/// A row as it arrives from storage, a form or a decoder: identity optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(flatten)]
    pub values: Record,
}

impl RawRow {
    pub fn from_values(mut values: Record) -> Self {
        values.remove(IDENTITY_FIELD);
        Self { id: None, values }
    }
}

impl From<Row> for RawRow {
    fn from(row: Row) -> Self {
        Self {
            id: Some(row.id),
            values: row.values,
        }
    }
}

// --- Column list ---

/// Ordered, duplicate-free column names. Order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnList(Vec<String>);

impl ColumnList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Appends `name` unless it is already present or is the identity field.
    /// Returns whether the list grew.
    pub fn push_unique(&mut self, name: &str) -> bool {
        if name == IDENTITY_FIELD || self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }
}

impl<S: AsRef<str>> FromIterator<S> for ColumnList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = ColumnList::new();
        for name in iter {
            list.push_unique(name.as_ref());
        }
        list
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Persisted lists are re-normalized: duplicates and the identity field are dropped.
impl<'de> Deserialize<'de> for ColumnList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(names.iter().collect())
    }
}

// --- Dataset and snapshot ---

/// The `(columns, rows)` aggregate owned by one module key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleDataset {
    pub columns: ColumnList,
    pub rows: Vec<Row>,
}

impl ModuleDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub fn row_ids(&self) -> impl Iterator<Item = &RowId> {
        self.rows.iter().map(|row| &row.id)
    }
}

/// Wire form of a dataset, the unit of persistence. Field names follow the
/// REST payload (`headers`/`data`); `columns`/`rows` are accepted too.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    #[serde(rename = "headers", alias = "columns", default)]
    pub columns: ColumnList,
    #[serde(rename = "data", alias = "rows", default)]
    pub rows: Vec<RawRow>,
}

impl From<&ModuleDataset> for ModuleSnapshot {
    fn from(dataset: &ModuleDataset) -> Self {
        Self {
            columns: dataset.columns.clone(),
            rows: dataset.rows.iter().cloned().map(RawRow::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_key_validation_and_title() {
        let key = ModuleKey::parse("inventory-items").unwrap();
        assert_eq!(key.title(), "Inventory Items");
        assert_eq!(ModuleKey::parse(" hr ").unwrap().as_str(), "hr");
        assert!(ModuleKey::parse("").is_err());
        assert!(ModuleKey::parse("../etc").is_err());
        assert!(ModuleKey::parse(&"a".repeat(65)).is_err());
    }

    #[test]
    fn cell_value_display_matches_shortest_number_form() {
        assert_eq!(CellValue::Number(3.0).display_text().as_deref(), Some("3"));
        assert_eq!(CellValue::Number(2.5).display_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Empty.display_text(), None);
        assert_eq!(CellValue::parse_loose(" 42 "), CellValue::Number(42.0));
        assert_eq!(CellValue::parse_loose("A-12"), CellValue::text("A-12"));
        assert_eq!(CellValue::parse_loose("   "), CellValue::Empty);
        assert_eq!(CellValue::parse_loose("2.5"), CellValue::Number(2.5));
    }

    #[test]
    fn numeric_looking_text_that_would_change_stays_text() {
        assert_eq!(CellValue::parse_loose("0901234567"), CellValue::text("0901234567"));
        assert_eq!(
            CellValue::parse_loose("12345678901234567890"),
            CellValue::text("12345678901234567890")
        );
        assert_eq!(CellValue::parse_loose("1e3"), CellValue::text("1e3"));
        assert_eq!(CellValue::parse_loose("+7"), CellValue::text("+7"));
        assert_eq!(CellValue::parse_loose("-12"), CellValue::Number(-12.0));

        assert_eq!(CellValue::from_input("0901234567"), CellValue::text("0901234567"));
        assert_eq!(CellValue::from_input("12"), CellValue::text("12"));
        assert_eq!(CellValue::from_input("  "), CellValue::Empty);
    }

    #[test]
    fn snapshot_json_uses_flat_rows_with_identity() {
        let json = r#"{
            "headers": ["Name", "_id", "Qty", "Name"],
            "data": [
                {"_id": "a1", "Name": "Bolt", "Qty": 4, "Ok": true},
                {"Name": "Nut", "Qty": null}
            ]
        }"#;
        let snapshot: ModuleSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.columns.as_slice(), &["Name".to_string(), "Qty".to_string()]);
        assert_eq!(snapshot.rows[0].id, Some(RowId::from("a1")));
        assert_eq!(snapshot.rows[0].values["Qty"], CellValue::Number(4.0));
        assert_eq!(snapshot.rows[0].values["Ok"], CellValue::text("true"));
        assert_eq!(snapshot.rows[1].id, None);
        assert_eq!(snapshot.rows[1].values["Qty"], CellValue::Empty);

        let back = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(back["data"][0]["_id"], "a1");
        assert_eq!(back["headers"][1], "Qty");
    }

    #[test]
    fn snapshot_accepts_columns_and_rows_aliases() {
        let json = r#"{"columns": ["A"], "rows": [{"_id": "x", "A": "1"}]}"#;
        let snapshot: ModuleSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.columns.len(), 1);
        assert_eq!(snapshot.rows.len(), 1);
    }
}
