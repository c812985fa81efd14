// src/attendance/definitions.rs
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Length of employee ids handed out by `add_employee`.
pub const EMPLOYEE_ID_LEN: usize = 7;

/// Department used when none is given.
pub const DEFAULT_DEPARTMENT: &str = "General";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
}

/// Mark for one employee on one day. Stored by long name; reading accepts
/// anything `parse` does and treats unknown values as unmarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AttendanceStatus {
    #[default]
    #[serde(rename = "")]
    Unmarked,
    #[serde(rename = "full-day")]
    FullDay,
    #[serde(rename = "half-day")]
    HalfDay,
    #[serde(rename = "excused")]
    Excused,
    #[serde(rename = "unexcused")]
    Unexcused,
}

impl<'de> Deserialize<'de> for AttendanceStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let status = match &raw {
            serde_json::Value::Null => Some(AttendanceStatus::Unmarked),
            serde_json::Value::String(text) => AttendanceStatus::parse(text),
            _ => None,
        };
        Ok(status.unwrap_or_else(|| {
            warn!("Unknown attendance status {}; treating it as unmarked.", raw);
            AttendanceStatus::Unmarked
        }))
    }
}

impl AttendanceStatus {
    /// Next mark in the click cycle, wrapping back to unmarked.
    pub fn next(self) -> Self {
        match self {
            AttendanceStatus::Unmarked => AttendanceStatus::FullDay,
            AttendanceStatus::FullDay => AttendanceStatus::HalfDay,
            AttendanceStatus::HalfDay => AttendanceStatus::Excused,
            AttendanceStatus::Excused => AttendanceStatus::Unexcused,
            AttendanceStatus::Unexcused => AttendanceStatus::Unmarked,
        }
    }

    /// Worked days credited for this mark.
    pub fn credit(self) -> f64 {
        match self {
            AttendanceStatus::FullDay => 1.0,
            AttendanceStatus::HalfDay => 0.5,
            _ => 0.0,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            AttendanceStatus::Unmarked => "",
            AttendanceStatus::FullDay => "X",
            AttendanceStatus::HalfDay => "H",
            AttendanceStatus::Excused => "P",
            AttendanceStatus::Unexcused => "V",
        }
    }

    /// Accepts a grid code or the long name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "clear" => Some(AttendanceStatus::Unmarked),
            "x" | "full-day" | "full" => Some(AttendanceStatus::FullDay),
            "h" | "half-day" | "half" => Some(AttendanceStatus::HalfDay),
            "p" | "excused" => Some(AttendanceStatus::Excused),
            "v" | "unexcused" | "absent" => Some(AttendanceStatus::Unexcused),
            _ => None,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// `employee id -> date key -> status`.
pub type AttendanceRecords = BTreeMap<String, BTreeMap<String, AttendanceStatus>>;

/// Everything stored under the attendance key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttendanceSnapshot {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub records: AttendanceRecords,
}

impl AttendanceSnapshot {
    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn status(&self, employee_id: &str, date_key: &str) -> AttendanceStatus {
        self.records
            .get(employee_id)
            .and_then(|days| days.get(date_key))
            .copied()
            .unwrap_or_default()
    }
}
