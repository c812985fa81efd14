// src/attendance/store.rs
//! Employees x days grid with the same write-then-commit discipline as the
//! table store.

use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::calendar::{validate_day, MonthRef};
use super::definitions::{AttendanceSnapshot, AttendanceStatus, Employee, DEFAULT_DEPARTMENT, EMPLOYEE_ID_LEN};
use crate::persistence::SharedGateway;
use crate::records::codec::{self, CodecError};
use crate::records::identity::allocate_with_len;
use crate::records::{format_number, CellValue, RawRow, Record, StoreResult, ValidationError};

pub struct AttendanceStore {
    gateway: SharedGateway,
    grid: Mutex<AttendanceSnapshot>,
}

impl AttendanceStore {
    pub async fn load(gateway: SharedGateway) -> StoreResult<Self> {
        let grid = gateway.get_attendance().await?.unwrap_or_default();
        info!("Loaded attendance grid with {} employee(s).", grid.employees.len());
        Ok(Self {
            gateway,
            grid: Mutex::new(grid),
        })
    }

    pub async fn snapshot(&self) -> AttendanceSnapshot {
        self.grid.lock().await.clone()
    }

    /// Adds an employee with a fresh id. A blank department becomes
    /// `General`.
    pub async fn add_employee(&self, name: &str, department: &str) -> StoreResult<Employee> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankEmployeeName.into());
        }
        let department = match department.trim() {
            "" => DEFAULT_DEPARTMENT,
            d => d,
        };

        let mut current = self.grid.lock().await;
        let taken: HashSet<&str> = current.employees.iter().map(|e| e.id.as_str()).collect();
        let id = loop {
            let candidate = allocate_with_len(EMPLOYEE_ID_LEN);
            if !taken.contains(candidate.as_str()) {
                break candidate.as_str().to_string();
            }
        };
        let employee = Employee {
            id,
            name: name.to_string(),
            department: department.to_string(),
        };

        let mut next = current.clone();
        next.employees.push(employee.clone());
        self.commit(&mut current, next, "add employee").await?;
        info!("Added employee '{}' ({}).", employee.name, employee.id);
        Ok(employee)
    }

    /// Removes the employee together with all of their marks.
    pub async fn remove_employee(&self, id: &str) -> StoreResult<AttendanceSnapshot> {
        let mut current = self.grid.lock().await;
        if current.employee(id).is_none() {
            return Err(ValidationError::UnknownEmployee(id.to_string()).into());
        }
        let mut next = current.clone();
        next.employees.retain(|e| e.id != id);
        next.records.remove(id);
        self.commit(&mut current, next, "remove employee").await?;
        Ok(current.clone())
    }

    /// Advances the mark for one day along the click cycle and returns it.
    pub async fn cycle_status(&self, employee_id: &str, year: i32, month: u32, day: u32) -> StoreResult<AttendanceStatus> {
        let mut current = self.grid.lock().await;
        let key = checked_key(&current, employee_id, year, month, day)?;
        let status = current.status(employee_id, &key).next();
        let next = with_status(&current, employee_id, key, status);
        self.commit(&mut current, next, "cycle status").await?;
        Ok(status)
    }

    pub async fn set_status(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
        day: u32,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceSnapshot> {
        let mut current = self.grid.lock().await;
        let key = checked_key(&current, employee_id, year, month, day)?;
        let next = with_status(&current, employee_id, key, status);
        self.commit(&mut current, next, "set status").await?;
        Ok(current.clone())
    }

    /// Worked days in `month`: a full day counts 1, a half day 0.5.
    pub async fn month_total(&self, employee_id: &str, month: MonthRef) -> f64 {
        month_total(&*self.grid.lock().await, employee_id, month)
    }

    /// Workbook with one row per employee: id, name, department, every day of
    /// the month and the total.
    pub async fn export_month(&self, month: MonthRef) -> StoreResult<Vec<u8>> {
        let grid = self.snapshot().await;
        if grid.employees.is_empty() {
            return Err(CodecError::NoData.into());
        }
        let (columns, rows) = month_sheet(&grid, month);
        let title = format!("Attendance_M{}_{}", month.month, month.year);
        Ok(codec::encode_async(columns, rows, title).await?)
    }

    async fn commit(&self, current: &mut AttendanceSnapshot, next: AttendanceSnapshot, op: &str) -> StoreResult<()> {
        if let Err(e) = self.gateway.put_attendance(&next).await {
            error!("Failed to persist attendance ({}): {}. State unchanged.", op, e);
            return Err(e.into());
        }
        *current = next;
        Ok(())
    }
}

/// Suggested file name for a monthly export.
pub fn export_file_name(month: MonthRef) -> String {
    format!("Attendance_{}_{:02}.xlsx", month.year, month.month)
}

fn checked_key(grid: &AttendanceSnapshot, employee_id: &str, year: i32, month: u32, day: u32) -> StoreResult<String> {
    if grid.employee(employee_id).is_none() {
        return Err(ValidationError::UnknownEmployee(employee_id.to_string()).into());
    }
    validate_day(year, month, day)?;
    Ok(super::calendar::date_key(year, month, day))
}

/// Unmarked days are dropped from the map instead of being stored as blanks.
fn with_status(grid: &AttendanceSnapshot, employee_id: &str, key: String, status: AttendanceStatus) -> AttendanceSnapshot {
    let mut next = grid.clone();
    let days = next.records.entry(employee_id.to_string()).or_default();
    if status == AttendanceStatus::Unmarked {
        days.remove(&key);
        if days.is_empty() {
            next.records.remove(employee_id);
        }
    } else {
        days.insert(key, status);
    }
    next
}

pub fn month_total(grid: &AttendanceSnapshot, employee_id: &str, month: MonthRef) -> f64 {
    (1..=month.days())
        .map(|day| grid.status(employee_id, &month.date_key(day)).credit())
        .sum()
}

fn month_sheet(grid: &AttendanceSnapshot, month: MonthRef) -> (Vec<String>, Vec<RawRow>) {
    let days = month.days();
    let mut columns = vec!["Employee ID".to_string(), "Name".to_string(), "Department".to_string()];
    columns.extend((1..=days).map(|day| format!("Day {}", day)));
    columns.push("Total".to_string());

    let rows = grid
        .employees
        .iter()
        .map(|employee| {
            let mut values = Record::new();
            values.insert("Employee ID".into(), CellValue::text(employee.id.as_str()));
            values.insert("Name".into(), CellValue::text(employee.name.as_str()));
            values.insert("Department".into(), CellValue::text(employee.department.as_str()));
            for day in 1..=days {
                let status = grid.status(&employee.id, &month.date_key(day));
                let cell = match status {
                    AttendanceStatus::Unmarked => CellValue::Empty,
                    marked => CellValue::text(marked.code()),
                };
                values.insert(format!("Day {}", day), cell);
            }
            let total = month_total(grid, &employee.id, month);
            values.insert("Total".into(), CellValue::Number(total));
            tracing::trace!("{} worked {} day(s).", employee.id, format_number(total));
            RawRow::from_values(values)
        })
        .collect();
    (columns, rows)
}
