// src/cli/attendance.rs
use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use std::path::PathBuf;

use crate::attendance::store::{export_file_name, month_total};
use crate::attendance::{is_weekend, AttendanceStatus, AttendanceStore, MonthRef};
use crate::persistence::SharedGateway;

#[derive(Subcommand)]
pub enum AttendanceCommand {
    /// List employees
    Employees,

    /// Add an employee
    AddEmployee {
        name: String,
        /// Defaults to "General"
        #[arg(short, long, default_value = "")]
        department: String,
    },

    /// Remove an employee and all of their marks
    RemoveEmployee { id: String },

    /// Set the mark for one day (X, H, P, V or "" to clear)
    Mark {
        id: String,
        /// YYYY-MM-DD
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(value_parser = parse_status)]
        status: AttendanceStatus,
    },

    /// Advance the mark for one day to the next status
    Cycle {
        id: String,
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Print the grid for a month
    Show {
        /// YYYY-MM, defaults to the current month
        #[arg(short, long, value_parser = parse_month)]
        month: Option<MonthRef>,
    },

    /// Write a month to an xlsx file
    Export {
        #[arg(short, long, value_parser = parse_month)]
        month: Option<MonthRef>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", raw, e))
}

pub fn parse_month(raw: &str) -> Result<MonthRef, String> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got '{}'", raw))?;
    let year: i32 = year.parse().map_err(|_| format!("invalid year in '{}'", raw))?;
    let month: u32 = month.parse().map_err(|_| format!("invalid month in '{}'", raw))?;
    MonthRef::new(year, month).map_err(|e| e.to_string())
}

pub fn parse_status(raw: &str) -> Result<AttendanceStatus, String> {
    AttendanceStatus::parse(raw).ok_or_else(|| format!("unknown status '{}'; use X, H, P, V or \"\"", raw))
}

pub async fn run(gateway: SharedGateway, command: AttendanceCommand) -> Result<()> {
    let store = AttendanceStore::load(gateway)
        .await
        .context("Failed to load attendance")?;

    match command {
        AttendanceCommand::Employees => {
            let grid = store.snapshot().await;
            for employee in &grid.employees {
                println!("{:<8} {:<24} {}", employee.id, employee.name, employee.department);
            }
            println!("{} employee(s)", grid.employees.len());
        }
        AttendanceCommand::AddEmployee { name, department } => {
            let employee = store.add_employee(&name, &department).await?;
            println!("Added {} ({}, {})", employee.name, employee.id, employee.department);
        }
        AttendanceCommand::RemoveEmployee { id } => {
            store.remove_employee(&id).await?;
            println!("Removed employee {}", id);
        }
        AttendanceCommand::Mark { id, date, status } => {
            store
                .set_status(&id, date.year(), date.month(), date.day(), status)
                .await?;
            println!("{} on {}: {}", id, date, display_status(status));
        }
        AttendanceCommand::Cycle { id, date } => {
            let status = store
                .cycle_status(&id, date.year(), date.month(), date.day())
                .await?;
            println!("{} on {}: {}", id, date, display_status(status));
        }
        AttendanceCommand::Show { month } => {
            let month = month.unwrap_or_else(MonthRef::current);
            print!("{}", render_month(&store, month).await?);
        }
        AttendanceCommand::Export { month, output } => {
            let month = month.unwrap_or_else(MonthRef::current);
            let bytes = store.export_month(month).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(month)));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} ({} bytes)", path.display(), bytes.len());
        }
    }
    Ok(())
}

fn display_status(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Unmarked => "-",
        other => other.code(),
    }
}

/// One line per employee, one character per day; weekends unmarked show `.`.
async fn render_month(store: &AttendanceStore, month: MonthRef) -> Result<String> {
    let grid = store.snapshot().await;
    let days = month.days();
    let mut out = format!("{}-{:02}\n", month.year, month.month);
    let mut header = format!("{:<24} ", "");
    for day in 1..=days {
        header.push(char::from_digit(day % 10, 10).ok_or_else(|| anyhow!("bad day {}", day))?);
    }
    out.push_str(&header);
    out.push_str("  Total\n");

    for employee in &grid.employees {
        let mut line = format!("{:<24} ", employee.name);
        for day in 1..=days {
            let status = grid.status(&employee.id, &month.date_key(day));
            let mark = match status {
                AttendanceStatus::Unmarked if is_weekend(month.year, month.month, day)? => ".",
                AttendanceStatus::Unmarked => " ",
                marked => marked.code(),
            };
            line.push_str(mark);
        }
        let total = month_total(&grid, &employee.id, month);
        out.push_str(&format!("{}  {}\n", line, crate::records::format_number(total)));
    }
    Ok(out)
}
