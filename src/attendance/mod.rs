// src/attendance/mod.rs
//! Fixed-schema monthly attendance grid.

pub mod calendar;
pub mod definitions;
pub mod store;

pub use calendar::{date_key, days_in_month, is_weekend, MonthRef};
pub use definitions::{AttendanceSnapshot, AttendanceStatus, Employee};
pub use store::AttendanceStore;
