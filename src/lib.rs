// src/lib.rs
//! Record modules with user-defined columns, spreadsheet import/export and a
//! monthly attendance grid, over pluggable key-value storage.

pub mod attendance;
pub mod cli;
pub mod logging;
pub mod persistence;
pub mod records;
pub mod settings;
