// src/persistence/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Gateway unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
