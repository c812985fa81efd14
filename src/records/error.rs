// src/records/error.rs

use thiserror::Error;

use super::codec::CodecError;
use crate::persistence::PersistenceError;

/// Rejected input. Identity uniqueness is guaranteed by construction and
/// therefore never reported here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid module key '{0}': use 1-64 letters, digits, '-' or '_'.")]
    InvalidModuleKey(String),
    #[error("Employee name must not be blank.")]
    BlankEmployeeName,
    #[error("Employee '{0}' not found.")]
    UnknownEmployee(String),
    #[error("Invalid date {year}-{month}-{day}.")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// Error returned by every store operation. The in-memory state is unchanged
/// whenever one of these is returned.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type StoreResult<T> = Result<T, StoreError>;
