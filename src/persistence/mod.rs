// src/persistence/mod.rs
//! Key-value persistence for module snapshots and the attendance grid.
//!
//! Every write is an idempotent full replace keyed by module id, so callers can
//! retry a failed write with the same snapshot.

pub mod error;
pub mod file;
pub mod http;
pub mod memory;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use file::FileGateway;
pub use http::HttpGateway;
pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

use async_trait::async_trait;
use std::sync::Arc;

use crate::attendance::AttendanceSnapshot;
use crate::records::{ModuleKey, ModuleSnapshot};

/// Storage collaborator consumed by the stores.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Returns `None` when nothing has been stored under `key` yet.
    async fn get_module(&self, key: &ModuleKey) -> PersistenceResult<Option<ModuleSnapshot>>;

    async fn put_module(&self, key: &ModuleKey, snapshot: &ModuleSnapshot) -> PersistenceResult<()>;

    async fn get_attendance(&self) -> PersistenceResult<Option<AttendanceSnapshot>>;

    async fn put_attendance(&self, snapshot: &AttendanceSnapshot) -> PersistenceResult<()>;
}

pub type SharedGateway = Arc<dyn PersistenceGateway>;

/// Single key under which the attendance grid is stored.
pub const ATTENDANCE_KEY: &str = "main";
