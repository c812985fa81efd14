// src/persistence/memory.rs

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

use super::{PersistenceGateway, PersistenceResult};
use crate::attendance::AttendanceSnapshot;
use crate::records::{ModuleKey, ModuleSnapshot};

/// Process-local gateway. Holds snapshots exactly as written.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    modules: RwLock<HashMap<ModuleKey, ModuleSnapshot>>,
    attendance: RwLock<Option<AttendanceSnapshot>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of module keys written so far.
    pub async fn module_count(&self) -> usize {
        self.modules.read().await.len()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn get_module(&self, key: &ModuleKey) -> PersistenceResult<Option<ModuleSnapshot>> {
        Ok(self.modules.read().await.get(key).cloned())
    }

    async fn put_module(&self, key: &ModuleKey, snapshot: &ModuleSnapshot) -> PersistenceResult<()> {
        trace!("MemoryGateway: storing {} rows under '{}'.", snapshot.rows.len(), key);
        self.modules
            .write()
            .await
            .insert(key.clone(), snapshot.clone());
        Ok(())
    }

    async fn get_attendance(&self) -> PersistenceResult<Option<AttendanceSnapshot>> {
        Ok(self.attendance.read().await.clone())
    }

    async fn put_attendance(&self, snapshot: &AttendanceSnapshot) -> PersistenceResult<()> {
        *self.attendance.write().await = Some(snapshot.clone());
        Ok(())
    }
}
