// src/persistence/file.rs
//! Directory of pretty-printed JSON files: `modules/<key>.json` per module and
//! `attendance.json` for the grid.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, trace, warn};

use super::{PersistenceGateway, PersistenceResult};
use crate::attendance::AttendanceSnapshot;
use crate::records::{ModuleKey, ModuleSnapshot};

const MODULES_DIR: &str = "modules";
const ATTENDANCE_FILE: &str = "attendance.json";

#[derive(Debug, Clone)]
pub struct FileGateway {
    base_path: PathBuf,
}

impl FileGateway {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn module_path(&self, key: &ModuleKey) -> PathBuf {
        self.base_path
            .join(MODULES_DIR)
            .join(format!("{}.json", key.as_str()))
    }

    pub fn attendance_path(&self) -> PathBuf {
        self.base_path.join(ATTENDANCE_FILE)
    }
}

/// Reads a JSON document, treating a missing or blank file as absent.
async fn read_json<T: DeserializeOwned>(path: &Path) -> PersistenceResult<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            trace!("No file at '{}'; treating as absent.", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let trimmed = content.trim_start_matches('\u{FEFF}');
    if trimmed.trim().is_empty() {
        warn!("File '{}' is empty. Treating as absent.", path.display());
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Writes through a sibling temp file and a rename so readers never observe a
/// half-written snapshot.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> PersistenceResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    info!("Saved {} bytes to '{}'.", bytes.len(), path.display());
    Ok(())
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn get_module(&self, key: &ModuleKey) -> PersistenceResult<Option<ModuleSnapshot>> {
        read_json(&self.module_path(key)).await
    }

    async fn put_module(&self, key: &ModuleKey, snapshot: &ModuleSnapshot) -> PersistenceResult<()> {
        write_json(&self.module_path(key), snapshot).await
    }

    async fn get_attendance(&self) -> PersistenceResult<Option<AttendanceSnapshot>> {
        read_json(&self.attendance_path()).await
    }

    async fn put_attendance(&self, snapshot: &AttendanceSnapshot) -> PersistenceResult<()> {
        write_json(&self.attendance_path(), snapshot).await
    }
}
