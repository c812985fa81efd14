// src/settings/mod.rs
pub mod io;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::persistence::{FileGateway, HttpGateway, PersistenceError, PersistenceResult, SharedGateway, SqliteGateway};
use crate::records::ColumnList;

pub const ENV_BACKEND: &str = "RECORDDESK_BACKEND";
pub const ENV_DATA_DIR: &str = "RECORDDESK_DATA_DIR";
pub const ENV_SERVER_URL: &str = "RECORDDESK_SERVER_URL";

const DATABASE_FILE: &str = "recorddesk.db";

/// Columns installed when the first row of an empty module is created.
pub const DEFAULT_COLUMNS: [&str; 5] = ["ID", "Name", "Description", "Created", "Status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Json,
    Http,
}

impl BackendKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Some(BackendKind::Sqlite),
            "json" | "file" => Some(BackendKind::Json),
            "http" | "server" => Some(BackendKind::Http),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub backend: BackendKind,
    /// Where the SQLite database or JSON files live. `None` uses
    /// `<Documents>/RecordDesk`.
    pub data_dir: Option<PathBuf>,
    pub server_url: Option<String>,
    pub default_columns: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: None,
            server_url: None,
            default_columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl AppSettings {
    pub fn default_data_dir() -> PathBuf {
        let documents = directories_next::UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        documents.join("RecordDesk")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::default_data_dir)
    }

    pub fn default_columns(&self) -> ColumnList {
        self.default_columns.iter().collect()
    }

    /// Applies `RECORDDESK_*` variables over the stored values. Unparseable
    /// backend names are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_BACKEND) {
            match BackendKind::parse(&raw) {
                Some(kind) => self.backend = kind,
                None => tracing::warn!("Ignoring unknown {} value '{}'.", ENV_BACKEND, raw),
            }
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|u| !u.trim().is_empty()) {
            self.server_url = Some(url);
        }
    }

    /// Opens the configured storage adapter.
    pub fn build_gateway(&self) -> PersistenceResult<SharedGateway> {
        let gateway: SharedGateway = match self.backend {
            BackendKind::Sqlite => {
                let path = self.data_dir().join(DATABASE_FILE);
                info!("Using SQLite storage at {:?}", path);
                Arc::new(SqliteGateway::open(&path)?)
            }
            BackendKind::Json => {
                let dir = self.data_dir();
                info!("Using JSON file storage under {:?}", dir);
                Arc::new(FileGateway::new(dir))
            }
            BackendKind::Http => {
                let url = self.server_url.as_deref().ok_or_else(|| {
                    PersistenceError::Unavailable(format!("http backend needs a server url ({})", ENV_SERVER_URL))
                })?;
                info!("Using remote storage at {}", url);
                Arc::new(HttpGateway::new(url)?)
            }
        };
        Ok(gateway)
    }
}
