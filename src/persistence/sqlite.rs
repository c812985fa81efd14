// src/persistence/sqlite.rs
//! SQLite-backed gateway. One row per module key holding the header list and
//! the row array as JSON text, plus a single attendance row.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{PersistenceError, PersistenceGateway, PersistenceResult, ATTENDANCE_KEY};
use crate::attendance::AttendanceSnapshot;
use crate::records::{ColumnList, ModuleKey, ModuleSnapshot, RawRow};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS modules (
        id TEXT PRIMARY KEY,
        headers TEXT,
        data TEXT
    );
    CREATE TABLE IF NOT EXISTS attendance (
        id TEXT PRIMARY KEY,
        employees TEXT,
        records TEXT
    );
";

#[derive(Clone)]
pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    /// Opens (or creates) the database file with WAL journaling.
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        // PRAGMA journal_mode returns the mode actually in effect.
        let journal_mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            warn!(
                "Failed to set WAL mode on database {:?}. Current mode: {}.",
                path.file_name(),
                journal_mode
            );
        } else {
            debug!("WAL mode activated for database {:?}", path.file_name());
        }
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;

        info!("Opened record database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> PersistenceResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> PersistenceResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> PersistenceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> PersistenceResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| PersistenceError::Unavailable("database lock poisoned".to_string()))?;
            f(&guard)
        })
        .await
        .map_err(|e| PersistenceError::Unavailable(e.to_string()))?
    }
}

fn read_module(conn: &Connection, key: &str) -> PersistenceResult<Option<ModuleSnapshot>> {
    let stored: Option<(Option<String>, Option<String>)> = conn
        .query_row(
            "SELECT headers, data FROM modules WHERE id = ?",
            params![key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((headers, data)) = stored else {
        return Ok(None);
    };
    let columns: ColumnList = serde_json::from_str(headers.as_deref().unwrap_or("[]"))?;
    let rows: Vec<RawRow> = serde_json::from_str(data.as_deref().unwrap_or("[]"))?;
    Ok(Some(ModuleSnapshot { columns, rows }))
}

fn write_module(conn: &Connection, key: &str, snapshot: &ModuleSnapshot) -> PersistenceResult<()> {
    let headers = serde_json::to_string(&snapshot.columns)?;
    let data = serde_json::to_string(&snapshot.rows)?;
    conn.execute(
        "INSERT INTO modules (id, headers, data) VALUES (?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET headers = excluded.headers, data = excluded.data",
        params![key, headers, data],
    )?;
    Ok(())
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn get_module(&self, key: &ModuleKey) -> PersistenceResult<Option<ModuleSnapshot>> {
        let key = key.as_str().to_string();
        self.run(move |conn| read_module(conn, &key)).await
    }

    async fn put_module(&self, key: &ModuleKey, snapshot: &ModuleSnapshot) -> PersistenceResult<()> {
        let key = key.as_str().to_string();
        let snapshot = snapshot.clone();
        self.run(move |conn| {
            write_module(conn, &key, &snapshot)?;
            debug!("SqliteGateway: wrote {} rows for '{}'.", snapshot.rows.len(), key);
            Ok(())
        })
        .await
    }

    async fn get_attendance(&self) -> PersistenceResult<Option<AttendanceSnapshot>> {
        self.run(|conn| {
            let stored: Option<(Option<String>, Option<String>)> = conn
                .query_row(
                    "SELECT employees, records FROM attendance WHERE id = ?",
                    params![ATTENDANCE_KEY],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((employees, records)) = stored else {
                return Ok(None);
            };
            Ok(Some(AttendanceSnapshot {
                employees: serde_json::from_str(employees.as_deref().unwrap_or("[]"))?,
                records: serde_json::from_str(records.as_deref().unwrap_or("{}"))?,
            }))
        })
        .await
    }

    async fn put_attendance(&self, snapshot: &AttendanceSnapshot) -> PersistenceResult<()> {
        let employees = serde_json::to_string(&snapshot.employees)?;
        let records = serde_json::to_string(&snapshot.records)?;
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO attendance (id, employees, records) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET employees = excluded.employees, records = excluded.records",
                params![ATTENDANCE_KEY, employees, records],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CellValue, RowId};

    fn sample_snapshot() -> ModuleSnapshot {
        let mut row = RawRow::default();
        row.id = Some(RowId::from("r1"));
        row.values.insert("Name".into(), CellValue::text("An"));
        row.values.insert("Age".into(), CellValue::Number(31.0));
        ModuleSnapshot {
            columns: ["Name", "Age"].iter().collect(),
            rows: vec![row],
        }
    }

    #[tokio::test]
    async fn module_round_trip_and_upsert() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        let key = ModuleKey::parse("hr").unwrap();
        assert!(gateway.get_module(&key).await.unwrap().is_none());

        let snapshot = sample_snapshot();
        gateway.put_module(&key, &snapshot).await.unwrap();
        assert_eq!(gateway.get_module(&key).await.unwrap(), Some(snapshot));

        let empty = ModuleSnapshot::default();
        gateway.put_module(&key, &empty).await.unwrap();
        assert_eq!(gateway.get_module(&key).await.unwrap(), Some(empty));
    }

    #[tokio::test]
    async fn null_data_column_reads_as_no_rows() {
        let gateway = SqliteGateway::open_in_memory().unwrap();
        gateway
            .run(|conn| {
                conn.execute(
                    "INSERT INTO modules (id, headers, data) VALUES ('costs', '[\"Item\"]', NULL)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();
        let key = ModuleKey::parse("costs").unwrap();
        let snapshot = gateway.get_module(&key).await.unwrap().unwrap();
        assert_eq!(snapshot.columns.len(), 1);
        assert!(snapshot.rows.is_empty());
    }

    #[tokio::test]
    async fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");
        let key = ModuleKey::parse("partners").unwrap();
        {
            let gateway = SqliteGateway::open(&path).unwrap();
            gateway.put_module(&key, &sample_snapshot()).await.unwrap();
        }
        let reopened = SqliteGateway::open(&path).unwrap();
        assert_eq!(reopened.get_module(&key).await.unwrap(), Some(sample_snapshot()));
    }
}
