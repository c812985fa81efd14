// src/records/store.rs
//! Authoritative in-process copy of one module's dataset.
//!
//! Every mutation runs under the store's async lock: it reads the current
//! dataset, computes the next one, writes the full snapshot and only then
//! replaces the in-memory copy. A failed write leaves the prior state in
//! place. The lock is FIFO, so queued mutations never start from a stale
//! snapshot.

use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::codec::{self, CodecError, DecodedSheet, SpreadsheetFormat};
use super::definitions::{ColumnList, ModuleDataset, ModuleKey, ModuleSnapshot, RawRow, Record, RowId};
use super::error::StoreResult;
use super::logic;
use crate::persistence::SharedGateway;

pub struct TableStore {
    key: ModuleKey,
    gateway: SharedGateway,
    default_columns: ColumnList,
    dataset: Mutex<ModuleDataset>,
}

/// Fetches a module's dataset. An unknown key yields `([], [])` and nothing
/// is written until the first mutation.
pub async fn load(gateway: &SharedGateway, key: &ModuleKey) -> StoreResult<ModuleDataset> {
    let dataset = match gateway.get_module(key).await? {
        Some(snapshot) => logic::from_snapshot(snapshot),
        None => ModuleDataset::empty(),
    };
    info!(
        "Loaded module '{}': {} columns, {} rows.",
        key,
        dataset.columns.len(),
        dataset.rows.len()
    );
    Ok(dataset)
}

impl TableStore {
    pub async fn open(gateway: SharedGateway, key: ModuleKey, default_columns: ColumnList) -> StoreResult<Self> {
        let dataset = load(&gateway, &key).await?;
        Ok(Self {
            key,
            gateway,
            default_columns,
            dataset: Mutex::new(dataset),
        })
    }

    pub fn key(&self) -> &ModuleKey {
        &self.key
    }

    /// Copy of the current dataset.
    pub async fn snapshot(&self) -> ModuleDataset {
        self.dataset.lock().await.clone()
    }

    /// Appends decoded rows under fresh identities and extends the columns.
    /// A sheet without data rows is rejected and nothing is written.
    pub async fn import_merge(&self, decoded: &DecodedSheet) -> StoreResult<ModuleDataset> {
        if decoded.is_empty() {
            return Err(CodecError::NoData.into());
        }
        let mut current = self.dataset.lock().await;
        let next = logic::import_merge(&current, decoded);
        self.commit(&mut current, next, "import").await?;
        info!("Imported {} row(s) into '{}'.", decoded.rows.len(), self.key);
        Ok(current.clone())
    }

    /// Decodes an uploaded file off the async threads, then merges it.
    pub async fn import_file(&self, bytes: Vec<u8>, format: SpreadsheetFormat) -> StoreResult<ModuleDataset> {
        let decoded = codec::decode_async(bytes, format).await?;
        self.import_merge(&decoded).await
    }

    /// Creates a row, or edits the row `edit_id` when it exists. Returns the
    /// next dataset and the identity of the written row.
    pub async fn upsert_row(&self, form: Record, edit_id: Option<&RowId>) -> StoreResult<(ModuleDataset, RowId)> {
        let mut current = self.dataset.lock().await;
        let (next, id) = logic::upsert_row(&current, form, edit_id, &self.default_columns);
        self.commit(&mut current, next, "upsert").await?;
        Ok((current.clone(), id))
    }

    /// Removes the given rows. Ids that match nothing are ignored; the
    /// snapshot is written either way.
    pub async fn delete_rows(&self, ids: &HashSet<RowId>) -> StoreResult<ModuleDataset> {
        let mut current = self.dataset.lock().await;
        let (next, removed) = logic::delete_rows(&current, ids);
        self.commit(&mut current, next, "delete").await?;
        info!("Deleted {} row(s) from '{}'.", removed, self.key);
        Ok(current.clone())
    }

    /// Resets the module to `([], [])`.
    pub async fn clear_all(&self) -> StoreResult<ModuleDataset> {
        let mut current = self.dataset.lock().await;
        self.commit(&mut current, logic::clear_all(), "clear").await?;
        info!("Cleared all data of '{}'.", self.key);
        Ok(current.clone())
    }

    /// Encodes the current dataset as a workbook titled after the module
    /// unless `title` is given.
    pub async fn export(&self, title: Option<&str>) -> StoreResult<Vec<u8>> {
        let dataset = self.snapshot().await;
        if dataset.rows.is_empty() {
            return Err(CodecError::NoData.into());
        }
        let title = title.map(str::to_string).unwrap_or_else(|| self.key.title());
        let rows: Vec<RawRow> = dataset.rows.into_iter().map(RawRow::from).collect();
        let bytes = codec::encode_async(dataset.columns.as_slice().to_vec(), rows, title).await?;
        Ok(bytes)
    }

    /// Suggested file name for an export, e.g. `Inventory_Export.xlsx`.
    pub fn export_file_name(&self) -> String {
        format!("{}_Export.xlsx", self.key.title())
    }

    async fn commit(&self, current: &mut ModuleDataset, next: ModuleDataset, op: &str) -> StoreResult<()> {
        let snapshot = ModuleSnapshot::from(&next);
        if let Err(e) = self.gateway.put_module(&self.key, &snapshot).await {
            error!("Failed to persist {} on '{}': {}. State unchanged.", op, self.key, e);
            return Err(e.into());
        }
        *current = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryGateway, PersistenceGateway};
    use crate::records::definitions::{CellValue, Row};
    use std::sync::Arc;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::text(*v)))
            .collect()
    }

    async fn seeded_store() -> (Arc<MemoryGateway>, TableStore) {
        let memory = Arc::new(MemoryGateway::new());
        let key = ModuleKey::parse("hr").unwrap();
        let dataset = ModuleDataset {
            columns: ["Name", "Dept"].iter().collect(),
            rows: vec![Row::new(RowId::from("a"), record(&[("Name", "An"), ("Dept", "Sales")]))],
        };
        memory
            .put_module(&key, &ModuleSnapshot::from(&dataset))
            .await
            .unwrap();
        let gateway: SharedGateway = memory.clone();
        let store = TableStore::open(gateway, key, ColumnList::new()).await.unwrap();
        (memory, store)
    }

    #[tokio::test]
    async fn unknown_module_loads_empty_without_writing() {
        let memory = Arc::new(MemoryGateway::new());
        let gateway: SharedGateway = memory.clone();
        let store = TableStore::open(gateway, ModuleKey::parse("new").unwrap(), ColumnList::new())
            .await
            .unwrap();
        assert!(store.snapshot().await.is_empty());
        assert_eq!(memory.module_count().await, 0);
    }

    #[tokio::test]
    async fn upsert_persists_the_full_snapshot() {
        let (memory, store) = seeded_store().await;
        let (next, id) = store
            .upsert_row(record(&[("Name", "Binh"), ("Dept", "Ops")]), None)
            .await
            .unwrap();
        assert_eq!(next.rows.len(), 2);
        assert_eq!(next.rows[1].id, id);

        let stored = memory.get_module(store.key()).await.unwrap().unwrap();
        assert_eq!(stored, ModuleSnapshot::from(&next));
    }

    #[tokio::test]
    async fn empty_import_is_rejected() {
        let (_memory, store) = seeded_store().await;
        let err = store.import_merge(&DecodedSheet::default()).await.unwrap_err();
        assert!(matches!(err, crate::records::StoreError::Codec(CodecError::NoData)));
        assert_eq!(store.snapshot().await.rows.len(), 1);
    }

    #[tokio::test]
    async fn export_of_empty_module_reports_no_data() {
        let (_memory, store) = seeded_store().await;
        store.clear_all().await.unwrap();
        let err = store.export(None).await.unwrap_err();
        assert!(matches!(err, crate::records::StoreError::Codec(CodecError::NoData)));
        assert_eq!(store.export_file_name(), "Hr_Export.xlsx");
    }
}
