// tests/store_flow.rs
// End-to-end behaviour of the table store over in-memory and failing storage.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use recorddesk::attendance::AttendanceSnapshot;
use recorddesk::persistence::{
    MemoryGateway, PersistenceError, PersistenceGateway, PersistenceResult, SharedGateway,
};
use recorddesk::records::codec;
use recorddesk::records::search::filter;
use recorddesk::records::{
    CellValue, ColumnList, DecodedSheet, ModuleDataset, ModuleKey, ModuleSnapshot, RawRow, Record,
    RowId, SearchView, SpreadsheetFormat, StoreError, TableStore,
};

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), CellValue::text(*v)))
        .collect()
}

fn name_dept_snapshot() -> ModuleSnapshot {
    let mut row = RawRow::from_values(record(&[("Name", "An"), ("Dept", "Sales")]));
    row.id = Some(RowId::from("a"));
    ModuleSnapshot {
        columns: ["Name", "Dept"].iter().collect(),
        rows: vec![row],
    }
}

async fn seeded(key: &str) -> (Arc<MemoryGateway>, TableStore) {
    let memory = Arc::new(MemoryGateway::new());
    let key = ModuleKey::parse(key).unwrap();
    memory.put_module(&key, &name_dept_snapshot()).await.unwrap();
    let gateway: SharedGateway = memory.clone();
    let store = TableStore::open(gateway, key, ColumnList::new()).await.unwrap();
    (memory, store)
}

/// Wraps a memory gateway and rejects writes while `failing` is set.
#[derive(Default)]
struct FlakyGateway {
    inner: MemoryGateway,
    failing: AtomicBool,
    writes: AtomicUsize,
}

#[async_trait]
impl PersistenceGateway for FlakyGateway {
    async fn get_module(&self, key: &ModuleKey) -> PersistenceResult<Option<ModuleSnapshot>> {
        self.inner.get_module(key).await
    }

    async fn put_module(&self, key: &ModuleKey, snapshot: &ModuleSnapshot) -> PersistenceResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("storage offline".into()));
        }
        self.inner.put_module(key, snapshot).await
    }

    async fn get_attendance(&self) -> PersistenceResult<Option<AttendanceSnapshot>> {
        self.inner.get_attendance().await
    }

    async fn put_attendance(&self, snapshot: &AttendanceSnapshot) -> PersistenceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("storage offline".into()));
        }
        self.inner.put_attendance(snapshot).await
    }
}

#[tokio::test]
async fn upsert_scenario_appends_with_new_identity() {
    let (_memory, store) = seeded("hr").await;
    let (next, id) = store
        .upsert_row(record(&[("Name", "Binh"), ("Dept", "Ops")]), None)
        .await
        .unwrap();

    assert_eq!(next.rows.len(), 2);
    assert_eq!(next.rows[1].id, id);
    assert_ne!(id, RowId::from("a"));
    assert_eq!(next.columns.as_slice(), &["Name", "Dept"]);

    let hits = filter(&next.rows, &next.columns, "an");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, RowId::from("a"));
}

#[tokio::test]
async fn clear_all_persists_the_empty_snapshot() {
    let (memory, store) = seeded("hr").await;
    let cleared = store.clear_all().await.unwrap();
    assert!(cleared.is_empty());

    let stored = memory.get_module(store.key()).await.unwrap().unwrap();
    assert_eq!(stored, ModuleSnapshot::default());
    assert_eq!(serde_json::to_string(&stored).unwrap(), r#"{"headers":[],"data":[]}"#);
}

#[tokio::test]
async fn importing_twice_doubles_rows_and_keeps_columns() {
    let (memory, store) = seeded("inventory").await;
    let sheet = DecodedSheet {
        columns: vec!["Name".into(), "Qty".into()],
        rows: vec![
            RawRow::from_values(record(&[("Name", "Bolt"), ("Qty", "3")])),
            RawRow::from_values(record(&[("Name", "Nut")])),
        ],
    };

    let once = store.import_merge(&sheet).await.unwrap();
    assert_eq!(once.rows.len(), 3);
    assert_eq!(once.columns.as_slice(), &["Name", "Dept", "Qty"]);

    let twice = store.import_merge(&sheet).await.unwrap();
    assert_eq!(twice.rows.len(), 5);
    assert_eq!(twice.columns, once.columns);

    let ids: HashSet<_> = twice.row_ids().collect();
    assert_eq!(ids.len(), 5);

    let stored = memory.get_module(store.key()).await.unwrap().unwrap();
    assert_eq!(stored, ModuleSnapshot::from(&twice));
}

#[tokio::test]
async fn deleting_a_selected_row_drops_it_from_the_selection() {
    let (_memory, store) = seeded("hr").await;
    let (dataset, binh) = store
        .upsert_row(record(&[("Name", "Binh"), ("Dept", "Ops")]), None)
        .await
        .unwrap();

    let mut view = SearchView::new(&dataset);
    view.toggle_all();
    assert!(view.all_selected());

    let doomed: HashSet<RowId> = [binh.clone()].into_iter().collect();
    let next = store.delete_rows(&doomed).await.unwrap();
    view.refresh(&next);

    assert_eq!(next.rows.len(), 1);
    assert!(!view.selection().contains(&binh));
    assert_eq!(view.selection().len(), 1);
    assert!(view.all_selected());
}

#[tokio::test]
async fn failed_write_leaves_state_unchanged() {
    let flaky = Arc::new(FlakyGateway::default());
    let key = ModuleKey::parse("hr").unwrap();
    flaky.inner.put_module(&key, &name_dept_snapshot()).await.unwrap();
    let gateway: SharedGateway = flaky.clone();
    let store = TableStore::open(gateway, key, ColumnList::new()).await.unwrap();
    let before = store.snapshot().await;

    flaky.failing.store(true, Ordering::SeqCst);
    let err = store
        .upsert_row(record(&[("Name", "Binh"), ("Extra", "x")]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Persistence(PersistenceError::Unavailable(_))));
    assert!(store.clear_all().await.is_err());
    assert_eq!(store.snapshot().await, before);

    let sheet = DecodedSheet {
        columns: vec!["Name".into(), "Qty".into()],
        rows: vec![RawRow::from_values(record(&[("Name", "Bolt"), ("Qty", "3")]))],
    };
    let err = store.import_merge(&sheet).await.unwrap_err();
    assert!(matches!(err, StoreError::Persistence(PersistenceError::Unavailable(_))));
    assert_eq!(store.snapshot().await, before);

    let doomed: HashSet<RowId> = [RowId::from("a")].into_iter().collect();
    assert!(store.delete_rows(&doomed).await.is_err());
    assert_eq!(store.snapshot().await, before);

    let stored = flaky.inner.get_module(store.key()).await.unwrap().unwrap();
    assert_eq!(stored, name_dept_snapshot());

    flaky.failing.store(false, Ordering::SeqCst);
    let (after, _) = store
        .upsert_row(record(&[("Name", "Binh")]), None)
        .await
        .unwrap();
    assert_eq!(after.rows.len(), 2);
    assert_eq!(after.columns, before.columns);
    assert_eq!(flaky.writes.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn concurrent_creates_are_all_kept() {
    let memory = Arc::new(MemoryGateway::new());
    let gateway: SharedGateway = memory.clone();
    let defaults: ColumnList = ["ID", "Name"].iter().collect();
    let store = Arc::new(
        TableStore::open(gateway, ModuleKey::parse("tasks").unwrap(), defaults)
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for n in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let name = format!("task {}", n);
            store.upsert_row(record(&[("Name", name.as_str())]), None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = memory.get_module(store.key()).await.unwrap().unwrap();
    assert_eq!(stored.rows.len(), 20);
    assert_eq!(stored.columns.as_slice(), &["ID", "Name"]);
}

#[tokio::test]
async fn workbook_export_imports_back_into_a_fresh_module() {
    let (_memory, store) = seeded("inventory").await;
    store
        .upsert_row(
            [
                ("Name".to_string(), CellValue::text("Bolt")),
                ("Qty".to_string(), CellValue::Number(12.0)),
            ]
            .into_iter()
            .collect(),
            None,
        )
        .await
        .unwrap();
    let source = store.snapshot().await;
    let bytes = store.export(None).await.unwrap();

    let decoded = codec::decode_async(bytes.clone(), SpreadsheetFormat::Workbook)
        .await
        .unwrap();
    assert_eq!(decoded.columns, source.columns.as_slice());
    assert_eq!(decoded.rows.len(), 2);
    assert!(decoded.rows.iter().all(|r| r.id.is_none()));
    assert_eq!(decoded.rows[1].values["Qty"], CellValue::Number(12.0));

    let memory = Arc::new(MemoryGateway::new());
    let gateway: SharedGateway = memory.clone();
    let copy = TableStore::open(gateway, ModuleKey::parse("copy").unwrap(), ColumnList::new())
        .await
        .unwrap();
    let imported: ModuleDataset = copy
        .import_file(bytes, SpreadsheetFormat::Workbook)
        .await
        .unwrap();
    assert_eq!(imported.columns, source.columns);
    // Blank cells come back as explicit empties.
    let filled: Record = imported.rows[0]
        .values
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    assert_eq!(filled, source.rows[0].values);
    assert_eq!(imported.rows[0].values["Qty"], CellValue::Empty);
}

#[tokio::test]
async fn csv_import_skips_identity_column() {
    let memory = Arc::new(MemoryGateway::new());
    let gateway: SharedGateway = memory.clone();
    let store = TableStore::open(gateway, ModuleKey::parse("people").unwrap(), ColumnList::new())
        .await
        .unwrap();
    let csv = b"_id,Name,Age\nzzz,An,31\n,,\nx,Binh,\n".to_vec();

    let dataset = store.import_file(csv, SpreadsheetFormat::Csv).await.unwrap();
    assert_eq!(dataset.columns.as_slice(), &["Name", "Age"]);
    assert_eq!(dataset.rows.len(), 3);
    assert!(dataset.row(&RowId::from("zzz")).is_none());
    assert_eq!(dataset.rows[0].values["Age"], CellValue::Number(31.0));
    assert!(dataset.rows[1].values.values().all(CellValue::is_empty));
    assert_eq!(dataset.rows[2].values["Name"], CellValue::text("Binh"));
}
