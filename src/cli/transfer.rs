// src/cli/transfer.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::records::{SpreadsheetFormat, TableStore};

pub async fn import(store: &TableStore, file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let before = store.snapshot().await;
    let format = SpreadsheetFormat::from_path(file);
    info!("Importing {} as {:?} into '{}'.", file.display(), format, store.key());

    let after = store
        .import_file(bytes, format)
        .await
        .with_context(|| format!("Import of {} failed", file.display()))?;

    println!(
        "Imported {} row(s); module now has {} column(s) ({} new).",
        after.rows.len() - before.rows.len(),
        after.columns.len(),
        after.columns.len() - before.columns.len()
    );
    Ok(())
}

pub async fn export(store: &TableStore, output: Option<PathBuf>, title: Option<&str>) -> Result<()> {
    let bytes = store.export(title).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(store.export_file_name()));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
