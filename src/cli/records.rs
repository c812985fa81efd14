// src/cli/records.rs
use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::records::{CellValue, ColumnList, ModuleDataset, Record, Row, RowId, SearchView, TableStore};

/// Turns `NAME=VALUE` pairs into a form record. Values stay text; a blank
/// value clears the cell.
pub fn form_from_fields(fields: Vec<(String, String)>) -> Record {
    fields
        .into_iter()
        .map(|(name, value)| (name, CellValue::from_input(&value)))
        .collect()
}

pub async fn list(store: &TableStore, query: &str, show_ids: bool) -> Result<()> {
    let dataset = store.snapshot().await;
    if dataset.columns.is_empty() {
        println!("Module '{}' has no data yet.", store.key());
        return Ok(());
    }
    let mut view = SearchView::new(&dataset);
    view.set_query(query, &dataset);
    let rows = visible_rows(&dataset, &view);

    print!("{}", render_table(&dataset.columns, &rows, show_ids));
    println!("{} of {} row(s)", rows.len(), dataset.rows.len());
    Ok(())
}

pub async fn columns(store: &TableStore) -> Result<()> {
    let dataset = store.snapshot().await;
    for (idx, column) in dataset.columns.iter().enumerate() {
        println!("{:<4} {}", idx, column);
    }
    Ok(())
}

pub async fn upsert(store: &TableStore, fields: Vec<(String, String)>, edit_id: Option<String>) -> Result<()> {
    let edit_id = edit_id.map(RowId::new);
    let existed = match &edit_id {
        Some(id) => store.snapshot().await.row(id).is_some(),
        None => false,
    };
    let (_, id) = store.upsert_row(form_from_fields(fields), edit_id.as_ref()).await?;
    if existed {
        println!("Updated row {}", id);
    } else {
        println!("Created row {}", id);
    }
    Ok(())
}

pub async fn delete(store: &TableStore, ids: Vec<String>) -> Result<()> {
    let ids: HashSet<RowId> = ids.into_iter().map(RowId::new).collect();
    let before = store.snapshot().await.rows.len();
    let after = store.delete_rows(&ids).await?.rows.len();
    println!("Deleted {} row(s).", before - after);
    Ok(())
}

/// Selects every row the query shows, then deletes the selection. A blank
/// query would show every row, so it is refused.
pub async fn delete_matching(store: &TableStore, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        bail!("--matching needs non-blank text; use `clear --yes` to remove every row.");
    }
    let dataset = store.snapshot().await;
    let mut view = SearchView::new(&dataset);
    view.set_query(query, &dataset);
    view.toggle_all();
    if view.selection().is_empty() {
        println!("No rows match '{}'.", query);
        return Ok(());
    }
    let next = store.delete_rows(view.selection().ids()).await?;
    println!("Deleted {} row(s).", dataset.rows.len() - next.rows.len());
    Ok(())
}

pub async fn clear(store: &TableStore) -> Result<()> {
    store.clear_all().await?;
    println!("Cleared module '{}'.", store.key());
    Ok(())
}

fn cell_text(row: &Row, column: &str) -> String {
    row.get(column)
        .and_then(CellValue::display_text)
        .unwrap_or_default()
}

/// Fixed-width text table, one line per row.
pub fn render_table(columns: &ColumnList, rows: &[&Row], show_ids: bool) -> String {
    let mut headers: Vec<&str> = Vec::with_capacity(columns.len() + 1);
    if show_ids {
        headers.push("id");
    }
    headers.extend(columns.iter().map(String::as_str));

    let lines: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut line = Vec::with_capacity(headers.len());
            if show_ids {
                line.push(row.id.to_string());
            }
            line.extend(columns.iter().map(|c| cell_text(row, c)));
            line
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            lines
                .iter()
                .map(|l| l[i].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = padded_line(&headers, &widths);
    let rule = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule));
    out.push('\n');
    for line in &lines {
        out.push_str(&padded_line(line, &widths));
    }
    out
}

fn padded_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

/// Rows of `dataset` the view currently shows, in dataset order.
pub fn visible_rows<'a>(dataset: &'a ModuleDataset, view: &SearchView) -> Vec<&'a Row> {
    view.visible().iter().filter_map(|id| dataset.row(id)).collect()
}
