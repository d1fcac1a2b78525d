use std::{
    collections::HashSet,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use bson::Bson;
use chrono::{DateTime, Utc};
use memberdir_db::models::MemberRecord;
use serde_json::{Map, Value};
use tracing::info;

use super::TransferResult;
use crate::dao::MemberBulkStore;
use crate::member::normalize::{format_timestamp, native_timestamp_of};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFiles {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub count: usize,
}

/// Flattens one document for export: `id` first, timestamps as canonical
/// strings, arrays joined with `", "`.
pub fn flatten_record(record: &MemberRecord) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("id".to_string(), Value::String(record.id.clone()));
    for (key, value) in &record.fields {
        row.insert(key.clone(), export_value(value));
    }
    row
}

fn export_value(value: &Bson) -> Value {
    if let Some(dt) = native_timestamp_of(value) {
        return Value::String(format_timestamp(dt));
    }
    match value {
        Bson::Array(items) => Value::String(
            items
                .iter()
                .map(|item| cell_text(&export_value(item)))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(v) => Value::from(*v),
        Bson::Int64(v) => Value::from(*v),
        Bson::Double(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Null | Bson::Undefined => Value::Null,
        other => other.clone().into_relaxed_extjson(),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Union of all keys, in first-seen order.
fn csv_headers(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if seen.insert(key.as_str()) {
            headers.push(key.clone());
        }
    }
    headers
}

/// `2024-01-01T10:20:30.000Z` becomes `2024-01-01T10-20-30-000Z`.
pub fn file_stamp(now: DateTime<Utc>) -> String {
    format_timestamp(now).replace([':', '.'], "-")
}

fn write_json(path: &Path, rows: &[Map<String, Value>]) -> TransferResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, rows)?;
    Ok(())
}

fn write_csv(path: &Path, rows: &[Map<String, Value>]) -> TransferResult<()> {
    let headers = csv_headers(rows);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&headers)?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|header| row.get(header).map(cell_text).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Dumps the whole collection to `<collection>_export_<stamp>.json` and
/// `.csv` in `out_dir`. Nothing is written for an empty collection.
pub async fn export_collection(
    store: &dyn MemberBulkStore,
    collection: &str,
    out_dir: &Path,
    now: DateTime<Utc>,
) -> TransferResult<Option<ExportFiles>> {
    let records = store.fetch_all().await?;
    if records.is_empty() {
        info!(collection, "No documents found in collection");
        return Ok(None);
    }
    info!(count = records.len(), collection, "Exporting documents");

    let rows: Vec<Map<String, Value>> = records.iter().map(flatten_record).collect();
    let stamp = file_stamp(now);

    let json = out_dir.join(format!("{collection}_export_{stamp}.json"));
    write_json(&json, &rows)?;
    info!(path = %json.display(), "JSON export saved");

    let csv = out_dir.join(format!("{collection}_export_{stamp}.csv"));
    write_csv(&csv, &rows)?;
    info!(path = %csv.display(), "CSV export saved");

    Ok(Some(ExportFiles {
        json,
        csv,
        count: rows.len(),
    }))
}
