use std::{fs::File, io::Read, path::Path};

use bson::{Bson, Document};
use memberdir_db::models::member::fields;
use tracing::info;

use super::TransferResult;
use crate::dao::MemberBulkStore;
use crate::member::normalize::parse_date;
use crate::member::view::split_tags;

/// One CSV data row, as `(header, value)` pairs in column order.
pub type CsvRow = Vec<(String, String)>;

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Keep only rows with an avatar and either a bio or a headline.
    pub require_profile: bool,
    pub batch_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            require_profile: true,
            batch_size: super::DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub parsed: usize,
    pub kept: usize,
    pub inserted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Date,
    Flag,
    Count,
    Tags,
}

const KNOWN_COLUMNS: [(&str, ColumnKind); 23] = [
    (fields::FIRST_NAME, ColumnKind::Text),
    (fields::LAST_NAME, ColumnKind::Text),
    (fields::EMAIL, ColumnKind::Text),
    (fields::BIO, ColumnKind::Text),
    (fields::HEADLINE, ColumnKind::Text),
    (fields::LOCATION, ColumnKind::Text),
    (fields::TAGS, ColumnKind::Tags),
    (fields::JOIN_DATE, ColumnKind::Date),
    (fields::LAST_ACTIVE, ColumnKind::Date),
    (fields::INVITATION_DATE, ColumnKind::Date),
    (fields::ACTIVE, ColumnKind::Flag),
    (fields::EMAIL_MARKETING, ColumnKind::Flag),
    (fields::MEMBER, ColumnKind::Flag),
    (fields::PROFILE_URL, ColumnKind::Text),
    (fields::WEBSITE_URL, ColumnKind::Text),
    (fields::TWITTER_URL, ColumnKind::Text),
    (fields::FACEBOOK_URL, ColumnKind::Text),
    (fields::LINKEDIN_URL, ColumnKind::Text),
    (fields::INSTAGRAM_URL, ColumnKind::Text),
    (fields::POSTS, ColumnKind::Count),
    (fields::COMMENTS, ColumnKind::Count),
    (fields::LIKES_RECEIVED, ColumnKind::Count),
    (fields::AVATAR_URL, ColumnKind::Text),
];

/// Resolves a CSV header ("First Name", "FirstName", "first name") to its
/// storage field.
fn known_column(header: &str) -> Option<(&'static str, ColumnKind)> {
    let squashed: String = header.chars().filter(|c| !c.is_whitespace()).collect();
    KNOWN_COLUMNS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&squashed))
        .copied()
}

/// Reads every non-empty data row. The first line is the header.
pub fn read_rows<R: Read>(reader: R) -> TransferResult<Vec<CsvRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row: CsvRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.clone(), cell.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn column<'a>(row: &'a CsvRow, field: &str) -> &'a str {
    row.iter()
        .filter(|(header, _)| known_column(header).is_some_and(|(name, _)| name == field))
        .map(|(_, value)| value.trim())
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// Rows worth listing: an avatar plus some profile text.
pub fn has_profile(row: &CsvRow) -> bool {
    let avatar = column(row, fields::AVATAR_URL);
    let bio = column(row, fields::BIO);
    let headline = column(row, fields::HEADLINE);
    !avatar.is_empty() && (!bio.is_empty() || !headline.is_empty())
}

/// Lower-cased "first last", or the email when both names are blank.
pub fn derive_search_name(first: &str, last: &str, email: &str) -> String {
    let full = format!("{} {}", first.trim(), last.trim());
    let full = full.trim();
    if full.is_empty() {
        email.trim().to_lowercase()
    } else {
        full.to_lowercase()
    }
}

/// Builds the stored document for one row. Known columns are converted to
/// their stored types; values that do not convert, and unknown columns,
/// are kept as strings.
pub fn row_to_document(row: &CsvRow) -> Document {
    let mut doc = Document::new();

    for (header, raw) in row {
        let Some((field, kind)) = known_column(header) else {
            doc.insert(header.clone(), raw.clone());
            continue;
        };
        let value = raw.trim();

        // Duplicate spellings of a column: first non-empty value wins.
        if doc.contains_key(field) && value.is_empty() {
            continue;
        }
        if let Some(existing) = doc.get(field) {
            if !matches!(existing, Bson::String(s) if s.is_empty()) {
                continue;
            }
        }

        let converted = match kind {
            ColumnKind::Text => Some(Bson::String(value.to_string())),
            ColumnKind::Tags => Some(Bson::Array(
                split_tags(value).into_iter().map(Bson::String).collect(),
            )),
            ColumnKind::Date if value.is_empty() => None,
            ColumnKind::Date => Some(
                parse_date(value)
                    .map(|dt| Bson::DateTime(bson::DateTime::from_chrono(dt)))
                    .unwrap_or_else(|| Bson::String(value.to_string())),
            ),
            ColumnKind::Flag => Some(
                parse_flag(value)
                    .map(Bson::Boolean)
                    .unwrap_or_else(|| Bson::String(value.to_string())),
            ),
            ColumnKind::Count if value.is_empty() => None,
            ColumnKind::Count => Some(
                parse_count(value)
                    .map(Bson::Int64)
                    .unwrap_or_else(|| Bson::String(value.to_string())),
            ),
        };

        if let Some(converted) = converted {
            doc.insert(field, converted);
        }
    }

    let search_name = derive_search_name(
        column(row, fields::FIRST_NAME),
        column(row, fields::LAST_NAME),
        column(row, fields::EMAIL),
    );
    doc.insert(fields::SEARCH_NAME, search_name);
    doc
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

fn parse_count(raw: &str) -> Option<i64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    if let Ok(value) = cleaned.parse::<i64>() {
        return Some(value.max(0));
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0).trunc() as i64)
}

/// Writes documents in fixed-size batches. A failed batch aborts the run;
/// batches already written stay written.
pub async fn insert_in_batches(
    store: &dyn MemberBulkStore,
    docs: Vec<Document>,
    batch_size: usize,
) -> TransferResult<usize> {
    let total = docs.len();
    let batch_size = batch_size.max(1);
    let mut inserted = 0;

    let mut remaining = docs.into_iter().peekable();
    while remaining.peek().is_some() {
        let batch: Vec<Document> = remaining.by_ref().take(batch_size).collect();
        inserted += store.insert_batch(batch).await?;
        info!(inserted, total, "Uploaded batch");
    }

    Ok(inserted)
}

/// Parses `reader`, filters and converts rows, and writes them to `store`.
pub async fn import_members<R: Read>(
    store: &dyn MemberBulkStore,
    reader: R,
    options: ImportOptions,
) -> TransferResult<ImportSummary> {
    let rows = read_rows(reader)?;
    let parsed = rows.len();
    info!(parsed, "Parsed CSV records");

    let kept: Vec<&CsvRow> = if options.require_profile {
        rows.iter().filter(|row| has_profile(row)).collect()
    } else {
        rows.iter().collect()
    };
    info!(kept = kept.len(), "Rows selected for import");

    let docs: Vec<Document> = kept.iter().map(|row| row_to_document(row)).collect();
    let kept = docs.len();
    let inserted = insert_in_batches(store, docs, options.batch_size).await?;

    Ok(ImportSummary {
        parsed,
        kept,
        inserted,
    })
}

pub async fn import_csv_file(
    store: &dyn MemberBulkStore,
    path: &Path,
    options: ImportOptions,
) -> TransferResult<ImportSummary> {
    let file = File::open(path)?;
    import_members(store, file, options).await
}
