use bson::{Bson, Document};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use memberdir_db::models::member::fields;

/// Canonical wire format for every date the API emits:
/// `2024-01-01T00:00:00.000Z`.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Converts a stored timestamp into its canonical string, or `None` when the
/// value is absent or not recognisably a point in time.
pub fn normalize_timestamp(value: Option<&Bson>) -> Option<String> {
    timestamp_of(value?).map(format_timestamp)
}

/// Resolves the stored shapes that denote a timestamp: BSON datetimes and
/// timestamps, RFC 3339 strings, and `{ _seconds, _nanoseconds }`
/// documents left behind by Firestore JSON exports.
pub fn timestamp_of(value: &Bson) -> Option<DateTime<Utc>> {
    match value {
        Bson::DateTime(dt) => Some(dt.to_chrono()),
        Bson::Timestamp(ts) => DateTime::from_timestamp(i64::from(ts.time), 0),
        Bson::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Bson::Document(doc) => exported_timestamp(doc),
        _ => None,
    }
}

/// Like [`timestamp_of`] but ignores strings. Used where a string must be
/// passed through untouched.
pub fn native_timestamp_of(value: &Bson) -> Option<DateTime<Utc>> {
    match value {
        Bson::String(_) => None,
        other => timestamp_of(other),
    }
}

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parses the date spellings found in member CSV exports. Naive values are
/// taken as UTC. Only the import path is this lenient.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn exported_timestamp(doc: &Document) -> Option<DateTime<Utc>> {
    let seconds = integer_of(doc.get("_seconds")?)?;
    let nanos = doc.get("_nanoseconds").and_then(integer_of).unwrap_or(0);
    let nanos = u32::try_from(nanos).ok()?;
    DateTime::from_timestamp(seconds, nanos)
}

fn integer_of(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.is_finite() => Some(v.trunc() as i64),
        _ => None,
    }
}

/// Public sort keys accepted by the members listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    JoinDate,
    LastActive,
    FirstName,
    LastName,
    Email,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::JoinDate,
        SortField::LastActive,
        SortField::FirstName,
        SortField::LastName,
        SortField::Email,
    ];

    /// Exact match on the public name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.public_name() == name)
    }

    pub fn public_name(self) -> &'static str {
        match self {
            SortField::JoinDate => "joinDate",
            SortField::LastActive => "lastActive",
            SortField::FirstName => "firstName",
            SortField::LastName => "lastName",
            SortField::Email => "email",
        }
    }

    pub fn storage_field(self) -> &'static str {
        match self {
            SortField::JoinDate => fields::JOIN_DATE,
            SortField::LastActive => fields::LAST_ACTIVE,
            SortField::FirstName => fields::FIRST_NAME,
            SortField::LastName => fields::LAST_NAME,
            SortField::Email => fields::EMAIL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Anything other than `asc`/`desc` means `desc`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// MongoDB sort direction.
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}
