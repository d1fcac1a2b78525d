use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;
use validator::Validate;

use super::normalize::{SortField, SortOrder};

pub const DEFAULT_LIMIT: u32 = 10;

const LIMIT_MESSAGE: &str = "Limit must be an integer between 1 and 100";
const OFFSET_MESSAGE: &str = "Offset must be a non-negative integer";
const PAGE_MESSAGE: &str = "Page parameter must be greater than 0";
const PAGE_RANGE_MESSAGE: &str = "Page parameter is too large for the requested limit";
const ACTIVE_MESSAGE: &str = "Active must be true or false";

/// One rejected query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

impl FieldIssue {
    fn new(field: &str, value: Option<&String>, message: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.cloned(),
            message: message.to_string(),
        }
    }
}

/// Validated parameters of a members listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberListParams {
    pub limit: u32,
    pub offset: u64,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for MemberListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            active: None,
            search: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// Numeric and text parameters after string coercion, before range checks.
#[derive(Debug, Default, Validate)]
struct CoercedParams {
    #[validate(range(min = 1, max = 100, message = "Limit must be an integer between 1 and 100"))]
    limit: Option<i64>,
    #[validate(range(min = 0, message = "Offset must be a non-negative integer"))]
    offset: Option<i64>,
    #[validate(range(min = 1, message = "Page parameter must be greater than 0"))]
    page: Option<i64>,
    #[validate(length(min = 1, message = "Search parameter cannot be empty"))]
    search: Option<String>,
}

impl MemberListParams {
    /// Coerces raw query-string values. Every failing parameter is reported,
    /// ordered by parameter name. Unknown parameters are ignored.
    pub fn from_query(raw: &HashMap<String, String>) -> Result<Self, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let mut coerced = CoercedParams::default();

        coerced.limit = parse_integer(raw, "limit", LIMIT_MESSAGE, &mut issues);
        coerced.offset = parse_integer(raw, "offset", OFFSET_MESSAGE, &mut issues);
        coerced.page = parse_integer(raw, "page", PAGE_MESSAGE, &mut issues);
        coerced.search = raw.get("search").map(|s| s.trim().to_string());

        let active = match raw.get("active") {
            None => None,
            Some(value) => match parse_bool(value) {
                Some(flag) => Some(flag),
                None => {
                    issues.push(FieldIssue::new("active", Some(value), ACTIVE_MESSAGE));
                    None
                }
            },
        };

        if let Err(errors) = coerced.validate() {
            for (field, field_errors) in errors.field_errors() {
                let field = field.to_string();
                for error in field_errors.iter() {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    issues.push(FieldIssue::new(&field, raw.get(&field), &message));
                }
            }
        }

        if !issues.is_empty() {
            issues.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
            return Err(issues);
        }

        let sort_by = match raw.get("sortBy") {
            None => SortField::default(),
            Some(name) => SortField::parse(name).unwrap_or_else(|| {
                warn!(sort_by = %name, "Unknown sort field, ordering by joinDate");
                SortField::default()
            }),
        };
        let sort_order = raw
            .get("sortOrder")
            .map(|order| SortOrder::parse_lenient(order))
            .unwrap_or_default();

        // Range checks above guarantee these conversions.
        let limit = coerced.limit.map_or(DEFAULT_LIMIT, |v| v as u32);
        let offset = match (coerced.offset, coerced.page) {
            (Some(offset), _) => offset as u64,
            (None, Some(page)) => page_offset(page, limit).ok_or_else(|| {
                vec![FieldIssue::new("page", raw.get("page"), PAGE_RANGE_MESSAGE)]
            })?,
            (None, None) => 0,
        };

        Ok(Self {
            limit,
            offset,
            active,
            search: coerced.search,
            sort_by,
            sort_order,
        })
    }
}

/// Offset of the first row on `page`. `None` when it would not fit the
/// store's signed 64-bit skip.
fn page_offset(page: i64, limit: u32) -> Option<u64> {
    let offset = (page - 1).checked_mul(i64::from(limit))?;
    u64::try_from(offset).ok()
}

fn parse_integer(
    raw: &HashMap<String, String>,
    field: &str,
    message: &str,
    issues: &mut Vec<FieldIssue>,
) -> Option<i64> {
    let value = raw.get(field)?;
    match value.trim().parse::<i64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            issues.push(FieldIssue::new(field, Some(value), message));
            None
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
