use bson::{Document, doc};
use memberdir_db::models::member::fields;

use super::normalize::{SortField, SortOrder};
use super::params::MemberListParams;

/// Appended to a search term to form the exclusive upper bound of a prefix
/// range. Sorts after every character expected in a name.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Filter half of a members query. Also the input of the count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    pub active: Option<bool>,
    /// Lower-cased prefix matched against `searchName`.
    pub search_prefix: Option<String>,
}

impl MemberFilter {
    pub fn new(active: Option<bool>, search: Option<&str>) -> Self {
        Self {
            active,
            search_prefix: search.map(str::to_lowercase),
        }
    }

    /// Half-open `[prefix, prefix + U+F8FF)` bounds of the search range.
    pub fn search_range(&self) -> Option<(String, String)> {
        self.search_prefix.as_ref().map(|prefix| {
            let mut upper = prefix.clone();
            upper.push(PREFIX_SENTINEL);
            (prefix.clone(), upper)
        })
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(active) = self.active {
            filter.insert(fields::ACTIVE, active);
        }
        if let Some((lower, upper)) = self.search_range() {
            filter.insert(fields::SEARCH_NAME, doc! { "$gte": lower, "$lt": upper });
        }
        filter
    }
}

/// Full description of one page of the members listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberQuery {
    pub filter: MemberFilter,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub skip: u64,
    pub limit: u32,
}

impl MemberQuery {
    pub fn from_params(params: &MemberListParams) -> Self {
        Self {
            filter: MemberFilter::new(params.active, params.search.as_deref()),
            sort_field: params.sort_by,
            sort_order: params.sort_order,
            skip: params.offset,
            limit: params.limit,
        }
    }

    /// Single-field ordering with `_id` as tie-break in the same direction,
    /// so equal sort keys page deterministically.
    pub fn sort_document(&self) -> Document {
        let direction = self.sort_order.direction();
        let mut sort = Document::new();
        sort.insert(self.sort_field.storage_field(), direction);
        sort.insert(fields::ID, direction);
        sort
    }
}
