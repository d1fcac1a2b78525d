use std::cmp::Ordering;

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use memberdir_db::models::{MemberRecord, member::fields};
use parking_lot::RwLock;

use super::base::{DaoError, DaoResult};
use super::member::{MemberBulkStore, MemberStore};
use crate::member::query::{MemberFilter, MemberQuery};

/// Process-local members collection. Evaluates filters and ordering the
/// way MongoDB does for the handful of operators the listing uses. It has
/// no native count, so counts go through the unpaginated-fetch fallback.
#[derive(Default)]
pub struct MemoryMemberStore {
    docs: RwLock<Vec<Document>>,
    unavailable: bool,
}

impl MemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(docs: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.docs.write();
            guard.extend(docs.into_iter().map(with_id));
        }
        store
    }

    /// A store whose every operation fails, as if the database were down.
    pub fn unavailable() -> Self {
        Self {
            docs: RwLock::default(),
            unavailable: true,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    fn ensure_available(&self) -> DaoResult<()> {
        if self.unavailable {
            return Err(DaoError::Unavailable("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn matching(&self, filter: &MemberFilter) -> Vec<Document> {
        self.docs
            .read()
            .iter()
            .filter(|doc| matches_filter(doc, filter))
            .cloned()
            .collect()
    }
}

fn with_id(mut doc: Document) -> Document {
    if !doc.contains_key(fields::ID) {
        doc.insert(fields::ID, ObjectId::new());
    }
    doc
}

fn matches_filter(doc: &Document, filter: &MemberFilter) -> bool {
    if let Some(active) = filter.active {
        if doc.get(fields::ACTIVE) != Some(&Bson::Boolean(active)) {
            return false;
        }
    }
    if let Some((lower, upper)) = filter.search_range() {
        match doc.get(fields::SEARCH_NAME) {
            Some(Bson::String(name)) => {
                if name.as_str() < lower.as_str() || name.as_str() >= upper.as_str() {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

/// MongoDB's cross-type sort order, restricted to the types members hold.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) | Some(Bson::Undefined) => 0,
        Some(Bson::Int32(_)) | Some(Bson::Int64(_)) | Some(Bson::Double(_)) => 1,
        Some(Bson::String(_)) | Some(Bson::Symbol(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::ObjectId(_)) => 5,
        Some(Bson::Boolean(_)) => 6,
        Some(Bson::DateTime(_)) => 7,
        Some(Bson::Timestamp(_)) => 8,
        Some(_) => 9,
    }
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn compare_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Bson::String(x)), Some(Bson::String(y))) => x.cmp(y),
        (Some(Bson::DateTime(x)), Some(Bson::DateTime(y))) => x.cmp(y),
        (Some(Bson::Boolean(x)), Some(Bson::Boolean(y))) => x.cmp(y),
        (Some(Bson::ObjectId(x)), Some(Bson::ObjectId(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (numeric(x), numeric(y)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl MemberStore for MemoryMemberStore {
    async fn find_page(&self, query: &MemberQuery) -> DaoResult<Vec<MemberRecord>> {
        self.ensure_available()?;

        let mut docs = self.matching(&query.filter);
        let field = query.sort_field.storage_field();
        docs.sort_by(|a, b| {
            compare_values(a.get(field), b.get(field))
                .then_with(|| compare_values(a.get(fields::ID), b.get(fields::ID)))
        });
        if query.sort_order.direction() < 0 {
            docs.reverse();
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        Ok(docs
            .into_iter()
            .skip(skip)
            .take(query.limit as usize)
            .map(MemberRecord::from_document)
            .collect())
    }

    async fn find_matching(&self, filter: &MemberFilter) -> DaoResult<Vec<MemberRecord>> {
        self.ensure_available()?;
        Ok(self
            .matching(filter)
            .into_iter()
            .map(MemberRecord::from_document)
            .collect())
    }
}

#[async_trait]
impl MemberBulkStore for MemoryMemberStore {
    async fn insert_batch(&self, docs: Vec<Document>) -> DaoResult<usize> {
        self.ensure_available()?;
        let count = docs.len();
        self.docs.write().extend(docs.into_iter().map(with_id));
        Ok(count)
    }

    async fn fetch_all(&self) -> DaoResult<Vec<MemberRecord>> {
        self.ensure_available()?;
        let mut docs = self.docs.read().clone();
        docs.sort_by(|a, b| compare_values(a.get(fields::ID), b.get(fields::ID)));
        Ok(docs.into_iter().map(MemberRecord::from_document).collect())
    }

    async fn delete_batch(&self, limit: usize) -> DaoResult<u64> {
        self.ensure_available()?;
        let mut docs = self.docs.write();
        let take = limit.min(docs.len());
        docs.drain(..take);
        Ok(take as u64)
    }
}
