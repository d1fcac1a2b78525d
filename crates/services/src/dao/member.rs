use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::Database;
use memberdir_db::models::{MemberRecord, member::fields};
use tracing::debug;

use super::base::{BaseDao, DaoResult};
use crate::member::query::{MemberFilter, MemberQuery};

/// Read side of the members collection, as used by the listing endpoint.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// One sorted, paginated window of matching members.
    async fn find_page(&self, query: &MemberQuery) -> DaoResult<Vec<MemberRecord>>;

    /// Every matching member, unpaginated.
    async fn find_matching(&self, filter: &MemberFilter) -> DaoResult<Vec<MemberRecord>>;

    /// Number of members matching `filter`, independent of any page window.
    /// Stores without a native count fall back to counting an unpaginated
    /// fetch of the same filter.
    async fn count_matching(&self, filter: &MemberFilter) -> DaoResult<u64> {
        Ok(self.find_matching(filter).await?.len() as u64)
    }
}

/// Whole-collection operations used by the import/export/clear tools.
#[async_trait]
pub trait MemberBulkStore: Send + Sync {
    async fn insert_batch(&self, docs: Vec<Document>) -> DaoResult<usize>;

    /// Every document, in `_id` order.
    async fn fetch_all(&self) -> DaoResult<Vec<MemberRecord>>;

    /// Deletes up to `limit` documents and reports how many were removed.
    async fn delete_batch(&self, limit: usize) -> DaoResult<u64>;
}

pub struct MemberDao {
    pub base: BaseDao<Document>,
}

impl MemberDao {
    pub fn new(db: &Database, collection: &str) -> Self {
        Self {
            base: BaseDao::new(db, collection),
        }
    }
}

#[async_trait]
impl MemberStore for MemberDao {
    async fn find_page(&self, query: &MemberQuery) -> DaoResult<Vec<MemberRecord>> {
        let docs = self
            .base
            .find_window(
                query.filter.to_document(),
                query.sort_document(),
                query.skip,
                i64::from(query.limit),
            )
            .await?;
        Ok(docs.into_iter().map(MemberRecord::from_document).collect())
    }

    async fn find_matching(&self, filter: &MemberFilter) -> DaoResult<Vec<MemberRecord>> {
        let docs = self.base.find_many(filter.to_document(), None).await?;
        Ok(docs.into_iter().map(MemberRecord::from_document).collect())
    }

    async fn count_matching(&self, filter: &MemberFilter) -> DaoResult<u64> {
        self.base.count(filter.to_document()).await
    }
}

#[async_trait]
impl MemberBulkStore for MemberDao {
    async fn insert_batch(&self, docs: Vec<Document>) -> DaoResult<usize> {
        self.base.insert_many(&docs).await
    }

    async fn fetch_all(&self) -> DaoResult<Vec<MemberRecord>> {
        let docs = self
            .base
            .find_many(doc! {}, Some(doc! { "_id": 1 }))
            .await?;
        Ok(docs.into_iter().map(MemberRecord::from_document).collect())
    }

    async fn delete_batch(&self, limit: usize) -> DaoResult<u64> {
        let cursor = self
            .base
            .collection()
            .find(doc! {})
            .projection(doc! { "_id": 1 })
            .limit(limit as i64)
            .await?;
        let heads: Vec<Document> = cursor.try_collect().await?;
        let ids: Vec<Bson> = heads
            .into_iter()
            .filter_map(|mut head| head.remove(fields::ID))
            .collect();

        if ids.is_empty() {
            return Ok(0);
        }

        let deleted = self.base.hard_delete(doc! { "_id": { "$in": ids } }).await?;
        debug!(deleted, "Deleted batch");
        Ok(deleted)
    }
}
