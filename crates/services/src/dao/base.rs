use bson::Document;
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DaoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type DaoResult<T> = Result<T, DaoError>;

pub struct BaseDao<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> BaseDao<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Unpin + Send + Sync,
{
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<T>(collection_name),
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub async fn find_many(&self, filter: Document, sort: Option<Document>) -> DaoResult<Vec<T>> {
        let cursor = if let Some(sort) = sort {
            self.collection.find(filter).sort(sort).await?
        } else {
            self.collection.find(filter).await?
        };

        Ok(cursor.try_collect().await?)
    }

    /// One window of a sorted result: `limit` documents after skipping `skip`.
    pub async fn find_window(
        &self,
        filter: Document,
        sort: Document,
        skip: u64,
        limit: i64,
    ) -> DaoResult<Vec<T>> {
        let cursor = self
            .collection
            .find(filter)
            .sort(sort)
            .skip(skip)
            .limit(limit)
            .await?;

        let items: Vec<T> = cursor.try_collect().await?;
        debug!(count = items.len(), skip, limit, "Fetched window");
        Ok(items)
    }

    pub async fn insert_many(&self, docs: &[T]) -> DaoResult<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let result = self.collection.insert_many(docs).await?;
        debug!(count = result.inserted_ids.len(), "Inserted documents");
        Ok(result.inserted_ids.len())
    }

    pub async fn hard_delete(&self, filter: Document) -> DaoResult<u64> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    pub async fn count(&self, filter: Document) -> DaoResult<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }
}
