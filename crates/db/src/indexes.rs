use bson::Document;
use mongodb::{Database, IndexModel};
use tracing::info;

/// Indexes backing the members listing: one per sortable field (with `_id`
/// as tie-break) plus the prefix-search and active filters.
pub async fn ensure_indexes(db: &Database, collection: &str) -> Result<(), mongodb::error::Error> {
    create_indexes(
        db,
        collection,
        vec![
            index(bson::doc! { "searchName": 1 }),
            index(bson::doc! { "Active": 1, "searchName": 1 }),
            index(bson::doc! { "JoinDate": -1, "_id": -1 }),
            index(bson::doc! { "LastActive": -1, "_id": -1 }),
            index(bson::doc! { "FirstName": 1, "_id": 1 }),
            index(bson::doc! { "LastName": 1, "_id": 1 }),
            index(bson::doc! { "Email": 1, "_id": 1 }),
        ],
    )
    .await
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    let coll = db.collection::<Document>(collection);
    let count = indexes.len();
    coll.create_indexes(indexes).await?;
    info!(collection, count, "Ensured indexes");
    Ok(())
}

fn index(keys: Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}
