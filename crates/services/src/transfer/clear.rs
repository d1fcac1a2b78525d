use tracing::info;

use super::TransferResult;
use crate::dao::MemberBulkStore;

/// Deletes every document, `batch_size` at a time. Returns the total removed.
pub async fn clear_collection(store: &dyn MemberBulkStore, batch_size: usize) -> TransferResult<u64> {
    let batch_size = batch_size.max(1);
    let mut total = 0;

    loop {
        let deleted = store.delete_batch(batch_size).await?;
        if deleted == 0 {
            break;
        }
        total += deleted;
        info!(total, "Deleted documents so far");
    }

    Ok(total)
}
