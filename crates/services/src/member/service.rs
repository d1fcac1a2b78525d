use std::sync::Arc;

use tracing::debug;

use super::params::MemberListParams;
use super::query::MemberQuery;
use super::view::{MemberPage, assemble_page};
use crate::dao::{DaoResult, MemberStore};

/// Runs a validated listing request: count, then fetch, then shape.
#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn MemberStore>,
}

impl MemberService {
    pub fn new(store: Arc<dyn MemberStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, params: &MemberListParams) -> DaoResult<MemberPage> {
        let query = MemberQuery::from_params(params);

        // Count and page are separate round trips, not one snapshot.
        let total = self.store.count_matching(&query.filter).await?;
        debug!(total, "Counted matching members");

        let records = self.store.find_page(&query).await?;
        debug!(
            returned = records.len(),
            sort_field = query.sort_field.storage_field(),
            sort_order = query.sort_order.as_str(),
            skip = query.skip,
            limit = query.limit,
            "Fetched members page"
        );

        Ok(assemble_page(&records, total, query.limit, query.skip))
    }
}
