use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use memberdir_services::member::{FieldIssue, MemberListParams, MemberPage};
use tracing::{debug, info};

use crate::{error::ApiError, response::ApiResponse, state::AppState};

/// `GET /api/members`
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<ApiResponse<MemberPage>>, ApiError> {
    let Query(raw) = query.map_err(|rejection| {
        ApiError::Validation(vec![FieldIssue {
            field: "query".to_string(),
            value: None,
            message: rejection.body_text(),
        }])
    })?;

    let params = MemberListParams::from_query(&raw).map_err(|issues| {
        debug!(?issues, "Rejected members query");
        ApiError::Validation(issues)
    })?;

    let page = state.members.list(&params).await?;
    info!(
        returned = page.members.len(),
        total = page.pagination.total,
        "Listed members"
    );
    Ok(Json(ApiResponse::new(page)))
}
