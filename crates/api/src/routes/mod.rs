pub mod health;
pub mod member;

use axum::{extract::OriginalUri, http::Method};

use crate::error::ApiError;

/// Fallback for unknown paths and unsupported methods on known ones.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Route {method} {uri} not found"))
}
