use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use memberdir_config::RuntimeEnv;
use memberdir_services::{DaoError, member::FieldIssue};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::response::now_timestamp;

const UNEXPECTED: &str = "An unexpected error occurred";

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<FieldIssue>),
    /// The store failed. The detail is logged, never returned.
    ServiceUnavailable(String),
    Internal {
        message: String,
        details: Option<String>,
    },
    NotFound(String),
    TooManyRequests,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
    timestamp: String,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    /// Internal failure whose detail is only exposed outside production.
    pub fn internal(detail: impl Into<String>, env: RuntimeEnv) -> Self {
        let details = (!env.is_production()).then(|| detail.into());
        ApiError::Internal {
            message: "Internal server error".to_string(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match self {
            ApiError::Validation(issues) => (
                "Invalid request parameters".to_string(),
                serde_json::to_value(issues).ok(),
            ),
            ApiError::ServiceUnavailable(_) => (
                "Service temporarily unavailable".to_string(),
                Some(Value::from("Database operation failed")),
            ),
            ApiError::Internal { message, details } => (
                message,
                Some(Value::from(details.unwrap_or_else(|| UNEXPECTED.to_string()))),
            ),
            ApiError::NotFound(message) => (message, None),
            ApiError::TooManyRequests => (
                "Too many requests, please try again later.".to_string(),
                None,
            ),
        };

        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                message,
                status: status.as_u16(),
                details,
            },
            timestamp: now_timestamp(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<DaoError> for ApiError {
    fn from(err: DaoError) -> Self {
        error!(error = %err, "Member store operation failed");
        ApiError::ServiceUnavailable(err.to_string())
    }
}

/// Converts a caught handler panic into the 500 envelope.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>, env: RuntimeEnv) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        UNEXPECTED.to_string()
    };
    error!(panic = %detail, "Request handler panicked");
    ApiError::internal(detail, env).into_response()
}
