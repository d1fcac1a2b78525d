use chrono::Utc;
use memberdir_services::member::normalize::format_timestamp;
use serde::Serialize;

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: now_timestamp(),
        }
    }
}

pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
