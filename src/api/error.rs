use thiserror::Error;

use crate::auth::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("unauthorized - access token was rejected")]
    Unauthorized,

    #[error("session expired - please log in again")]
    SessionExpired,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("server error: {0}")]
    ServerError(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("session storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Maximum length for raw response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid dragging huge payloads into logs
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        // The cutoff must land on a char boundary or the slice panics on
        // multi-byte text
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// Map an error status to the taxonomy, carrying the server-provided
    /// message untouched when the envelope had one and falling back to the
    /// truncated raw body otherwise.
    pub fn from_status(status: reqwest::StatusCode, message: Option<String>, body: &str) -> Self {
        let detail = message.unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            400..=499 => ApiError::Rejected(detail),
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::Decode(format!("unexpected status {}: {}", status, detail)),
        }
    }
}
