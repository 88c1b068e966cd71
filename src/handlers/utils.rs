use axum::body::Bytes;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// Parse a JSON request body. An empty body reads as `{}` so that every field
/// falls back to its default and the handler reports what is missing.
pub fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) { b"{}" } else { &body[..] };
    serde_json::from_slice(raw).map_err(|e| {
        warn!("Rejecting malformed request body: {}", e);
        ApiError::invalid_json(format!("Invalid JSON body: {}", e))
    })
}

/// Treat empty strings in optional inputs the same as absent values
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
