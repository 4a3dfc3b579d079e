//! Shared wire shapes and error-body decoding for API responses.
//!
//! The backend reports failures as JSON objects carrying a human-readable
//! message in one of two places:
//! - `detail`: a string, or a list of validation entries each with a `msg`
//! - `message`: a plain string
//!
//! Success responses for simple actions are `{ "message": ... }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageResponse {
    /// The server's message, or `fallback` when it sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

/// Error body as sent by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// Extracts the human-readable message from an error response body.
///
/// Returns `None` when the body is not JSON or carries no usable text, so
/// callers can substitute their own fallback.
pub fn error_message_from_body(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;

    parsed
        .detail
        .as_ref()
        .and_then(message_from_value)
        .or_else(|| parsed.message.as_ref().and_then(message_from_value))
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        // FastAPI request validation: [{"loc": [...], "msg": "...", ...}]
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .filter(|m| !m.trim().is_empty())
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

/// Pulls the filename out of a `Content-Disposition` header value.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').trim())
        .filter(|name| !name.is_empty())
        // never let a server pick a path
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name).to_string())
}
