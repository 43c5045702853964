//! Error type for the REST client.
//!
//! Every failed backend call surfaces as [`ApiError`]. For non-2xx
//! responses the `Display` text is exactly the server-provided message, or
//! `HTTP <status>` when the body carries none.

use std::path::PathBuf;

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("{message}")]
    Http {
        status: u16,
        /// Server-provided message, or `HTTP <status>`.
        message: String,
    },

    /// A local file could not be read for upload.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An authenticated endpoint was called with no session.
    #[error("Not signed in")]
    Unauthenticated,

    /// A 2xx response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// HTTP status for backend rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Extract a human-readable message from an error response body.
///
/// Looks for `error` (string), then `error.message`, then `message`;
/// falls back to `HTTP <status>` when the body is not JSON or has none.
pub fn error_message(status: u16, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|json| {
        json.get("error")
            .and_then(|e| e.as_str())
            .or_else(|| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
            })
            .or_else(|| json.get("message").and_then(|m| m.as_str()))
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
    });
    message.unwrap_or_else(|| format!("HTTP {status}"))
}
