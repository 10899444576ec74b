//! Closed error taxonomy for the session core.
//!
//! Every transport-level failure (HTTP, Redis) is classified into one of
//! these variants before it leaves the crate. Callers can match exhaustively
//! and render a user-facing message without knowing which layer failed.

use thiserror::Error;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Login rejected by the credential store. Re-prompt, never retry.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Refresh token dead or session torn down. The user must log in again.
    #[error("Session expired - please log in again")]
    SessionExpired,

    /// The permission engine denied the action. Never reaches the backend.
    #[error("This action is not available for your role")]
    Forbidden,

    /// Backend rejected the bearer token (HTTP 401). Internal classification:
    /// the authenticated client escalates this to `SessionExpired` after its
    /// single renewal attempt fails.
    #[error("Unauthorized - access token rejected by backend")]
    Unauthorized,

    /// Network hiccup, timeout, or 5xx. Safe to retry; session left intact.
    #[error("Temporary backend failure: {0}")]
    Transient(String),

    /// Backend-side validation failure (HTTP 400). Propagated untouched for
    /// the caller to render field-by-field.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: serde_json::Value,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Any other non-auth backend rejection.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Truncate a response body to avoid dragging large payloads into logs
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify an HTTP status + body from the backend.
    ///
    /// 401 and 403 are kept distinct: 401 feeds the renew-once-retry-once
    /// protocol, 403 is surfaced directly as a denial.
    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            400 => {
                // The backend wraps validation errors as {message, errors}
                let parsed: serde_json::Value =
                    serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
                CoreError::Validation {
                    message: parsed
                        .get("message")
                        .and_then(|m| m.as_str())
                        .unwrap_or("Validation error")
                        .to_string(),
                    errors: parsed.get("errors").cloned().unwrap_or(parsed),
                }
            }
            401 => CoreError::Unauthorized,
            403 => CoreError::Forbidden,
            404 => CoreError::NotFound(truncated),
            500..=599 => CoreError::Transient(format!("Server error {status}: {truncated}")),
            _ => CoreError::Backend {
                status,
                message: truncated,
            },
        }
    }

    /// Whether the call site may retry after a short delay.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Transient(_))
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        // Timeouts and connection failures are never authorization failures
        CoreError::Transient(err.to_string())
    }
}

impl From<redis::RedisError> for CoreError {
    fn from(err: redis::RedisError) -> Self {
        CoreError::Transient(format!("Session store error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
