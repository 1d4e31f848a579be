//! Fetch error types

use thiserror::Error;

/// Error returned by a [`RemoteFetcher`](crate::RemoteFetcher)
///
/// # Examples
/// ```
/// use networking::FetchError;
///
/// let error = FetchError::Http { status: 503, body: "down".to_string() };
/// assert_eq!(error.status(), Some(503));
/// assert!(error.is_retryable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Transport failure (DNS, connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Body could not be decoded as the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the failure is transient and worth retrying
    ///
    /// Transport errors and statuses 408, 425, 429, 500, 502, 503, 504, 522
    /// and 524 are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http { status, .. } => {
                matches!(status, 408 | 425 | 429 | 500 | 502 | 503 | 504 | 522 | 524)
            }
            FetchError::Parse(_) => false,
        }
    }

    /// Whether the session credential was rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Human-readable message from a JSON error body
    ///
    /// Looks for `message` then `error` in `{"message": ..., "error": ...}`,
    /// falling back to the raw body.
    pub fn server_message(&self) -> Option<String> {
        let FetchError::Http { body, .. } = self else {
            return None;
        };

        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let field = parsed.as_ref().and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
                .map(str::to_string)
        });

        field.or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
    }
}
