use thiserror::Error;

/// Transport-level failure talking to the diary platform.
///
/// These are classified into `AuthError` / `RetrievalError` by the session
/// manager and the retrieval engine; callers of the bridge never see them.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - session may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut cut = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            code @ 500..=599 => ApiError::ServerError {
                status: code,
                body: truncated,
            },
            code => ApiError::UnexpectedStatus {
                status: code,
                body: truncated,
            },
        }
    }

    /// Short description for logs and classified errors. Never includes
    /// response bodies or parse detail, which can echo submitted fields.
    pub fn summary(&self) -> String {
        match self {
            ApiError::AccessDenied(_) => "access denied (403)".to_string(),
            ApiError::Unauthorized => "unauthorized (401)".to_string(),
            ApiError::NotFound(_) => "not found (404)".to_string(),
            ApiError::RateLimited => "rate limited (429)".to_string(),
            ApiError::ServerError { status, .. } => format!("server error ({})", status),
            ApiError::UnexpectedStatus { status, .. } => format!("unexpected status ({})", status),
            ApiError::NetworkError(e) if e.is_timeout() => "network timeout".to_string(),
            ApiError::NetworkError(e) if e.is_connect() => "connection failed".to_string(),
            ApiError::NetworkError(_) => "network error".to_string(),
            ApiError::Timeout(secs) => format!("timed out after {}s", secs),
            ApiError::InvalidResponse(_) => "malformed response".to_string(),
        }
    }

    /// The remote refused the session or credentials.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::AccessDenied(_))
    }

    /// Worth retrying the same request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited
                | ApiError::ServerError { .. }
                | ApiError::NetworkError(_)
                | ApiError::Timeout(_)
        )
    }
}
