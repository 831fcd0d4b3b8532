//! Identity provider error types.

use thiserror::Error;

/// Identity provider error type.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Auth API rejected the request
    #[error("Auth API error ({status}): {message}")]
    AuthApi { status: u16, message: String },

    /// The stored access token could not be decoded
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// No session is currently stored
    #[error("Not signed in")]
    NotSignedIn,

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl IdentityError {
    /// Returns true if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            IdentityError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            IdentityError::AuthApi { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias using IdentityError.
pub type IdentityResult<T> = Result<T, IdentityError>;
