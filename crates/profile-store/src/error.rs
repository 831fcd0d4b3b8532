//! Profile store error types.

use thiserror::Error;

/// Profile store error type.
#[derive(Error, Debug)]
pub enum ProfileStoreError {
    /// The REST API rejected the request
    #[error("Profile API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The caller has no access token to authenticate the lookup
    #[error("No access token available for profile lookup")]
    NoAccessToken,

    /// HTTP request error (including client-side timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProfileStoreError {
    /// Returns true if this error is transient and the lookup can be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            ProfileStoreError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                if let Some(status) = e.status() {
                    return status.is_server_error();
                }
                false
            }
            ProfileStoreError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias using ProfileStoreError.
pub type ProfileStoreResult<T> = Result<T, ProfileStoreError>;
