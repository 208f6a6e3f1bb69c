use thiserror::Error;

use crate::config::StoreError;

/// Failures of the authorization and refresh flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Missing Spotify client credentials (client id and secret)")]
    MissingCredentials,
    #[error("No refresh token on record")]
    MissingRefreshToken,
    #[error("Authorization code exchange failed with code {status}: {reason}")]
    AuthExchangeFailed { status: u16, reason: String },
    #[error("Token refresh failed with code {status}: {reason}")]
    RefreshFailed { status: u16, reason: String },
    #[error("Callback listener error: {0}")]
    Listener(String),
    #[error("Timed out after {secs}s waiting for the authorization callback")]
    Timeout { secs: u64 },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::InvalidResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidResponse(error.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl(error.to_string())
    }
}
