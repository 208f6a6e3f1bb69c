//! Error types for playlister.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::AuthError;
use crate::config::StoreError;

/// Top-level error for every playlister operation.
#[derive(Error, Debug)]
pub enum PlaylisterError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PlaylisterError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(err) => Self::category_of_store(err),
            Self::Auth(err) => match err {
                AuthError::Store(inner) => Self::category_of_store(inner),
                AuthError::MissingCredentials | AuthError::InvalidUrl(_) => {
                    ErrorCategory::Configuration
                }
                AuthError::Timeout { .. } => ErrorCategory::Timeout,
                AuthError::Network(_) => ErrorCategory::Network,
                AuthError::MissingRefreshToken
                | AuthError::AuthExchangeFailed { .. }
                | AuthError::RefreshFailed { .. }
                | AuthError::Listener(_)
                | AuthError::InvalidResponse(_) => ErrorCategory::Authentication,
            },
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                _ => ErrorCategory::Api,
            },
            Self::Network(_) => ErrorCategory::Network,
            Self::InvalidArgument(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Unknown,
        }
    }

    /// Suggest what the user should do next.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            Self::Auth(AuthError::MissingCredentials) => RecoverySuggestion::ProvideClientCredentials,
            Self::Auth(
                AuthError::AuthExchangeFailed { status, reason }
                | AuthError::RefreshFailed { status, reason },
            ) if *status == 401 || reason.starts_with("invalid_client") => {
                RecoverySuggestion::ProvideClientCredentials
            }
            Self::Api { status: 429 | 500..=599, .. } => RecoverySuggestion::RetryLater,
            _ => match self.category() {
                ErrorCategory::Authentication | ErrorCategory::Timeout => {
                    RecoverySuggestion::Reauthorize
                }
                ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
                ErrorCategory::Storage => RecoverySuggestion::CheckConfigFile,
                ErrorCategory::Network => RecoverySuggestion::RetryLater,
                ErrorCategory::Api | ErrorCategory::Unknown => RecoverySuggestion::None,
            },
        }
    }

    fn category_of_store(err: &StoreError) -> ErrorCategory {
        match err {
            StoreError::UnknownField(_) | StoreError::TypeMismatch { .. } => {
                ErrorCategory::Configuration
            }
            _ => ErrorCategory::Storage,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PlaylisterError>;
