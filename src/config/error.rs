use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("'{0}' is not a valid configuration parameter")]
    UnknownField(String),
    #[error("'{field}' expects a {expected} value")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed config file {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("Failed to encode config: {0}")]
    Encode(String),
}

impl StoreError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Encode(error.to_string())
    }
}
