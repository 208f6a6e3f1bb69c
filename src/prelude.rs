//! Convenience re-exports for common use.

pub use crate::api::{SpotifyClient, Track};
pub use crate::auth::{AuthError, TokenManager, TokenState};
pub use crate::config::{CredentialRecord, CredentialStore, Field, FieldValue, StoreConfig};
pub use crate::error::{PlaylisterError, Result};
