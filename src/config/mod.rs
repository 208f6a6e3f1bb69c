//! Credential store: one fixed-schema record persisted to a TOML file.

mod epoch;
pub mod error;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use record::{CredentialRecord, Field, FieldValue};
pub use store::{CredentialStore, StoreConfig};
