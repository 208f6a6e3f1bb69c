use chrono::{DateTime, Utc};
use strum::Display;

use crate::config::CredentialRecord;

/// Token lifecycle state, derived from the record rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenState {
    NoToken,
    Stale,
    Valid,
}

impl TokenState {
    /// A token is stale once `now` reaches its expiry. A token without any
    /// expiry on record is treated as stale.
    pub fn derive(record: &CredentialRecord, now: DateTime<Utc>) -> Self {
        if record.access_token.is_empty() {
            return Self::NoToken;
        }
        match record.expires_at {
            Some(expires_at) if expires_at > now => Self::Valid,
            _ => Self::Stale,
        }
    }
}
