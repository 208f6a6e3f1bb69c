use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::epoch;
use super::error::StoreError;

/// Fields of a [`CredentialRecord`], named as they appear in the config file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Client,
    Secret,
    Token,
    Refresh,
    Validity,
    Playlists,
}

impl Field {
    /// Resolve a field by its file name.
    pub fn parse(name: &str) -> Result<Self, StoreError> {
        name.parse()
            .map_err(|_| StoreError::UnknownField(name.to_string()))
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Validity => "timestamp",
            Self::Playlists => "mapping",
            _ => "string",
        }
    }
}

/// A single field value moving in or out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Timestamp(Option<DateTime<Utc>>),
    Mapping(BTreeMap<String, String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(at) => *at,
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(Some(value))
    }
}

impl From<BTreeMap<String, String>> for FieldValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Mapping(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Timestamp(Some(at)) => write!(f, "{}", at.timestamp()),
            Self::Timestamp(None) => Ok(()),
            Self::Mapping(map) => {
                for (i, (name, id)) in map.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{name} = {id}")?;
                }
                Ok(())
            }
        }
    }
}

/// The persisted credential record.
///
/// Every field defaults to empty. `expires_at` is an absolute instant with
/// whole-second resolution, which is also what the file stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(rename = "client", default)]
    pub client_id: String,
    #[serde(rename = "secret", default)]
    pub client_secret: String,
    #[serde(rename = "token", default)]
    pub access_token: String,
    #[serde(rename = "refresh", default)]
    pub refresh_token: String,
    #[serde(
        rename = "validity",
        default,
        with = "epoch",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub playlists: BTreeMap<String, String>,
}

impl CredentialRecord {
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::Client => FieldValue::Text(self.client_id.clone()),
            Field::Secret => FieldValue::Text(self.client_secret.clone()),
            Field::Token => FieldValue::Text(self.access_token.clone()),
            Field::Refresh => FieldValue::Text(self.refresh_token.clone()),
            Field::Validity => FieldValue::Timestamp(self.expires_at),
            Field::Playlists => FieldValue::Mapping(self.playlists.clone()),
        }
    }

    pub(crate) fn apply(&mut self, field: Field, value: FieldValue) -> Result<(), StoreError> {
        match (field, value) {
            (Field::Client, FieldValue::Text(text)) => self.client_id = text,
            (Field::Secret, FieldValue::Text(text)) => self.client_secret = text,
            (Field::Token, FieldValue::Text(text)) => self.access_token = text,
            (Field::Refresh, FieldValue::Text(text)) => self.refresh_token = text,
            (Field::Validity, FieldValue::Timestamp(at)) => {
                self.expires_at = at.map(|at| at.trunc_subsecs(0));
            }
            (Field::Playlists, FieldValue::Mapping(map)) => self.playlists = map,
            (field, _) => {
                return Err(StoreError::TypeMismatch {
                    field: field.name(),
                    expected: field.expected(),
                })
            }
        }
        Ok(())
    }

    /// Overlay every key present in `patch`; absent keys keep their value.
    pub(crate) fn merge(&mut self, patch: RecordPatch) {
        if let Some(client) = patch.client {
            self.client_id = client;
        }
        if let Some(secret) = patch.secret {
            self.client_secret = secret;
        }
        if let Some(token) = patch.token {
            self.access_token = token;
        }
        if let Some(refresh) = patch.refresh {
            self.refresh_token = refresh;
        }
        if let Some(validity) = patch.validity {
            self.expires_at = Some(validity);
        }
        if let Some(playlists) = patch.playlists {
            self.playlists = playlists;
        }
    }
}

/// On-disk view of the record where every key is optional.
///
/// Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecordPatch {
    client: Option<String>,
    secret: Option<String>,
    token: Option<String>,
    refresh: Option<String>,
    #[serde(default, with = "epoch")]
    validity: Option<DateTime<Utc>>,
    playlists: Option<BTreeMap<String, String>>,
}
