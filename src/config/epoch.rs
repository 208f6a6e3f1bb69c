//! `validity` is kept as absolute epoch seconds.
//!
//! Older files wrote it as a float, and hand-edited files may leave it as an
//! empty string, so reading is lenient. Writing always emits an integer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(at) => serializer.serialize_i64(at.timestamp()),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let secs = match Option::<Epoch>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Epoch::Int(secs)) => secs,
        Some(Epoch::Float(secs)) => secs.trunc() as i64,
        Some(Epoch::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(|secs| secs.trunc() as i64)
                .map_err(|_| serde::de::Error::custom(format!("invalid epoch seconds: {text}")))?
        }
    };
    from_epoch_secs(secs)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("epoch seconds out of range: {secs}")))
}

pub fn from_epoch_secs(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
