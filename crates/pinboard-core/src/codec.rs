//! Envelope codec for the shared document's text content.
//!
//! The remote document holds one JSON object:
//!
//! ```text
//! {
//!   "events": [ { "title": ..., "description": ..., "color": ..., ... } ],
//!   "lastUpdate": "2024-05-17T09:30:00.000Z",
//!   "version": 1715938200000
//! }
//! ```
//!
//! `lastUpdate` is the change token compared by pollers; `version` is
//! advisory and never used for conflict detection.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::model::Event;

/// The versioned wrapper stored as the document's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(deserialize_with = "deserialize_rows")]
    pub events: Vec<Event>,
    pub last_update: String,
    #[serde(default)]
    pub version: i64,
}

// Rows that are not JSON objects cannot be events; drop them rather than
// failing the whole document.
fn deserialize_rows<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Event>, D::Error> {
    let rows = Vec::<serde_json::Value>::deserialize(deserializer)?;
    let total = rows.len();
    let events: Vec<Event> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if events.len() < total {
        warn!(dropped = total - events.len(), "skipped unreadable event rows");
    }
    Ok(events)
}

/// Encoded content plus the token it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub content: String,
    pub last_update: String,
    pub version: i64,
}

/// Wrap `events` in a freshly stamped envelope using `clock`.
///
/// # Errors
///
/// Returns [`StoreError::Decode`] if serialization fails, which only happens
/// for values serde cannot represent.
pub fn encode(events: &[Event], clock: &dyn Clock) -> Result<EncodedDocument, StoreError> {
    encode_at(events, clock.now())
}

/// Wrap `events` in an envelope stamped at `now`.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_at(events: &[Event], now: DateTime<Utc>) -> Result<EncodedDocument, StoreError> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct EnvelopeRef<'a> {
        events: &'a [Event],
        last_update: &'a str,
        version: i64,
    }

    let last_update = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let version = now.timestamp_millis();

    let content = serde_json::to_string_pretty(&EnvelopeRef {
        events,
        last_update: &last_update,
        version,
    })
    .map_err(|err| StoreError::decode(format!("failed to encode envelope: {err}")))?;

    Ok(EncodedDocument {
        content,
        last_update,
        version,
    })
}

/// Parse document content into an [`Envelope`].
///
/// # Errors
///
/// Returns [`StoreError::Decode`] for malformed JSON or a missing `events`
/// or `lastUpdate` field.
pub fn decode(content: &str) -> Result<Envelope, StoreError> {
    serde_json::from_str(content).map_err(|err| StoreError::decode(err.to_string()))
}
