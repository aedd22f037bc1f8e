//! Reconciliation protocols over a [`DocumentStore`].
//!
//! Two protocols share the document:
//!
//! 1. **Append-with-merge** (submitters): fetch the current list, append one
//!    event, overwrite the whole document. There is no compare-and-swap, so
//!    two submitters racing between the fetch and the overwrite can lose one
//!    of the writes. Last writer wins at document granularity.
//! 2. **Change detection** (owner polls): fetch, compare `lastUpdate` with
//!    the last-known token, and report a change only when they differ.
//!
//! These functions hold no state; [`crate::session::Session`] owns the
//! token and the mirror and decides what to do with each outcome.

use tracing::debug;

use crate::clock::Clock;
use crate::codec::{self, EncodedDocument, Envelope};
use crate::error::StoreError;
use crate::model::Event;
use crate::remote::{Credential, DocumentStore};

/// Result of one change-detection check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeCheck {
    /// The remote token differs from the last-known one.
    Changed(Envelope),
    /// The remote token equals the last-known one.
    Unchanged,
}

/// Fetch and decode the current envelope.
///
/// # Errors
///
/// Any fetch or decode failure, unmodified.
pub fn read_envelope(store: &dyn DocumentStore, document_id: &str) -> Result<Envelope, StoreError> {
    let raw = store.fetch(document_id)?;
    codec::decode(&raw.content)
}

/// Fetch the remote list, treating every failure as an empty list.
///
/// Submission must never block on a failed read.
pub fn read_events_or_empty(store: &dyn DocumentStore, document_id: &str) -> Vec<Event> {
    match read_envelope(store, document_id) {
        Ok(envelope) => envelope.events,
        Err(err) => {
            debug!(document_id, error = %err, "read before append failed; merging onto empty list");
            Vec::new()
        }
    }
}

/// Append `event` to the remote list and overwrite the document.
///
/// Returns the merged list and the encoded document that was written.
///
/// # Errors
///
/// Only the overwrite can fail this call; a failed read degrades to an
/// empty base list.
pub fn append_with_merge(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    credential: &Credential,
    document_id: &str,
    event: Event,
) -> Result<(Vec<Event>, EncodedDocument), StoreError> {
    let mut events = read_events_or_empty(store, document_id);
    events.push(event);
    let encoded = codec::encode(&events, clock)?;
    store.replace(credential, document_id, &encoded.content)?;
    Ok((events, encoded))
}

/// Overwrite the document with exactly `events`.
///
/// # Errors
///
/// Encode or overwrite failures.
pub fn overwrite(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    credential: &Credential,
    document_id: &str,
    events: &[Event],
) -> Result<EncodedDocument, StoreError> {
    let encoded = codec::encode(events, clock)?;
    store.replace(credential, document_id, &encoded.content)?;
    Ok(encoded)
}

/// Compare the remote document's token with `last_known`.
///
/// # Errors
///
/// Any fetch or decode failure. Callers treat these as no-ops.
pub fn check_for_changes(
    store: &dyn DocumentStore,
    document_id: &str,
    last_known: Option<&str>,
) -> Result<ChangeCheck, StoreError> {
    let envelope = read_envelope(store, document_id)?;
    if last_known == Some(envelope.last_update.as_str()) {
        Ok(ChangeCheck::Unchanged)
    } else {
        Ok(ChangeCheck::Changed(envelope))
    }
}
