//! One client's view of the shared document.
//!
//! A [`Session`] owns the connection parameters, the document store, the
//! local fallback, and the synchronization state (the mirror of the remote
//! list plus the last-known `lastUpdate` token). Every operation re-checks
//! the session's current state, so a document id assigned mid-session is
//! picked up by the next poll tick.
//!
//! Locking: the state mutex is never held across a network call. Results
//! are applied under the lock with the token comparison repeated there, so
//! concurrent polls resolve as last-result-wins without double
//! notification.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::codec;
use crate::error::{PinboardError, StoreError};
use crate::fallback::FallbackStore;
use crate::model::{Event, Point};
use crate::poller::Poller;
use crate::reconcile::{self, ChangeCheck};
use crate::remote::{Credential, DocumentStore};
use crate::role::{ConnectionParams, Role, select_role};

/// Name of the background polling thread.
pub const POLL_THREAD_NAME: &str = "pinboard-poll";

/// Where a submitted event ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Appended to the remote document.
    Remote { document_id: String, total: usize },
    /// Stored locally because this session cannot write remotely.
    Local { stored: usize },
    /// Stored locally after the remote write failed.
    LocalAfterRemoteFailure { error: StoreError, stored: usize },
}

impl SubmitOutcome {
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// The remote failure that forced a local write, if any.
    #[must_use]
    pub const fn remote_error(&self) -> Option<&StoreError> {
        match self {
            Self::LocalAfterRemoteFailure { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Result of one poll or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// New content was applied and listeners were notified.
    Changed {
        new_count: usize,
        previous_count: usize,
    },
    /// The remote token matched the last-known one.
    Unchanged,
    /// Nothing to poll: the session lacks a credential or a document id.
    Inert,
    /// Fetch or decode failed; local state is untouched.
    Failed(StoreError),
}

#[derive(Debug, Default)]
struct SyncState {
    last_known_update: Option<String>,
    pending: Arc<Vec<Event>>,
}

pub struct Session<S> {
    credential: Option<Credential>,
    document_id: OnceLock<String>,
    store: S,
    clock: Arc<dyn Clock>,
    fallback: FallbackStore,
    state: Mutex<SyncState>,
}

impl<S: DocumentStore> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role())
            .field("document_id", &self.document_id.get())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl<S: DocumentStore> Session<S> {
    pub fn new(
        params: ConnectionParams,
        store: S,
        clock: Arc<dyn Clock>,
        fallback: FallbackStore,
    ) -> Self {
        let document_id = OnceLock::new();
        if let Some(id) = params.document_id {
            let _ = document_id.set(id);
        }

        let session = Self {
            credential: params.credential,
            document_id,
            store,
            clock,
            fallback,
            state: Mutex::new(SyncState::default()),
        };
        debug!(role = %session.role(), document_id = ?session.document_id(), "session started");
        session
    }

    /// Current role. The credential is fixed for the session's lifetime.
    #[must_use]
    pub fn role(&self) -> Role {
        select_role(self.credential.is_some(), self.document_id.get().is_some())
    }

    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.get().map(String::as_str)
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    #[must_use]
    pub const fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }

    /// The mirror of the remote list as of the last applied poll or write.
    ///
    /// Unchanged polls return the same allocation.
    #[must_use]
    pub fn pending_events(&self) -> Arc<Vec<Event>> {
        Arc::clone(&self.lock_state().pending)
    }

    #[must_use]
    pub fn last_known_update(&self) -> Option<String> {
        self.lock_state().last_known_update.clone()
    }

    /// Return the document id, creating the document if none is assigned.
    ///
    /// The new document holds the current mirror. The id is assigned once;
    /// if two callers race, the first assignment wins and the other
    /// document is left orphaned.
    ///
    /// # Errors
    ///
    /// [`PinboardError::NotWritable`] without a credential, or the store
    /// error from the create call.
    pub fn ensure_document(&self) -> Result<String, PinboardError> {
        let Some(credential) = &self.credential else {
            return Err(PinboardError::NotWritable { role: self.role() });
        };
        Ok(self.ensure_document_with(credential)?)
    }

    /// Submit one event.
    ///
    /// Owners append to the remote document, creating it first if needed.
    /// Everyone else, and owners whose remote write fails, store the event
    /// in the local fallback.
    ///
    /// # Errors
    ///
    /// [`PinboardError::InvalidEvent`] for an empty title, or
    /// [`PinboardError::Fallback`] when the local write fails too.
    pub fn submit(&self, event: Event) -> Result<SubmitOutcome, PinboardError> {
        if event.title.trim().is_empty() {
            return Err(PinboardError::InvalidEvent("title must not be empty"));
        }

        let Some(credential) = &self.credential else {
            let stored = self.fallback.append(&event)?;
            info!(role = %self.role(), stored, "event stored locally");
            return Ok(SubmitOutcome::Local { stored });
        };

        match self.append_remote(credential, event.clone()) {
            Ok((document_id, total)) => {
                info!(document_id = %document_id, total, "event appended to remote document");
                Ok(SubmitOutcome::Remote { document_id, total })
            }
            Err(error) => {
                warn!(error = %error, "remote append failed; storing event locally");
                let stored = self.fallback.append(&event)?;
                Ok(SubmitOutcome::LocalAfterRemoteFailure { error, stored })
            }
        }
    }

    /// Run one change-detection check.
    ///
    /// Inert (no network call) unless both a credential and a document id
    /// are present. `on_new_events` receives the new list and the previous
    /// mirror length, and runs only when the token changed.
    pub fn poll_once(&self, on_new_events: impl FnOnce(&[Event], usize)) -> PollOutcome {
        if self.credential.is_none() {
            return PollOutcome::Inert;
        }
        let Some(document_id) = self.document_id.get() else {
            return PollOutcome::Inert;
        };
        self.apply_remote(document_id, on_new_events)
    }

    /// Fetch and apply the current document without requiring a credential.
    pub fn refresh(&self, on_new_events: impl FnOnce(&[Event], usize)) -> PollOutcome {
        let Some(document_id) = self.document_id.get() else {
            return PollOutcome::Inert;
        };
        self.apply_remote(document_id, on_new_events)
    }

    /// Poll every `interval` on a background thread until the returned
    /// [`Poller`] is stopped or dropped.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn start_polling<F>(
        self: &Arc<Self>,
        interval: Duration,
        mut on_new_events: F,
    ) -> std::io::Result<Poller>
    where
        S: 'static,
        F: FnMut(&[Event], usize) + Send + 'static,
    {
        let session = Arc::clone(self);
        debug!(interval_ms = interval.as_millis(), "starting poller");
        Poller::spawn(POLL_THREAD_NAME, interval, move || {
            let _ = session.poll_once(&mut on_new_events);
        })
    }

    /// Remove the pending event at `index` and return it as a point at
    /// `lat`/`lng`.
    ///
    /// The remaining list is written to the remote document first; the
    /// mirror only changes once that write succeeds.
    ///
    /// # Errors
    ///
    /// [`PinboardError::NotWritable`] without a credential,
    /// [`PinboardError::NoSuchEvent`] for an out-of-range index, or the
    /// store error from the overwrite.
    pub fn place_event(&self, index: usize, lat: f64, lng: f64) -> Result<Point, PinboardError> {
        let Some(credential) = &self.credential else {
            return Err(PinboardError::NotWritable { role: self.role() });
        };

        let current = self.pending_events();
        if index >= current.len() {
            return Err(PinboardError::NoSuchEvent {
                index,
                len: current.len(),
            });
        }

        let document_id = self.ensure_document_with(credential)?;
        let mut remaining = current.as_ref().clone();
        let event = remaining.remove(index);
        let encoded = reconcile::overwrite(
            &self.store,
            self.clock.as_ref(),
            credential,
            &document_id,
            &remaining,
        )?;

        let mut state = self.lock_state();
        state.pending = Arc::new(remaining);
        state.last_known_update = Some(encoded.last_update);
        drop(state);

        info!(document_id = %document_id, title = %event.title, "event placed on map");
        Ok(Point::from_event(&event, lat, lng))
    }

    fn ensure_document_with(&self, credential: &Credential) -> Result<String, StoreError> {
        if let Some(id) = self.document_id.get() {
            return Ok(id.clone());
        }

        let snapshot = self.pending_events();
        let encoded = codec::encode(&snapshot, self.clock.as_ref())?;
        let created = self.store.create(credential, &encoded.content)?;

        if self.document_id.set(created.clone()).is_err() {
            warn!(orphaned = %created, "document id was assigned concurrently");
            return Ok(self.document_id.get().cloned().unwrap_or(created));
        }

        let mut state = self.lock_state();
        if Arc::ptr_eq(&state.pending, &snapshot) {
            state.last_known_update = Some(encoded.last_update);
        }
        drop(state);

        info!(document_id = %created, "created remote document");
        Ok(created)
    }

    fn append_remote(
        &self,
        credential: &Credential,
        event: Event,
    ) -> Result<(String, usize), StoreError> {
        let document_id = self.ensure_document_with(credential)?;
        let (merged, encoded) = reconcile::append_with_merge(
            &self.store,
            self.clock.as_ref(),
            credential,
            &document_id,
            event,
        )?;

        let total = merged.len();
        let mut state = self.lock_state();
        state.pending = Arc::new(merged);
        state.last_known_update = Some(encoded.last_update);
        drop(state);
        Ok((document_id, total))
    }

    fn apply_remote(
        &self,
        document_id: &str,
        on_new_events: impl FnOnce(&[Event], usize),
    ) -> PollOutcome {
        let last_known = self.last_known_update();
        let checked = reconcile::check_for_changes(&self.store, document_id, last_known.as_deref());
        let envelope = match checked {
            Ok(ChangeCheck::Unchanged) => return PollOutcome::Unchanged,
            Ok(ChangeCheck::Changed(envelope)) => envelope,
            Err(err) => {
                debug!(document_id, error = %err, "poll failed; keeping current state");
                return PollOutcome::Failed(err);
            }
        };

        let mut state = self.lock_state();
        if state.last_known_update.as_deref() == Some(envelope.last_update.as_str()) {
            return PollOutcome::Unchanged;
        }
        let previous_count = state.pending.len();
        let events = Arc::new(envelope.events);
        state.pending = Arc::clone(&events);
        state.last_known_update = Some(envelope.last_update);
        drop(state);

        debug!(document_id, new_count = events.len(), previous_count, "remote document changed");
        on_new_events(&events, previous_count);
        PollOutcome::Changed {
            new_count: events.len(),
            previous_count,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
