//! In-process document store.
//!
//! Behaves like the public gist service (anonymous reads, credentialed
//! whole-document writes) and adds fault switches so the reconciliation
//! paths can be driven without a network.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{Credential, DocumentStore, RawDocument};
use crate::error::StoreError;

/// Per-operation call counts, for asserting network silence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetches: usize,
    pub creates: usize,
    pub replaces: usize,
}

impl CallCounts {
    #[must_use]
    pub const fn total(self) -> usize {
        self.fetches + self.creates + self.replaces
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, String>>,
    rejected: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fetches: AtomicUsize,
    creates: AtomicUsize,
    replaces: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document with raw content, bypassing credentials.
    pub fn insert(&self, document_id: &str, content: &str) {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document_id.to_string(), content.to_string());
    }

    /// Current raw content of a document, if present.
    #[must_use]
    pub fn content(&self, document_id: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(document_id)
            .cloned()
    }

    /// Make every read fail with [`StoreError::RequestFailed`].
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with [`StoreError::RequestFailed`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Reject writes carrying this token with [`StoreError::Unauthorized`].
    pub fn reject_credential(&self, token: &str) {
        self.rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.to_string());
    }

    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            fetches: self.fetches.load(Ordering::SeqCst),
            creates: self.creates.load(Ordering::SeqCst),
            replaces: self.replaces.load(Ordering::SeqCst),
        }
    }

    fn check_write(&self, credential: &Credential) -> Result<(), StoreError> {
        if self
            .rejected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(credential.expose())
        {
            return Err(StoreError::unauthorized("HTTP 401: Bad credentials"));
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::request_failed("simulated write failure"));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn fetch(&self, document_id: &str) -> Result<RawDocument, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::request_failed("simulated read failure"));
        }
        self.content(document_id)
            .map(|content| RawDocument {
                id: document_id.to_string(),
                content,
            })
            .ok_or_else(|| StoreError::NotFound {
                document_id: document_id.to_string(),
            })
    }

    fn create(&self, credential: &Credential, content: &str) -> Result<String, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_write(credential)?;
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.insert(&id, content);
        Ok(id)
    }

    fn replace(
        &self,
        credential: &Credential,
        document_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        self.check_write(credential)?;
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = documents.get_mut(document_id) else {
            return Err(StoreError::NotFound {
                document_id: document_id.to_string(),
            });
        };
        content.clone_into(slot);
        Ok(())
    }
}
