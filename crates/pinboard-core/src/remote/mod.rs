//! Remote document store abstraction.
//!
//! The store is a public paste-like service used as a makeshift database:
//! anyone can read a document by id, only credential holders can write, and
//! writes replace the whole text. Implementations convert every transport
//! and protocol failure into a [`StoreError`]; nothing here panics.

use std::fmt;

use crate::error::StoreError;

pub mod gist;
pub mod memory;

pub use gist::GistStore;
pub use memory::MemoryStore;

/// Opaque bearer credential. Never printed through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token. Blank input yields `None`.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The secret itself, for building request headers and join links.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token carries a recognizable GitHub token prefix.
    #[must_use]
    pub fn has_known_prefix(&self) -> bool {
        self.0.starts_with("ghp_") || self.0.starts_with("github_pat_")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A fetched document: its id and the payload text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub id: String,
    pub content: String,
}

/// Typed operations against the remote document store.
pub trait DocumentStore: Send + Sync {
    /// Read a document. Never needs a credential.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the document or its payload is absent,
    /// [`StoreError::RequestFailed`] for transport or protocol failures.
    fn fetch(&self, document_id: &str) -> Result<RawDocument, StoreError>;

    /// Create a new document holding `content` and return its id.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unauthorized`] if the credential is rejected,
    /// [`StoreError::RequestFailed`] for anything else.
    fn create(&self, credential: &Credential, content: &str) -> Result<String, StoreError>;

    /// Overwrite the whole document with `content`.
    ///
    /// The store does not merge fields, so `content` must be a complete
    /// envelope.
    ///
    /// # Errors
    ///
    /// As for [`DocumentStore::create`], plus [`StoreError::NotFound`].
    fn replace(
        &self,
        credential: &Credential,
        document_id: &str,
        content: &str,
    ) -> Result<(), StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn fetch(&self, document_id: &str) -> Result<RawDocument, StoreError> {
        (**self).fetch(document_id)
    }

    fn create(&self, credential: &Credential, content: &str) -> Result<String, StoreError> {
        (**self).create(credential, content)
    }

    fn replace(
        &self,
        credential: &Credential,
        document_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        (**self).replace(credential, document_id, content)
    }
}

#[cfg(test)]
mod tests {
    use super::Credential;

    #[test]
    fn blank_credential_is_absent() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
    }

    #[test]
    fn debug_output_hides_secret() {
        let cred = Credential::new("ghp_supersecret").expect("non-empty");
        let shown = format!("{cred:?}");
        assert!(!shown.contains("supersecret"));
        assert_eq!(cred.expose(), "ghp_supersecret");
    }

    #[test]
    fn known_prefixes_are_recognized() {
        assert!(Credential::new("ghp_abc").expect("token").has_known_prefix());
        assert!(Credential::new("github_pat_abc").expect("token").has_known_prefix());
        assert!(!Credential::new("tok").expect("token").has_known_prefix());
    }
}
