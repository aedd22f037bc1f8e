//! Local fallback list for submissions that could not reach the remote
//! document.
//!
//! The list is one JSON array of [`Event`] in insertion order, stored at
//! `<data_dir>/pending-events.json`. Writers take an advisory lock on a
//! sidecar file and replace the list atomically via a temp-file rename, so
//! a reader never sees a half-written array.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::ErrorCode;
use crate::lock::{FileLock, LockError};
use crate::model::Event;

/// File name of the persisted list inside the data directory.
pub const FALLBACK_FILE: &str = "pending-events.json";

const LOCK_FILE: &str = "pending-events.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} does not hold a JSON event list: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl FallbackError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Corrupt { .. } => ErrorCode::FallbackWriteFailed,
            Self::Lock(err) => err.code(),
        }
    }
}

/// Persisted list of not-yet-synced submissions.
#[derive(Debug, Clone)]
pub struct FallbackStore {
    dir: PathBuf,
}

impl FallbackStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the JSON list.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(FALLBACK_FILE)
    }

    /// Append one event to the end of the list.
    ///
    /// # Errors
    ///
    /// Fails if the lock cannot be taken, the existing file is unreadable or
    /// corrupt, or the new list cannot be written.
    pub fn append(&self, event: &Event) -> Result<usize, FallbackError> {
        let _lock = FileLock::acquire(&self.dir.join(LOCK_FILE), LOCK_TIMEOUT)?;
        let mut events = self.load()?;
        events.push(event.clone());
        self.write_all(&events)?;
        debug!(count = events.len(), path = %self.path().display(), "stored event locally");
        Ok(events.len())
    }

    /// Read the full list in insertion order. A missing file is empty.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors other than "not found", or if the file is not a
    /// JSON array of events.
    pub fn load(&self) -> Result<Vec<Event>, FallbackError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(FallbackError::Io { path, source }),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| FallbackError::Corrupt { path, source })
    }

    /// Remove every stored event, returning how many there were.
    ///
    /// # Errors
    ///
    /// Same as [`FallbackStore::append`].
    pub fn clear(&self) -> Result<usize, FallbackError> {
        let _lock = FileLock::acquire(&self.dir.join(LOCK_FILE), LOCK_TIMEOUT)?;
        let count = self.load()?.len();
        self.write_all(&[])?;
        Ok(count)
    }

    fn write_all(&self, events: &[Event]) -> Result<(), FallbackError> {
        let path = self.path();
        let tmp = self.dir.join(format!("{FALLBACK_FILE}.tmp"));
        let io_err = |source| FallbackError::Io {
            path: path.clone(),
            source,
        };

        let json = serde_json::to_string(events).map_err(|source| FallbackError::Corrupt {
            path: path.clone(),
            source,
        })?;

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        write_synced(&tmp, json.as_bytes()).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
