use std::fmt;

use crate::role::Role;

/// Machine-readable error codes for scripts and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    DocumentNotFound,
    Unauthorized,
    RequestFailed,
    DecodeFailed,
    InvalidEvent,
    NotWritable,
    NoSuchEvent,
    FallbackWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::DocumentNotFound => "E2001",
            Self::Unauthorized => "E2002",
            Self::RequestFailed => "E2003",
            Self::DecodeFailed => "E2004",
            Self::InvalidEvent => "E3001",
            Self::NotWritable => "E3002",
            Self::NoSuchEvent => "E3003",
            Self::FallbackWriteFailed => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::DocumentNotFound => "Remote document not found",
            Self::Unauthorized => "Remote write rejected",
            Self::RequestFailed => "Remote request failed",
            Self::DecodeFailed => "Remote document content is malformed",
            Self::InvalidEvent => "Invalid event",
            Self::NotWritable => "Session cannot write to the remote document",
            Self::NoSuchEvent => "No pending event at that position",
            Self::FallbackWriteFailed => "Local fallback store write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .pinboard/config.toml and retry."),
            Self::DocumentNotFound => Some("Check the document id, or omit it to create one."),
            Self::Unauthorized => Some("Check that the token is valid and has gist scope."),
            Self::RequestFailed => Some("Please try again."),
            Self::DecodeFailed => {
                Some("Overwrite the document from an owner session to restore it.")
            }
            Self::InvalidEvent => Some("Provide a non-empty title."),
            Self::NotWritable => Some("Pass --token to act as the document owner."),
            Self::NoSuchEvent => Some("Run `pb show` to list pending events and their positions."),
            Self::FallbackWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `pb` process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure categories of the remote document store.
///
/// "Unchanged" is deliberately absent: an unchanged document is a normal
/// poll outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("document {document_id} not found")]
    NotFound { document_id: String },

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("malformed document content: {reason}")]
    Decode { reason: String },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::DocumentNotFound,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::RequestFailed { .. } => ErrorCode::RequestFailed,
            Self::Decode { .. } => ErrorCode::DecodeFailed,
        }
    }

    pub(crate) fn request_failed(reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason: reason.into(),
        }
    }

    pub(crate) fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by session-level operations.
#[derive(Debug, thiserror::Error)]
pub enum PinboardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("fallback store: {0}")]
    Fallback(#[from] crate::fallback::FallbackError),

    #[error("invalid event: {0}")]
    InvalidEvent(&'static str),

    #[error("a {role} session cannot write to the remote document")]
    NotWritable { role: Role },

    #[error("no pending event at position {index} (have {len})")]
    NoSuchEvent { index: usize, len: usize },
}

impl PinboardError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Store(err) => err.code(),
            Self::Fallback(err) => err.code(),
            Self::InvalidEvent(_) => ErrorCode::InvalidEvent,
            Self::NotWritable { .. } => ErrorCode::NotWritable,
            Self::NoSuchEvent { .. } => ErrorCode::NoSuchEvent,
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, StoreError};
    use std::collections::HashSet;

    const ALL: [ErrorCode; 10] = [
        ErrorCode::ConfigParseError,
        ErrorCode::DocumentNotFound,
        ErrorCode::Unauthorized,
        ErrorCode::RequestFailed,
        ErrorCode::DecodeFailed,
        ErrorCode::InvalidEvent,
        ErrorCode::NotWritable,
        ErrorCode::NoSuchEvent,
        ErrorCode::FallbackWriteFailed,
        ErrorCode::LockContention,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn store_errors_map_to_distinct_codes() {
        let not_found = StoreError::NotFound {
            document_id: "abc".into(),
        };
        assert_eq!(not_found.code(), ErrorCode::DocumentNotFound);
        assert_eq!(
            StoreError::decode("bad json").code(),
            ErrorCode::DecodeFailed
        );
        assert_ne!(
            StoreError::unauthorized("401").code(),
            StoreError::request_failed("502").code()
        );
    }
}
