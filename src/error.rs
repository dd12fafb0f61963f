//! Error types for the entity and persistence layers

use std::path::PathBuf;
use thiserror::Error;

/// A record or an input failed field validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' must be a string")]
    NotAString(&'static str),

    #[error("unknown priority '{0}'")]
    UnknownPriority(String),

    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors surfaced by the store and the operations built on it
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{context}: {source}")]
    Validation {
        context: String,
        #[source]
        source: ValidationError,
    },

    #[error("corrupt data in {}: {reason}", path.display())]
    CorruptData { path: PathBuf, reason: String },

    #[error("no todo with id '{0}'")]
    NotFound(String),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ValidationError> for StoreError {
    fn from(source: ValidationError) -> Self {
        Self::Validation {
            context: "invalid input".to_string(),
            source,
        }
    }
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CorruptData {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
