//! Error types for loading, mapping and lookup
//!
//! Only structural problems are errors. Everything a real fieldwork export routinely gets
//! wrong (dangling references, duplicate ids, odd dates) is reported as a
//! [`Diagnostic`](super::diagnostics::Diagnostic) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while turning bytes into a lexicon, or a lexicon back into bytes.
#[derive(Debug, Error)]
pub enum LiftError {
    /// The source bytes are not well-formed markup. No lexicon is produced.
    #[error("malformed document at byte {position}: {message}")]
    MalformedDocument { message: String, position: u64 },

    /// A required attribute or child is missing (or unusable) for a mapped element.
    #[error("schema violation in <{element}> at {context}: field '{field}' {reason}")]
    SchemaViolation {
        element: &'static str,
        field: &'static str,
        reason: String,
        context: String,
    },

    /// The root element is not the one the caller asked for.
    #[error("unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    #[error("file has an invalid extension: {}", .0.display())]
    InvalidExtension(PathBuf),

    #[error("cannot read or write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The markup writer failed. Only reachable through writer I/O failures.
    #[error("cannot serialize markup: {0}")]
    Serialize(String),
}

impl LiftError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LiftError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the failures that mean "the bytes were never a document".
    pub fn is_malformed(&self) -> bool {
        matches!(self, LiftError::MalformedDocument { .. })
    }
}

pub type LiftResult<T> = Result<T, LiftError>;

/// Errors returned by identifier lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no item with id '{0}'")]
    NotFound(String),
}

/// Errors in a lexicon search request.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Neither a built-in field nor one declared by the header (or the version defaults).
    #[error("unknown search field '{0}'")]
    UnknownField(String),

    #[error("unknown match kind '{0}', expected contains, exact or regex")]
    UnknownMatch(String),
}
