//! Error types
//!
//! `ParseError` covers everything that can go wrong while ingesting one
//! document. `GirError` adds the failures of the surrounding file, cache and
//! index machinery.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, GirError>;

/// Failure while turning GIR bytes into a `Repository`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input is not well-formed XML
    #[error("Malformed XML at byte {position}: {message}")]
    MalformedXml { message: String, position: usize },

    /// A required attribute is absent from an element
    #[error("The attribute \"{attribute}\" of element \"{element}\" is missing")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// Well-formed XML without a top-level `repository` element
    #[error("Failed to locate \"repository\" element")]
    MissingRepository,
}

impl ParseError {
    pub fn malformed(message: impl Into<String>, position: usize) -> Self {
        ParseError::MalformedXml {
            message: message.into(),
            position,
        }
    }
}

/// Why a persisted index was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// Written by a different `INDEX_VERSION`
    Version { found: u32, expected: u32 },
    /// Source file changed since the index was written
    Mtime { found: u64, expected: u64 },
    /// Blob could not be decoded
    Corrupt,
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::Version { found, expected } => {
                write!(f, "version {} (expected {})", found, expected)
            }
            StaleReason::Mtime { found, expected } => {
                write!(f, "mtime {} (source is {})", found, expected)
            }
            StaleReason::Corrupt => f.write_str("undecodable blob"),
        }
    }
}

/// Errors surfaced to collaborators
#[derive(Error, Debug)]
pub enum GirError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Document or index file could not be read or written
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted index no longer matches its source
    #[error("Index for {path} is stale: {reason}")]
    IndexStale { path: PathBuf, reason: StaleReason },

    /// Index blob encoding failed
    #[error("Index encoding error: {0}")]
    Index(#[from] bincode::Error),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Flat error discriminant for callers that only branch on the category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedXml,
    MissingAttribute,
    MissingRepository,
    Io,
    IndexStale,
    Index,
    Cancelled,
    InvalidInput,
}

impl GirError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GirError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        GirError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GirError::Parse(ParseError::MalformedXml { .. }) => ErrorKind::MalformedXml,
            GirError::Parse(ParseError::MissingAttribute { .. }) => ErrorKind::MissingAttribute,
            GirError::Parse(ParseError::MissingRepository) => ErrorKind::MissingRepository,
            GirError::Io { .. } => ErrorKind::Io,
            GirError::IndexStale { .. } => ErrorKind::IndexStale,
            GirError::Index(_) => ErrorKind::Index,
            GirError::Cancelled => ErrorKind::Cancelled,
            GirError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_message() {
        let err = ParseError::MissingAttribute {
            element: "namespace",
            attribute: "name",
        };
        assert_eq!(
            err.to_string(),
            "The attribute \"name\" of element \"namespace\" is missing"
        );
    }

    #[test]
    fn test_kind_follows_parse_error() {
        let err: GirError = ParseError::MissingRepository.into();
        assert_eq!(err.kind(), ErrorKind::MissingRepository);
        assert_eq!(err.to_string(), "Failed to locate \"repository\" element");
    }

    #[test]
    fn test_stale_reason_display() {
        let err = GirError::IndexStale {
            path: PathBuf::from("Gtk-4.0.gir"),
            reason: StaleReason::Mtime { found: 1, expected: 2 },
        };
        assert_eq!(err.kind(), ErrorKind::IndexStale);
        assert!(err.to_string().contains("mtime 1 (source is 2)"));
    }
}
