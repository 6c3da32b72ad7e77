//! Error types for graph loading, querying and writing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the terminology graph.
///
/// `NotFound` and `PatternResolution` concern a single item and let a batch
/// carry on; every other variant aborts the current pass.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Malformed input row or file.
    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        /// File name the row came from.
        file: String,
        /// 1-based line number.
        line: u64,
        /// What was wrong.
        message: String,
    },

    /// Lookup of an identifier that was never registered.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Component kind looked up.
        kind: &'static str,
        /// The identifier.
        id: String,
    },

    /// Broken precondition such as an is-a cycle or a duplicate id.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Operation attempted before a successful load.
    #[error("Graph is not loaded")]
    NotLoaded,

    /// Failure writing an output file.
    #[error("Failed to write {}: {source}", .path.display())]
    Output {
        /// The file or directory being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A creation pattern could not be instantiated for an input concept.
    #[error("Pattern '{pattern}' cannot be resolved: {message}")]
    PatternResolution {
        /// Pattern name.
        pattern: String,
        /// Why resolution failed.
        message: String,
    },

    /// I/O error reading RF2 input.
    #[error("IO error reading RF2 input: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error reading RF2 input.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Error reading a zipped RF2 package.
    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl GraphError {
    /// True if a batch may log this error and continue with the next item.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GraphError::NotFound { .. } | GraphError::PatternResolution { .. }
        )
    }

    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        GraphError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphError::Output {
            path: path.into(),
            source,
        }
    }
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// A single field that could not be decoded.
///
/// The row parser wraps these into [`GraphError::Parse`] with the file name
/// and line number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Invalid SCTID format.
    #[error("Invalid SCTID format: {value}")]
    InvalidSctId {
        /// The invalid value that was encountered.
        value: String,
    },

    /// Invalid member UUID.
    #[error("Invalid member UUID: {value}")]
    InvalidUuid {
        /// The invalid value.
        value: String,
    },

    /// Invalid boolean value.
    #[error("Invalid boolean value: {value} (expected 0 or 1)")]
    InvalidBoolean {
        /// The invalid boolean value.
        value: String,
    },

    /// Invalid date format.
    #[error("Invalid date format: {value}")]
    InvalidDate {
        /// The invalid date value.
        value: String,
    },

    /// Invalid integer value.
    #[error("Invalid integer value: {value}")]
    InvalidInteger {
        /// The invalid integer value.
        value: String,
    },

    /// A metadata concept that does not encode a known value.
    #[error("Unknown {column} code: {value}")]
    UnknownCode {
        /// Column the code appeared in.
        column: &'static str,
        /// The code.
        value: u64,
    },

    /// Invalid concrete domain literal.
    #[error("Invalid concrete value: {value}")]
    InvalidConcreteValue {
        /// The literal as written.
        value: String,
    },
}
