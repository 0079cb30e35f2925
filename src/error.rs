//! Error types for SoundMatch.
//!
//! SoundMatch uses a hierarchical error system:
//! - `SoundMatchError` is the top-level error returned by all public APIs
//! - Specific error types (`StorageError`, `ValidationError`, `NotFoundError`)
//!   provide detail
//! - [`ErrorKind`] is the stable category surfaced to callers in the
//!   structured query response
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use soundmatch::{Index, Result};
//!
//! fn example() -> Result<()> {
//!     let index = Index::open("./tracks.smix")?;
//!     // ... operations that may fail ...
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for SoundMatch operations.
pub type Result<T> = std::result::Result<T, SoundMatchError>;

/// Top-level error enum for all SoundMatch operations.
///
/// This is the only error type returned by public APIs.
/// Use pattern matching or [`SoundMatchError::kind`] to handle specific cases.
#[derive(Debug, Error)]
pub enum SoundMatchError {
    /// Storage layer error (corruption, serialization, locking).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// Requested entity not found.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding producer failure (unsupported format, extraction).
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index backend error.
    #[error("Vector index error: {0}")]
    Vector(String),

    /// A search was stopped because its deadline passed.
    #[error("Search interrupted after scanning {scanned} of {total} vectors")]
    Interrupted {
        /// Vectors scanned before the deadline hit.
        scanned: usize,
        /// Vectors in the index.
        total: usize,
    },
}

impl SoundMatchError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a vector index error with the given message.
    pub fn vector(msg: impl Into<String>) -> Self {
        Self::Vector(msg.into())
    }

    /// Returns the stable error category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(StorageError::Locked(_)) => ErrorKind::Io,
            Self::Storage(_) => ErrorKind::CorruptIndex,
            Self::Validation(v) => v.kind(),
            Self::Config { .. } => ErrorKind::Config,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io(_) => ErrorKind::Io,
            Self::Embedding(EmbeddingError::UnsupportedFormat(_)) => ErrorKind::UnsupportedFormat,
            Self::Embedding(EmbeddingError::Extraction(_)) => ErrorKind::Extraction,
            Self::Vector(_) => ErrorKind::Internal,
            Self::Interrupted { .. } => ErrorKind::Interrupted,
        }
    }

    /// Returns true if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a vector index error.
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }
}

/// Stable error categories surfaced to callers.
///
/// The `Display` form is the category name used in logs and in the
/// structured failure response; treat it as part of the public contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad construction parameters.
    Config,
    /// Vector batch and record batch disagree, or a vector has the wrong length.
    Shape,
    /// Query length differs from the index dimension.
    DimensionMismatch,
    /// Query embedding could not be parsed.
    MalformedInput,
    /// `top_k` or `threshold` out of bounds.
    Range,
    /// Missing index or input file.
    NotFound,
    /// Persisted data failed self-consistency checks.
    CorruptIndex,
    /// Underlying storage I/O failed.
    Io,
    /// Search deadline exceeded.
    Interrupted,
    /// Embedding producer could not decode the audio format.
    UnsupportedFormat,
    /// Embedding producer failed while computing features.
    Extraction,
    /// Unexpected failure inside an index backend.
    Internal,
}

impl ErrorKind {
    /// Returns the category name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "ConfigError",
            Self::Shape => "ShapeError",
            Self::DimensionMismatch => "DimensionMismatchError",
            Self::MalformedInput => "MalformedInputError",
            Self::Range => "RangeError",
            Self::NotFound => "NotFoundError",
            Self::CorruptIndex => "CorruptIndexError",
            Self::Io => "IoError",
            Self::Interrupted => "InterruptedError",
            Self::UnsupportedFormat => "UnsupportedFormatError",
            Self::Extraction => "ExtractionError",
            Self::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage-related errors.
///
/// These errors indicate problems with a persisted index file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Index data is corrupted or internally inconsistent.
    #[error("Index corrupted: {0}")]
    Corrupted(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Index file was written by an unknown format version.
    #[error("Unsupported index format version: expected {expected}, found {found}")]
    UnsupportedVersion {
        /// Format version this build reads and writes.
        expected: u32,
        /// Format version found in the file.
        found: u32,
    },

    /// Another writer holds the index lock.
    #[error("Index is locked by another writer: {0}")]
    Locked(PathBuf),
}

impl StorageError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

// Convert bincode errors to StorageError
impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for SoundMatchError {
    fn from(err: bincode::Error) -> Self {
        SoundMatchError::Storage(StorageError::from(err))
    }
}

/// Validation errors for input data.
///
/// These errors indicate problems with data provided by the caller.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Vector length doesn't match the index dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension of the index.
        expected: usize,
        /// Length of the query vector.
        got: usize,
    },

    /// A batch is internally inconsistent (length mismatch between
    /// vectors and records, or a vector of the wrong length).
    #[error("Shape error: {0}")]
    Shape(String),

    /// Query input could not be parsed.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A numeric parameter is outside its allowed range.
    #[error("Invalid field '{field}': {reason}")]
    OutOfRange {
        /// Name of the parameter.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// A configuration field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },
}

impl ValidationError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Creates a shape error.
    pub fn shape(reason: impl Into<String>) -> Self {
        Self::Shape(reason.into())
    }

    /// Creates a malformed input error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput(reason.into())
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error category for this validation failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::Shape(_) => ErrorKind::Shape,
            Self::MalformedInput(_) => ErrorKind::MalformedInput,
            Self::OutOfRange { .. } => ErrorKind::Range,
            Self::InvalidField { .. } => ErrorKind::Config,
        }
    }
}

/// Not found errors for specific entity types.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// Persisted index file does not exist.
    #[error("Index file not found: {}", .0.display())]
    Index(PathBuf),

    /// Audio input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputFile(PathBuf),

    /// Record position is past the end of the index.
    #[error("Record not found: {0}")]
    Record(usize),
}

impl NotFoundError {
    /// Creates an index not found error.
    pub fn index(path: impl Into<PathBuf>) -> Self {
        Self::Index(path.into())
    }

    /// Creates an input file not found error.
    pub fn input_file(path: impl Into<PathBuf>) -> Self {
        Self::InputFile(path.into())
    }
}

/// Failures reported by the embedding producer.
///
/// The engine never interprets these; it only propagates them.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The audio container or codec is not supported.
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Feature extraction failed.
    #[error("Extraction failed: {0}")]
    Extraction(String),
}
