//! Core type definitions shared across SoundMatch.
//!
//! Records are identified by their insertion position in an index; there
//! are no generated IDs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Embedding vector type (single-precision floats).
pub type Embedding = Vec<f32>;

/// Position of a record in an index.
///
/// Insertion order defines the id: the first appended track is `RecordId(0)`.
/// Ids are stable for the lifetime of an index because records are never
/// updated or deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub usize);

impl RecordId {
    /// Returns the raw position.
    #[inline]
    pub const fn position(&self) -> usize {
        self.0
    }
}

impl From<usize> for RecordId {
    #[inline]
    fn from(position: usize) -> Self {
        Self(position)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
