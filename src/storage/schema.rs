//! On-disk index layout and versioning.
//!
//! An index is persisted as one binary file: a bincode encoding (fixed-width
//! little-endian integers, no trailing bytes) of the following record.
//!
//! # File Layout (format version 1)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ magic           [u8; 4]   b"SMIX"                            │
//! │ format_version  u32       FORMAT_VERSION                     │
//! │ kind            u32       IndexKind variant index            │
//! │ dimension       u32       vector length D (1..=4096)         │
//! │ count           u64       number of tracks N                 │
//! │ vectors         u64 + N·D f32, row-major, insertion order    │
//! │ records         u64 + N   TrackRecord, insertion order       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Encoding is deterministic, so re-saving a loaded file reproduces it
//! byte for byte.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};
use crate::track::TrackRecord;
use crate::vector::{first_non_finite, IndexKind};

/// File signature.
pub const MAGIC: [u8; 4] = *b"SMIX";

/// Current on-disk format version.
///
/// Increment this when making breaking changes to the layout.
/// Files with any other version are refused.
pub const FORMAT_VERSION: u32 = 1;

/// Largest supported embedding dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Fixed prefix read before the body to dispatch on version.
#[derive(Debug, Deserialize)]
struct Header {
    magic: [u8; 4],
    format_version: u32,
}

/// Borrowed view used for encoding.
#[derive(Serialize)]
pub(crate) struct PersistedIndexRef<'a> {
    pub(crate) magic: [u8; 4],
    pub(crate) format_version: u32,
    pub(crate) kind: IndexKind,
    pub(crate) dimension: u32,
    pub(crate) count: u64,
    pub(crate) vectors: &'a [f32],
    pub(crate) records: &'a [TrackRecord],
}

/// Owned form produced by decoding. Field order matches [`PersistedIndexRef`].
#[derive(Debug, Deserialize)]
pub(crate) struct PersistedIndex {
    #[allow(dead_code)]
    pub(crate) magic: [u8; 4],
    #[allow(dead_code)]
    pub(crate) format_version: u32,
    pub(crate) kind: IndexKind,
    pub(crate) dimension: u32,
    pub(crate) count: u64,
    pub(crate) vectors: Vec<f32>,
    pub(crate) records: Vec<TrackRecord>,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

/// Encodes an index view into bytes.
pub(crate) fn encode(view: &PersistedIndexRef<'_>) -> Result<Vec<u8>> {
    Ok(codec().serialize(view)?)
}

/// Decodes and checks an index file.
///
/// # Errors
///
/// - [`StorageError::Corrupted`] for a bad signature, undecodable body,
///   trailing bytes, counts that disagree with each other, or NaN and
///   infinite vector components
/// - [`StorageError::UnsupportedVersion`] for an unknown format version
pub(crate) fn decode(bytes: &[u8]) -> Result<PersistedIndex> {
    let limit = bytes.len() as u64;

    let header: Header = codec()
        .allow_trailing_bytes()
        .with_limit(limit)
        .deserialize(bytes)
        .map_err(|e| StorageError::corrupted(format!("unreadable header: {}", e)))?;
    if header.magic != MAGIC {
        return Err(StorageError::corrupted("not a SoundMatch index file (bad magic)").into());
    }
    if header.format_version != FORMAT_VERSION {
        return Err(StorageError::UnsupportedVersion {
            expected: FORMAT_VERSION,
            found: header.format_version,
        }
        .into());
    }

    let persisted: PersistedIndex = codec()
        .reject_trailing_bytes()
        .with_limit(limit)
        .deserialize(bytes)
        .map_err(|e| StorageError::corrupted(format!("unreadable body: {}", e)))?;

    check_consistency(&persisted)?;
    Ok(persisted)
}

fn check_consistency(p: &PersistedIndex) -> Result<()> {
    let dimension = p.dimension as usize;
    if dimension == 0 || dimension > MAX_DIMENSION {
        return Err(StorageError::corrupted(format!(
            "stored dimension {} outside 1..={}",
            dimension, MAX_DIMENSION
        ))
        .into());
    }

    let count = usize::try_from(p.count)
        .map_err(|_| StorageError::corrupted(format!("stored count {} too large", p.count)))?;

    let expected = count.checked_mul(dimension).ok_or_else(|| {
        StorageError::corrupted(format!(
            "stored count {} times dimension {} overflows",
            count, dimension
        ))
    })?;
    if p.vectors.len() != expected {
        return Err(StorageError::corrupted(format!(
            "expected {} vector components for {} tracks of dimension {}, found {}",
            expected,
            count,
            dimension,
            p.vectors.len()
        ))
        .into());
    }

    if let Some(i) = first_non_finite(&p.vectors) {
        return Err(StorageError::corrupted(format!(
            "non-finite vector component in track {} (component {})",
            i / dimension,
            i % dimension
        ))
        .into());
    }

    if p.records.len() != count {
        return Err(StorageError::corrupted(format!(
            "expected {} track records, found {}",
            count,
            p.records.len()
        ))
        .into());
    }

    Ok(())
}
