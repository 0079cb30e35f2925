//! Snapshot handle for appending while other threads search.

use std::ops::Range;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, instrument};

use crate::config::HnswConfig;
use crate::error::{Result, SoundMatchError};
use crate::track::TrackRecord;

use super::Index;

/// A shared, swappable [`Index`].
///
/// Readers call [`snapshot`](Self::snapshot) and search the returned
/// `Arc<Index>`, which never changes underneath them. Writers build a new
/// index off to the side with [`Index::with_appended`] and publish it in a
/// single pointer swap, so no search can observe a half-appended state.
/// Writers are serialized by an internal mutex.
///
/// # Example
///
/// ```rust
/// use soundmatch::{Index, IndexKind, SharedIndex, TrackRecord};
///
/// let shared = SharedIndex::new(Index::create(2, IndexKind::FlatL2).unwrap());
/// let before = shared.snapshot().unwrap();
/// shared
///     .append(&[[0.5f32, 0.5]], vec![TrackRecord::new("a.wav")])
///     .unwrap();
/// assert_eq!(before.len(), 0);
/// assert_eq!(shared.snapshot().unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct SharedIndex {
    current: RwLock<Arc<Index>>,
    writer: Mutex<()>,
}

impl SharedIndex {
    /// Wraps an index.
    pub fn new(index: Index) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
            writer: Mutex::new(()),
        }
    }

    /// Loads an index file and wraps it.
    pub fn open(path: impl AsRef<Path>, hnsw: &HnswConfig) -> Result<Self> {
        Ok(Self::new(Index::open_with(path, hnsw)?))
    }

    /// Returns the current immutable snapshot.
    pub fn snapshot(&self) -> Result<Arc<Index>> {
        let current = self
            .current
            .read()
            .map_err(|_| SoundMatchError::vector("Shared index lock poisoned"))?;
        Ok(Arc::clone(&current))
    }

    /// Appends a batch by building and publishing a new snapshot.
    ///
    /// Same validation and all-or-nothing semantics as [`Index::add`].
    /// Outstanding snapshots keep seeing the old contents.
    #[instrument(skip_all, fields(batch = vectors.len()))]
    pub fn append<V: AsRef<[f32]>>(
        &self,
        vectors: &[V],
        records: Vec<TrackRecord>,
    ) -> Result<Range<usize>> {
        let _writer = self
            .writer
            .lock()
            .map_err(|_| SoundMatchError::vector("Shared index writer lock poisoned"))?;

        let base = self.snapshot()?;
        let start = base.len();
        let next = base.with_appended(vectors, records)?;
        let end = next.len();
        self.publish(next)?;

        debug!(start, end, "Published new index snapshot");
        Ok(start..end)
    }

    /// Replaces the whole index.
    pub fn replace(&self, index: Index) -> Result<()> {
        let _writer = self
            .writer
            .lock()
            .map_err(|_| SoundMatchError::vector("Shared index writer lock poisoned"))?;
        self.publish(index)
    }

    /// Saves the current snapshot, holding the writer lock so no append
    /// races with the save.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let _writer = self
            .writer
            .lock()
            .map_err(|_| SoundMatchError::vector("Shared index writer lock poisoned"))?;
        self.snapshot()?.save_to(path)
    }

    fn publish(&self, index: Index) -> Result<()> {
        let mut current = self
            .current
            .write()
            .map_err(|_| SoundMatchError::vector("Shared index lock poisoned"))?;
        *current = Arc::new(index);
        Ok(())
    }
}
