//! Vector store: the persisted collection of tracks.
//!
//! An [`Index`] owns two parallel, position-aligned collections: the
//! embedding vectors (in a [`VectorSlab`]) and the [`TrackRecord`]s. The
//! nearest-neighbor structure is built over the vectors only, so the
//! metadata schema can evolve independently.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Index                                │
//! │   ┌──────────────┐   ┌──────────────────┐   ┌─────────────┐ │
//! │   │ VectorSlab   │   │ Vec<TrackRecord> │   │ VectorIndex │ │
//! │   │ (row i)      │◄─►│ (record i)       │   │ (derived)   │ │
//! │   └──────────────┘   └──────────────────┘   └─────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//!        │ save / load                ▲
//!        ▼                            │ snapshot()
//!   schema (bincode file)       SharedIndex (build-then-swap)
//! ```
//!
//! # Lifecycle
//!
//! Created empty or loaded from bytes, grown only by append, persisted on
//! explicit save. An index is read-only while searched: searches borrow it
//! with `&Index`, appends need `&mut Index`, so the borrow checker keeps
//! them apart within a thread. Use [`SharedIndex`] to append while other
//! threads search.

mod file;
pub mod schema;
mod shared;

pub use schema::{FORMAT_VERSION, MAX_DIMENSION};
pub use shared::SharedIndex;

use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::config::{Config, HnswConfig};
use crate::error::{NotFoundError, Result, SoundMatchError, ValidationError};
use crate::track::TrackRecord;
use crate::types::RecordId;
use crate::vector::{
    create_vector_index, first_non_finite, Deadline, IndexKind, Neighbor, VectorIndex, VectorSlab,
};

use schema::{PersistedIndexRef, MAGIC};

/// A collection of embedding vectors and their track metadata.
///
/// `Index` is `Send + Sync`; share a loaded index across threads with
/// `Arc<Index>` for concurrent searches.
pub struct Index {
    hnsw_config: HnswConfig,
    vectors: VectorSlab,
    records: Vec<TrackRecord>,
    structure: Box<dyn VectorIndex>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("kind", &self.kind())
            .field("dimension", &self.dimension())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Index {
    /// Creates a new empty index.
    ///
    /// # Errors
    ///
    /// Returns [`SoundMatchError::Config`] if `dimension` is 0 or exceeds
    /// [`MAX_DIMENSION`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use soundmatch::{Index, IndexKind};
    ///
    /// let index = Index::create(128, IndexKind::FlatL2).unwrap();
    /// assert!(index.is_empty());
    /// assert!(Index::create(0, IndexKind::FlatL2).is_err());
    /// ```
    pub fn create(dimension: usize, kind: IndexKind) -> Result<Self> {
        Self::create_with(dimension, kind, &HnswConfig::default())
    }

    /// Creates a new empty index with explicit HNSW parameters.
    pub fn create_with(dimension: usize, kind: IndexKind, hnsw: &HnswConfig) -> Result<Self> {
        if dimension == 0 {
            return Err(SoundMatchError::config("dimension must be greater than 0"));
        }
        if dimension > MAX_DIMENSION {
            return Err(SoundMatchError::config(format!(
                "dimension must not exceed {}, got {}",
                MAX_DIMENSION, dimension
            )));
        }

        Ok(Self {
            hnsw_config: hnsw.clone(),
            vectors: VectorSlab::new(dimension),
            records: Vec::new(),
            structure: create_vector_index(kind, dimension, hnsw),
        })
    }

    /// Creates a new empty index using the dimension and kind from `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        Self::create_with(config.dimension(), config.index_kind, &config.hnsw)
    }

    /// Builds an index from validated row-major parts, indexing every row.
    fn from_parts(
        kind: IndexKind,
        hnsw: &HnswConfig,
        vectors: VectorSlab,
        records: Vec<TrackRecord>,
    ) -> Result<Self> {
        let structure = create_vector_index(kind, vectors.dimension(), hnsw);
        structure.insert_rows(&vectors, 0)?;
        Ok(Self {
            hnsw_config: hnsw.clone(),
            vectors,
            records,
            structure,
        })
    }

    // =========================================================================
    // Append
    // =========================================================================

    /// Appends vectors and their records pairwise.
    ///
    /// All-or-nothing: the whole batch is validated before anything is
    /// stored, so a failure leaves the index unchanged.
    ///
    /// Returns the range of positions assigned to the new tracks.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Shape`] if `vectors.len() != records.len()`,
    /// any vector's length differs from the index dimension, or any
    /// component is NaN or infinite.
    pub fn add<V: AsRef<[f32]>>(
        &mut self,
        vectors: &[V],
        records: Vec<TrackRecord>,
    ) -> Result<Range<usize>> {
        self.check_batch(vectors, &records)?;

        let start = self.len();
        self.vectors.extend_rows(vectors);
        self.records.extend(records);

        if let Err(e) = self.structure.insert_rows(&self.vectors, start) {
            self.vectors.truncate(start);
            self.records.truncate(start);
            return Err(e);
        }

        debug!(added = self.len() - start, total = self.len(), "Tracks appended");
        Ok(start..self.len())
    }

    /// Returns a new index holding this index's tracks plus the batch.
    ///
    /// `self` is left untouched, which makes this the building block for
    /// build-then-swap updates (see [`SharedIndex`]).
    pub fn with_appended<V: AsRef<[f32]>>(
        &self,
        vectors: &[V],
        records: Vec<TrackRecord>,
    ) -> Result<Self> {
        self.check_batch(vectors, &records)?;

        let mut slab = self.vectors.clone();
        slab.extend_rows(vectors);
        let mut all_records = Vec::with_capacity(self.records.len() + records.len());
        all_records.extend_from_slice(&self.records);
        all_records.extend(records);

        Self::from_parts(self.kind(), &self.hnsw_config, slab, all_records)
    }

    fn check_batch<V: AsRef<[f32]>>(&self, vectors: &[V], records: &[TrackRecord]) -> Result<()> {
        if vectors.len() != records.len() {
            return Err(ValidationError::shape(format!(
                "{} vectors but {} records",
                vectors.len(),
                records.len()
            ))
            .into());
        }

        let dimension = self.dimension();
        if let Some((i, v)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.as_ref().len() != dimension)
        {
            return Err(ValidationError::shape(format!(
                "vector at batch index {} has length {}, index dimension is {}",
                i,
                v.as_ref().len(),
                dimension
            ))
            .into());
        }

        for (i, v) in vectors.iter().enumerate() {
            if let Some(c) = first_non_finite(v.as_ref()) {
                return Err(ValidationError::shape(format!(
                    "vector at batch index {} has a non-finite component at {}",
                    i, c
                ))
                .into());
            }
        }

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Vector length every stored vector has.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    /// Index structure kind.
    #[inline]
    pub fn kind(&self) -> IndexKind {
        self.structure.kind()
    }

    /// Number of stored tracks.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no tracks are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at `id`, if any.
    pub fn record(&self, id: RecordId) -> Option<&TrackRecord> {
        self.records.get(id.position())
    }

    /// Returns the record at `id` or a [`NotFoundError::Record`].
    pub fn get_record(&self, id: RecordId) -> Result<&TrackRecord> {
        self.record(id)
            .ok_or_else(|| NotFoundError::Record(id.position()).into())
    }

    /// Returns the vector at `id`, if any.
    pub fn vector(&self, id: RecordId) -> Option<&[f32]> {
        self.vectors.row(id.position())
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[TrackRecord] {
        &self.records
    }

    /// Runs the index structure. The query length must already be checked.
    pub(crate) fn nearest(&self, query: &[f32], k: usize, deadline: Deadline) -> Result<Vec<Neighbor>> {
        self.structure.search(&self.vectors, query, k, deadline)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Serializes the index into its on-disk byte layout.
    ///
    /// The layout is deterministic: `Index::from_bytes(b)?.to_bytes()? == b`
    /// for any `b` produced by this method.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let dimension = u32::try_from(self.dimension())
            .map_err(|_| SoundMatchError::config("dimension does not fit the file format"))?;
        schema::encode(&PersistedIndexRef {
            magic: MAGIC,
            format_version: schema::FORMAT_VERSION,
            kind: self.kind(),
            dimension,
            count: self.len() as u64,
            vectors: self.vectors.as_raw(),
            records: &self.records,
        })
    }

    /// Reconstructs an index from bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns a storage error (category `CorruptIndexError`) if the bytes
    /// are not a valid index or fail self-consistency checks.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(bytes, &HnswConfig::default())
    }

    /// Like [`from_bytes`](Self::from_bytes) with explicit HNSW parameters
    /// for rebuilding the graph.
    pub fn from_bytes_with(bytes: &[u8], hnsw: &HnswConfig) -> Result<Self> {
        let persisted = schema::decode(bytes)?;
        let slab = VectorSlab::from_raw(persisted.dimension as usize, persisted.vectors);
        Self::from_parts(persisted.kind, hnsw, slab, persisted.records)
    }

    /// Writes the on-disk byte layout to `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads an index from `reader` until end of stream.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Loads an index file.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError::Index`] if `path` does not exist
    /// - a storage error if the file is corrupt
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &HnswConfig::default())
    }

    /// Loads an index file with explicit HNSW parameters.
    #[instrument(skip(hnsw), fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, hnsw: &HnswConfig) -> Result<Self> {
        let bytes = file::read_index_file(path.as_ref())?;
        let index = Self::from_bytes_with(&bytes, hnsw)?;
        info!(
            tracks = index.len(),
            dimension = index.dimension(),
            kind = ?index.kind(),
            "Index loaded"
        );
        Ok(index)
    }

    /// Saves the index to `path`, replacing any existing file atomically.
    ///
    /// Parent directories are created as needed. Concurrent writers in
    /// other processes are rejected with [`StorageError::Locked`](crate::StorageError::Locked).
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        file::write_index_file(path.as_ref(), &bytes)?;
        info!(tracks = self.len(), bytes = bytes.len(), "Index saved");
        Ok(())
    }
}
