//! Vector index abstractions for nearest-neighbor search.
//!
//! This module provides a trait-based abstraction over index structures.
//! The exhaustive [`FlatL2Index`] is the reference implementation; the
//! [`HnswIndex`] wraps [`hnsw_rs`] for approximate search over larger sets.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │         VectorIndex trait         │
//! └──────────┬───────────────┬───────┘
//!            │               │
//!    ┌───────┴──────┐ ┌──────┴───────┐
//!    │ FlatL2Index  │ │  HnswIndex   │  (hnsw_rs wrapper)
//!    └──────────────┘ └──────────────┘
//! ```
//!
//! Vectors live in a [`VectorSlab`] owned by the [`Index`](crate::Index);
//! that slab is the **source of truth**. Index structures are derived data
//! and are rebuilt from the slab whenever an index is loaded.

mod flat;
mod hnsw;

pub use flat::FlatL2Index;
pub use hnsw::HnswIndex;

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use anndists::dist::distances::{DistL2, Distance};
use serde::{Deserialize, Serialize};

use crate::config::HnswConfig;
use crate::error::{Result, SoundMatchError};

/// Index structure selector.
///
/// Stored in the index file, so variants must never be reordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    /// Exhaustive linear scan with Euclidean distance.
    #[default]
    FlatL2,

    /// Hierarchical navigable small world graph, re-ranked with exact L2.
    Hnsw,
}

/// Vector index trait for nearest neighbor search.
///
/// Implementations must be `Send + Sync` so a loaded index can be searched
/// from many threads at once. Mutating methods take `&self` and use
/// interior mutability where a structure needs it; the owning
/// [`Index`](crate::Index) serializes writers.
pub trait VectorIndex: Send + Sync {
    /// Returns which structure this is.
    fn kind(&self) -> IndexKind;

    /// Registers slab rows `start..slab.len()` with the structure.
    ///
    /// Must not leave the structure partially updated when it fails.
    fn insert_rows(&self, slab: &VectorSlab, start: usize) -> Result<()>;

    /// Returns up to `k` neighbors of `query`, sorted by ascending
    /// distance with ties broken by ascending position.
    ///
    /// The caller has already checked that `query.len() == slab.dimension()`.
    fn search(
        &self,
        slab: &VectorSlab,
        query: &[f32],
        k: usize,
        deadline: Deadline,
    ) -> Result<Vec<Neighbor>>;
}

/// Creates an empty index structure of the given kind.
pub fn create_vector_index(
    kind: IndexKind,
    dimension: usize,
    config: &HnswConfig,
) -> Box<dyn VectorIndex> {
    match kind {
        IndexKind::FlatL2 => Box::new(FlatL2Index),
        IndexKind::Hnsw => Box::new(HnswIndex::new(dimension, config)),
    }
}

/// A single search hit: slab position plus exact L2 distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Row position in the slab.
    pub position: usize,
    /// Euclidean distance to the query.
    pub distance: f64,
}

impl Neighbor {
    /// Total order used for ranking: distance, then position.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.position.cmp(&other.position))
    }
}

/// Sorts neighbors by rank and keeps the best `k`.
pub(crate) fn top_k(mut neighbors: Vec<Neighbor>, k: usize) -> Vec<Neighbor> {
    if k == 0 {
        return Vec::new();
    }
    if neighbors.len() > k {
        neighbors.select_nth_unstable_by(k - 1, Neighbor::rank_cmp);
        neighbors.truncate(k);
    }
    neighbors.sort_unstable_by(Neighbor::rank_cmp);
    neighbors
}

/// Euclidean distance between two equal-length, finite vectors.
#[inline]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    DistL2.eval(a, b) as f64
}

/// Index of the first NaN or infinite component, if any.
///
/// Distances are only defined between finite vectors; every path that
/// admits vector data runs this first.
#[inline]
pub(crate) fn first_non_finite(v: &[f32]) -> Option<usize> {
    v.iter().position(|x| !x.is_finite())
}

/// Row-major storage for fixed-dimension vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorSlab {
    dimension: usize,
    data: Vec<f32>,
}

impl VectorSlab {
    /// Creates an empty slab.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Wraps row-major data. `data.len()` must be a multiple of `dimension`.
    pub(crate) fn from_raw(dimension: usize, data: Vec<f32>) -> Self {
        debug_assert!(dimension > 0 && data.len() % dimension == 0);
        Self { dimension, data }
    }

    /// Vector length.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    /// Returns true if no vectors are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the vector at `position`, if any.
    #[inline]
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Iterates rows in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension)
    }

    /// Raw row-major data.
    pub(crate) fn as_raw(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn extend_rows<V: AsRef<[f32]>>(&mut self, vectors: &[V]) {
        self.data.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.data.extend_from_slice(v.as_ref());
        }
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.data.truncate(len * self.dimension);
    }
}

/// Optional point in time after which a search gives up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No deadline.
    pub const fn none() -> Self {
        Self(None)
    }

    /// Expires at `instant`.
    pub const fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    /// Expires `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    /// Returns true once the deadline has passed.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }

    /// Fails with [`SoundMatchError::Interrupted`] if expired.
    #[inline]
    pub(crate) fn check(&self, scanned: usize, total: usize) -> Result<()> {
        if self.is_expired() {
            return Err(SoundMatchError::Interrupted { scanned, total });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_finite() {
        assert_eq!(first_non_finite(&[0.0, 1.0, -2.5]), None);
        assert_eq!(first_non_finite(&[0.0, f32::NAN, 1.0]), Some(1));
        assert_eq!(first_non_finite(&[f32::NEG_INFINITY]), Some(0));
        assert_eq!(first_non_finite(&[f32::MAX, f32::MIN]), None);
    }

    #[test]
    fn test_l2_distance() {
        assert_eq!(l2_distance(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
        let d = l2_distance(&[0.0, 0.0], &[3.0, 4.0]);
        assert!((d - 5.0).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_top_k_orders_and_breaks_ties_by_position() {
        let hits = vec![
            Neighbor { position: 3, distance: 1.0 },
            Neighbor { position: 1, distance: 2.0 },
            Neighbor { position: 0, distance: 1.0 },
            Neighbor { position: 2, distance: 0.5 },
        ];
        let best = top_k(hits, 3);
        let positions: Vec<usize> = best.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![2, 0, 3]);
    }

    #[test]
    fn test_top_k_zero() {
        let hits = vec![Neighbor { position: 0, distance: 0.0 }];
        assert!(top_k(hits, 0).is_empty());
    }

    #[test]
    fn test_slab_rows() {
        let mut slab = VectorSlab::new(2);
        slab.extend_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(slab.len(), 2);
        assert_eq!(slab.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(slab.row(2), None);
        slab.truncate(1);
        assert_eq!(slab.rows().count(), 1);
    }

    #[test]
    fn test_deadline() {
        assert!(!Deadline::none().is_expired());
        let past = Deadline::at(Instant::now());
        assert!(past.is_expired());
        assert!(matches!(
            past.check(3, 10),
            Err(SoundMatchError::Interrupted { scanned: 3, total: 10 })
        ));
        assert!(!Deadline::after(Duration::from_secs(3600)).is_expired());
    }
}
