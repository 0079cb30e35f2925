//! HNSW vector index implementation using hnsw_rs.
//!
//! Wraps `hnsw_rs::Hnsw<f32, DistL2>` as a candidate generator. Candidates
//! are re-scored against the slab with the exact L2 distance so results
//! rank the same way the flat scan does.
//!
//! # Thread Safety
//!
//! The `hnsw_rs::Hnsw` graph uses `parking_lot::RwLock` internally,
//! so `insert()` takes `&self`.
//!
//! # Persistence Strategy
//!
//! The graph is never written to disk. It is rebuilt from the slab when an
//! index is loaded, because `hnsw_rs::HnswIo::load_hnsw` has lifetime
//! constraints that create self-referential struct issues.

use anndists::dist::distances::DistL2;
use hnsw_rs::prelude::Hnsw;
use tracing::debug;

use crate::config::HnswConfig;
use crate::error::{Result, SoundMatchError};

use super::{l2_distance, top_k, Deadline, IndexKind, Neighbor, VectorIndex, VectorSlab};

/// HNSW vector index backed by `hnsw_rs`.
///
/// Internal ids handed to the graph are slab positions, so no id mapping
/// is kept.
pub struct HnswIndex {
    /// Uses `'static` lifetime because all data is heap-owned
    /// (not memory-mapped).
    hnsw: Hnsw<'static, f32, DistL2>,

    /// Candidate list size used while searching.
    ef_search: usize,

    /// Expected vector length.
    dimension: usize,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("dimension", &self.dimension)
            .field("ef_search", &self.ef_search)
            .field("points", &self.hnsw.get_nb_point())
            .finish()
    }
}

impl HnswIndex {
    /// Creates a new empty HNSW index.
    ///
    /// # Arguments
    ///
    /// * `dimension` - Expected embedding dimension (validated on insert)
    /// * `config` - HNSW tuning parameters
    pub fn new(dimension: usize, config: &HnswConfig) -> Self {
        let hnsw = Hnsw::new(
            config.max_nb_connection,
            config.max_elements,
            config.max_layer,
            config.ef_construction,
            DistL2,
        );

        Self {
            hnsw,
            ef_search: config.ef_search,
            dimension,
        }
    }

    /// Returns the number of points in the graph.
    pub fn point_count(&self) -> usize {
        self.hnsw.get_nb_point()
    }
}

impl VectorIndex for HnswIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Hnsw
    }

    fn insert_rows(&self, slab: &VectorSlab, start: usize) -> Result<()> {
        if slab.dimension() != self.dimension {
            return Err(SoundMatchError::vector(format!(
                "Slab dimension mismatch: expected {}, got {}",
                self.dimension,
                slab.dimension()
            )));
        }

        for position in start..slab.len() {
            if let Some(row) = slab.row(position) {
                self.hnsw.insert((row, position));
            }
        }
        Ok(())
    }

    fn search(
        &self,
        slab: &VectorSlab,
        query: &[f32],
        k: usize,
        deadline: Deadline,
    ) -> Result<Vec<Neighbor>> {
        let total = slab.len();
        if total == 0 || k == 0 {
            return Ok(Vec::new());
        }
        deadline.check(0, total)?;

        // Graph traversal itself cannot be interrupted
        let ef = self.ef_search.max(k);
        let candidates = self.hnsw.search(query, k, ef);
        deadline.check(candidates.len(), total)?;

        let rescored: Vec<Neighbor> = candidates
            .into_iter()
            .filter_map(|n| {
                slab.row(n.d_id).map(|row| Neighbor {
                    position: n.d_id,
                    distance: l2_distance(query, row),
                })
            })
            .collect();

        debug!(candidates = rescored.len(), k, ef, "HNSW search complete");
        Ok(top_k(rescored, k))
    }
}
