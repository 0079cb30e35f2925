//! Exhaustive flat L2 index.

use tracing::debug;

use crate::error::Result;

use super::{l2_distance, top_k, Deadline, IndexKind, Neighbor, VectorIndex, VectorSlab};

/// Exact nearest-neighbor search by scanning every stored vector.
///
/// Holds no state of its own: the slab is the whole structure. Cost is
/// O(N·D) per query, fine for hundreds to low thousands of tracks.
/// The deadline is checked before each vector is scanned.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatL2Index;

impl VectorIndex for FlatL2Index {
    fn kind(&self) -> IndexKind {
        IndexKind::FlatL2
    }

    fn insert_rows(&self, _slab: &VectorSlab, _start: usize) -> Result<()> {
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
        let mut hits = Vec::with_capacity(total);
        for (position, row) in slab.rows().enumerate() {
            deadline.check(position, total)?;
            hits.push(Neighbor {
                position,
                distance: l2_distance(query, row),
            });
        }
        debug!(scanned = total, k, "Flat scan complete");
        Ok(top_k(hits, k))
    }
}
