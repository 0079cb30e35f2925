//! Similarity search over an [`Index`].
//!
//! # Similarity Mapping
//!
//! `distance` is the Euclidean (L2) distance between the query and a stored
//! vector. It is turned into a bounded score with
//!
//! ```text
//! similarity_score = 1 / (1 + distance)
//! ```
//!
//! so identical vectors score 1.0 and the score falls toward 0.0 as the
//! distance grows. The risk thresholds in [`crate::risk`] are calibrated
//! against this mapping; changing it is a breaking change.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::storage::Index;
use crate::types::RecordId;
use crate::vector::{first_non_finite, Deadline};

/// One ranked search hit. Produced per query, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Position of the matched track in the index.
    pub record: RecordId,

    /// Euclidean distance to the query.
    pub distance: f64,

    /// `1 / (1 + distance)`, in `[0, 1]`.
    pub similarity_score: f64,
}

/// Maps an L2 distance to a similarity score in `[0, 1]`.
///
/// Monotonically decreasing. A NaN argument maps to 0.0; searches never
/// produce one because stored and query vectors are always finite.
///
/// ```rust
/// use soundmatch::similarity_from_distance;
///
/// assert_eq!(similarity_from_distance(0.0), 1.0);
/// assert_eq!(similarity_from_distance(1.0), 0.5);
/// ```
#[inline]
pub fn similarity_from_distance(distance: f64) -> f64 {
    if distance.is_nan() {
        return 0.0;
    }
    1.0 / (1.0 + distance.max(0.0))
}

/// Runs k-nearest-neighbor queries, optionally under a deadline.
///
/// A `Searcher` holds no index state; build one per request or share one.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use soundmatch::{Index, IndexKind, Searcher, TrackRecord};
///
/// let mut index = Index::create(2, IndexKind::FlatL2).unwrap();
/// index.add(&[[0.0f32, 0.0], [3.0, 4.0]], vec![TrackRecord::new("a"), TrackRecord::new("b")]).unwrap();
///
/// let searcher = Searcher::new().with_timeout(Duration::from_secs(1));
/// let matches = searcher.search(&index, &[3.0, 4.0], 2).unwrap();
/// assert_eq!(matches[0].record.position(), 1);
/// assert_eq!(matches[0].similarity_score, 1.0);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Searcher {
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl Searcher {
    /// Creates a searcher without a deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives up at a fixed instant.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Gives up `timeout` after each search starts.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn effective_deadline(&self) -> Deadline {
        let from_timeout = self.timeout.and_then(|t| Instant::now().checked_add(t));
        match (self.deadline, from_timeout) {
            (Some(a), Some(b)) => Deadline::at(a.min(b)),
            (Some(a), None) | (None, Some(a)) => Deadline::at(a),
            (None, None) => Deadline::none(),
        }
    }

    /// Returns up to `k` matches sorted by ascending distance, ties broken
    /// by ascending insertion position.
    ///
    /// If the index holds fewer than `k` tracks, all of them are returned.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::DimensionMismatch`] if `query.len()` differs
    ///   from the index dimension (checked before any stored data is read)
    /// - [`ValidationError::MalformedInput`] if a query component is NaN or
    ///   infinite
    /// - [`SoundMatchError::Interrupted`](crate::SoundMatchError::Interrupted)
    ///   if the deadline passes mid-scan
    pub fn search(&self, index: &Index, query: &[f32], k: usize) -> Result<Vec<SearchMatch>> {
        if query.len() != index.dimension() {
            return Err(ValidationError::dimension_mismatch(index.dimension(), query.len()).into());
        }
        if let Some(i) = first_non_finite(query) {
            return Err(ValidationError::malformed(format!(
                "query component {} is not a finite number",
                i
            ))
            .into());
        }

        let neighbors = index.nearest(query, k, self.effective_deadline())?;
        let matches: Vec<SearchMatch> = neighbors
            .into_iter()
            .map(|n| SearchMatch {
                record: RecordId(n.position),
                distance: n.distance,
                similarity_score: similarity_from_distance(n.distance),
            })
            .collect();

        debug!(k, returned = matches.len(), indexed = index.len(), "Search complete");
        Ok(matches)
    }
}

/// Searches `index` for the `k` nearest neighbors of `query` with no deadline.
///
/// See [`Searcher::search`].
pub fn search(index: &Index, query: &[f32], k: usize) -> Result<Vec<SearchMatch>> {
    Searcher::new().search(index, query, k)
}
