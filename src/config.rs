//! Configuration types for SoundMatch.
//!
//! The [`Config`] struct controls engine behavior including:
//! - Embedding dimension (128, 512, or custom)
//! - Index structure (exhaustive flat L2 or HNSW)
//! - Query defaults and an optional per-search deadline
//!
//! # Example
//! ```rust
//! use soundmatch::{Config, EmbeddingDimension, IndexKind};
//!
//! // Use defaults (flat L2, 128 dimensions)
//! let config = Config::default();
//!
//! // OpenL3 embeddings behind an HNSW graph
//! let config = Config {
//!     embedding_dimension: EmbeddingDimension::D512,
//!     index_kind: IndexKind::Hnsw,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::query::validation::{MAX_TOP_K, MIN_TOP_K};
use crate::storage::schema::MAX_DIMENSION;
use crate::vector::IndexKind;

/// Engine configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings:
///
/// ```rust
/// use soundmatch::Config;
///
/// let config = Config {
///     default_top_k: 25,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Embedding vector dimension (must match the producer's output).
    pub embedding_dimension: EmbeddingDimension,

    /// Index structure used for newly created indexes.
    pub index_kind: IndexKind,

    /// HNSW tuning parameters (only used by [`IndexKind::Hnsw`]).
    pub hnsw: HnswConfig,

    /// Number of matches returned when the caller does not ask for a count.
    ///
    /// Default: 10
    pub default_top_k: usize,

    /// Similarity threshold separating MEDIUM from LOW risk when the caller
    /// does not supply one.
    ///
    /// Default: 0.8
    pub default_similarity_threshold: f64,

    /// Deadline applied to every search, measured from its start.
    ///
    /// `None` disables the deadline.
    pub search_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // 128 matches the spectrogram model, the default producer
            embedding_dimension: EmbeddingDimension::D128,
            index_kind: IndexKind::FlatL2,
            hnsw: HnswConfig::default(),
            default_top_k: 10,
            default_similarity_threshold: 0.8,
            search_timeout: None,
        }
    }
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// Called automatically by [`QueryEngine::new`](crate::QueryEngine::new).
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - Custom dimension is 0 or > 4096
    /// - `default_top_k` is outside `1..=100`
    /// - `default_similarity_threshold` is outside `0.0..=1.0`
    /// - any HNSW parameter is 0
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let EmbeddingDimension::Custom(dim) = self.embedding_dimension {
            if dim == 0 {
                return Err(ValidationError::invalid_field(
                    "embedding_dimension",
                    "custom dimension must be greater than 0",
                ));
            }
            if dim > MAX_DIMENSION {
                return Err(ValidationError::invalid_field(
                    "embedding_dimension",
                    format!("custom dimension must not exceed {}", MAX_DIMENSION),
                ));
            }
        }

        if !(MIN_TOP_K..=MAX_TOP_K).contains(&self.default_top_k) {
            return Err(ValidationError::invalid_field(
                "default_top_k",
                format!(
                    "must be between {} and {}, got {}",
                    MIN_TOP_K, MAX_TOP_K, self.default_top_k
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.default_similarity_threshold) {
            return Err(ValidationError::invalid_field(
                "default_similarity_threshold",
                format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.default_similarity_threshold
                ),
            ));
        }

        self.hnsw.validate()
    }

    /// Returns the embedding dimension as a numeric value.
    pub fn dimension(&self) -> usize {
        self.embedding_dimension.size()
    }
}

/// Embedding vector dimensions.
///
/// Standard dimensions are provided for the supported audio models. Use
/// `Custom` for anything else.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingDimension {
    /// 128 dimensions (mel-spectrogram statistics, default model).
    #[default]
    D128,

    /// 512 dimensions (OpenL3 and AudioCLIP).
    D512,

    /// Custom dimension for other embedding models.
    ///
    /// Must be between 1 and 4096.
    Custom(usize),
}

impl EmbeddingDimension {
    /// Returns the numeric size of this dimension.
    ///
    /// # Example
    /// ```rust
    /// use soundmatch::EmbeddingDimension;
    ///
    /// assert_eq!(EmbeddingDimension::D128.size(), 128);
    /// assert_eq!(EmbeddingDimension::D512.size(), 512);
    /// assert_eq!(EmbeddingDimension::Custom(64).size(), 64);
    /// ```
    #[inline]
    pub const fn size(&self) -> usize {
        match self {
            Self::D128 => 128,
            Self::D512 => 512,
            Self::Custom(n) => *n,
        }
    }
}

/// HNSW graph parameters.
///
/// Larger `ef_search` improves recall at the cost of latency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswConfig {
    /// Maximum neighbors per node per layer.
    pub max_nb_connection: usize,

    /// Candidate list size while building the graph.
    pub ef_construction: usize,

    /// Candidate list size while searching. Raised to `k` when smaller.
    pub ef_search: usize,

    /// Maximum number of graph layers.
    pub max_layer: usize,

    /// Capacity hint for the graph.
    pub max_elements: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            max_nb_connection: 16,
            ef_construction: 200,
            ef_search: 64,
            max_layer: 16,
            max_elements: 10_000,
        }
    }
}

impl HnswConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("hnsw.max_nb_connection", self.max_nb_connection),
            ("hnsw.ef_construction", self.ef_construction),
            ("hnsw.ef_search", self.ef_search),
            ("hnsw.max_layer", self.max_layer),
            ("hnsw.max_elements", self.max_elements),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(ValidationError::invalid_field(
                    field,
                    "must be greater than 0",
                ));
            }
        }
        Ok(())
    }
}
