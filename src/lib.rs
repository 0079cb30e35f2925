//! # SoundMatch
//!
//! Audio similarity search and copyright-risk scoring over a persistent
//! embedding index.
//!
//! SoundMatch stores fixed-length audio embeddings next to track metadata,
//! answers k-nearest-neighbor queries by Euclidean distance, and turns the
//! closest matches into a copyright risk assessment.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use soundmatch::{Config, Index, IndexKind, QueryEngine, TrackRecord};
//!
//! // Build and persist an index
//! let mut index = Index::create(128, IndexKind::FlatL2)?;
//! index.add(&catalogue_vectors, catalogue_records)?;
//! index.save_to("./tracks.smix")?;
//!
//! // Query it
//! let engine = QueryEngine::new(Config::default())?;
//! let response = engine.query_response(&embedding_json, "./tracks.smix", 10, 0.8);
//! println!("{}", response.to_json());
//! ```
//!
//! ## Key Concepts
//!
//! ### Index
//!
//! An **index** holds vectors of one fixed dimension and a parallel list of
//! [`TrackRecord`]s. Position `i` in one is position `i` in the other.
//! Appends are all-or-nothing and the on-disk form round-trips exactly.
//!
//! ### Similarity
//!
//! Matches are ranked by L2 distance and scored with
//! `similarity = 1 / (1 + distance)`, so an exact duplicate scores 1.0.
//!
//! ### Risk
//!
//! Each match gets a [`RiskLevel`] from fixed bands plus a caller-supplied
//! threshold. The overall assessment is the risk of the single best match.
//!
//! ## Thread Safety
//!
//! A loaded [`Index`] is immutable from a searcher's point of view and can
//! be shared across threads with `Arc`. [`SharedIndex`] lets one writer
//! append while searches keep running against consistent snapshots.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod engine;
mod error;
mod types;

pub mod bootstrap;
pub mod embedding;
pub mod storage;

// Domain modules
mod query;
mod risk;
mod search;
mod track;

/// Vector index module: flat L2 scan and HNSW structures.
pub mod vector;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main query interface
pub use engine::QueryEngine;

// Configuration
pub use config::{Config, EmbeddingDimension, HnswConfig};

// Error handling
pub use error::{
    EmbeddingError, ErrorKind, NotFoundError, Result, SoundMatchError, StorageError,
    ValidationError,
};

// Core types
pub use types::{Embedding, RecordId};

// Domain types
pub use track::TrackRecord;
pub use query::{
    parse_embedding, validate_threshold, validate_top_k, MatchSummary, QueryMatch,
    QueryResponse, QueryResult, MAX_TOP_K, MIN_TOP_K,
};
pub use risk::{classify_match, RiskAssessment, RiskClassifier, RiskLevel};

// Search
pub use search::{search, similarity_from_distance, SearchMatch, Searcher};

// Storage
pub use storage::{Index, SharedIndex};
pub use vector::{IndexKind, VectorIndex};

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common SoundMatch usage.
///
/// ```rust
/// use soundmatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, EmbeddingDimension};
    pub use crate::engine::QueryEngine;
    pub use crate::error::{Result, SoundMatchError};
    pub use crate::query::{QueryResponse, QueryResult};
    pub use crate::risk::{RiskAssessment, RiskLevel};
    pub use crate::search::SearchMatch;
    pub use crate::storage::Index;
    pub use crate::track::TrackRecord;
    pub use crate::vector::IndexKind;
}
