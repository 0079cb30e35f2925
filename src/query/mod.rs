//! Query results and the caller-facing response shape.
//!
//! [`QueryEngine`](crate::QueryEngine) produces a [`QueryResult`] on success.
//! [`QueryResponse`] is the flattened, JSON-ready form every caller (CLI,
//! service, test harness) consumes, including the canonical zero-value
//! failure.

mod response;
pub mod validation;

pub use response::{MatchSummary, QueryResponse};
pub use validation::{
    parse_embedding, validate_threshold, validate_top_k, MAX_TOP_K, MIN_TOP_K,
};

use crate::risk::{RiskAssessment, RiskLevel};
use crate::search::SearchMatch;
use crate::track::TrackRecord;

/// One ranked match with its metadata and per-match risk.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryMatch {
    /// Metadata of the matched track (cloned out of the index).
    pub record: TrackRecord,
    /// Ranking data.
    pub search: SearchMatch,
    /// Risk of this match alone.
    pub risk: RiskLevel,
}

/// Successful query outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    /// Matches in rank order.
    pub matches: Vec<QueryMatch>,
    /// Risk of the whole match set.
    pub overall: RiskAssessment,
}
