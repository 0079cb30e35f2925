//! JSON result shape exposed to callers.
//!
//! ```json
//! { "success": true,
//!   "error": null,
//!   "matches": [ { "filename": "...", "artist": "...", "album": "...",
//!                  "genre": "...", "similarityScore": 0.97, "distance": 0.03,
//!                  "copyrightRisk": "VERY_HIGH", "duration": 201.0,
//!                  "year": 2019 } ],
//!   "overallRisk": "VERY_HIGH", "riskScore": 0.97, "totalMatches": 1 }
//! ```
//!
//! On failure: `success=false`, `matches=[]`, `overallRisk="UNKNOWN"`,
//! `riskScore=0.0`, `totalMatches=0`, and `error` holds the cause.

use serde::{Deserialize, Serialize};

use crate::error::SoundMatchError;
use crate::risk::{RiskAssessment, RiskLevel};

use super::{QueryMatch, QueryResult};

/// Structured query response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Whether the query succeeded.
    pub success: bool,
    /// Human-readable failure cause, `null` on success.
    pub error: Option<String>,
    /// Ranked matches.
    pub matches: Vec<MatchSummary>,
    /// Overall risk level.
    pub overall_risk: RiskLevel,
    /// Overall risk score.
    pub risk_score: f64,
    /// Number of entries in `matches`.
    pub total_matches: usize,
}

/// One match as exposed to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    /// Source file name.
    pub filename: String,
    /// Performing artist.
    pub artist: String,
    /// Album title.
    pub album: String,
    /// Genre label.
    pub genre: String,
    /// Similarity in `[0, 1]`.
    pub similarity_score: f64,
    /// L2 distance to the query.
    pub distance: f64,
    /// Risk of this match alone.
    pub copyright_risk: RiskLevel,
    /// Track length in seconds.
    pub duration: f64,
    /// Release year, if known.
    pub year: Option<i32>,
}

impl From<QueryMatch> for MatchSummary {
    fn from(m: QueryMatch) -> Self {
        Self {
            filename: m.record.filename,
            artist: m.record.artist,
            album: m.record.album,
            genre: m.record.genre,
            similarity_score: m.search.similarity_score,
            distance: m.search.distance,
            copyright_risk: m.risk,
            duration: m.record.duration_seconds,
            year: m.record.year,
        }
    }
}

impl QueryResponse {
    /// Canonical zero-value failure.
    pub fn failure(error: &SoundMatchError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            matches: Vec::new(),
            overall_risk: RiskAssessment::UNKNOWN.level,
            risk_score: RiskAssessment::UNKNOWN.score,
            total_matches: 0,
        }
    }

    /// Serializes to a compact JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "error": format!("Failed to serialize response: {}", e),
                "matches": [],
                "overallRisk": "UNKNOWN",
                "riskScore": 0.0,
                "totalMatches": 0,
            })
            .to_string()
        })
    }
}

impl From<QueryResult> for QueryResponse {
    fn from(result: QueryResult) -> Self {
        let matches: Vec<MatchSummary> = result.matches.into_iter().map(Into::into).collect();
        Self {
            success: true,
            error: None,
            total_matches: matches.len(),
            matches,
            overall_risk: result.overall.level,
            risk_score: result.overall.score,
        }
    }
}

impl From<Result<QueryResult, SoundMatchError>> for QueryResponse {
    fn from(result: Result<QueryResult, SoundMatchError>) -> Self {
        match result {
            Ok(r) => r.into(),
            Err(e) => Self::failure(&e),
        }
    }
}
