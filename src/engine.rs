//! Query orchestration.
//!
//! [`QueryEngine`] validates a request, drives the [`Searcher`] and the
//! [`RiskClassifier`], and assembles a [`QueryResult`]. Validation is
//! fail-fast and all-or-nothing: the first failing step ends the query and
//! no partial result is ever produced.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use soundmatch::{Config, QueryEngine};
//!
//! let engine = QueryEngine::new(Config::default())?;
//!
//! // Typed result
//! let result = engine.query("[0.12, 0.40, ...]", "./tracks.smix", 10, 0.8)?;
//!
//! // Or the JSON shape for external callers; never fails
//! let response = engine.query_response("[0.12, 0.40, ...]", "./tracks.smix", 10, 0.8);
//! println!("{}", response.to_json());
//! ```
//!
//! # Thread Safety
//!
//! `QueryEngine` is stateless across calls and `Send + Sync`. Queries over
//! a shared `Arc<Index>` may run concurrently through
//! [`query_index`](QueryEngine::query_index).

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{NotFoundError, Result, SoundMatchError};
use crate::query::{parse_embedding, validate_threshold, validate_top_k};
use crate::query::{QueryMatch, QueryResponse, QueryResult};
use crate::risk::RiskClassifier;
use crate::search::Searcher;
use crate::storage::Index;

/// Entry point for similarity and copyright-risk queries.
#[derive(Clone, Debug)]
pub struct QueryEngine {
    config: Config,
}

impl QueryEngine {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns a validation error (category `ConfigError`) if the config is
    /// invalid (see [`Config::validate`]).
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(SoundMatchError::from)?;
        Ok(Self { config })
    }

    /// Configuration this engine was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Searcher honoring the configured timeout.
    pub fn searcher(&self) -> Searcher {
        match self.config.search_timeout {
            Some(timeout) => Searcher::new().with_timeout(timeout),
            None => Searcher::new(),
        }
    }

    /// Runs a query against an index file.
    ///
    /// # Validation Order
    ///
    /// 1. parse `embedding_json` (`MalformedInputError`)
    /// 2. `1 <= top_k <= 100` (`RangeError`)
    /// 3. `0.0 <= similarity_threshold <= 1.0` (`RangeError`)
    /// 4. `index_path` exists (`NotFoundError`)
    /// 5. load, search, classify
    #[instrument(skip(self, embedding_json), fields(index_path = %index_path.as_ref().display()))]
    pub fn query(
        &self,
        embedding_json: &str,
        index_path: impl AsRef<Path>,
        top_k: usize,
        similarity_threshold: f64,
    ) -> Result<QueryResult> {
        let (query, classifier) = self.validate(embedding_json, top_k, similarity_threshold)?;
        let index_path = resolve_index_path(index_path.as_ref())?;

        let index = Index::open_with(&index_path, &self.config.hnsw)?;
        self.run(&index, &query, top_k, &classifier)
    }

    /// Runs a query with the configured default `top_k` and threshold.
    pub fn query_with_defaults(
        &self,
        embedding_json: &str,
        index_path: impl AsRef<Path>,
    ) -> Result<QueryResult> {
        self.query(
            embedding_json,
            index_path,
            self.config.default_top_k,
            self.config.default_similarity_threshold,
        )
    }

    /// Runs a query against an already loaded index.
    ///
    /// Validates `top_k` and the threshold like [`query`](Self::query).
    pub fn query_index(
        &self,
        index: &Index,
        query: &[f32],
        top_k: usize,
        similarity_threshold: f64,
    ) -> Result<QueryResult> {
        validate_top_k(top_k)?;
        let classifier = validate_threshold(similarity_threshold)?;
        self.run(index, query, top_k, &classifier)
    }

    /// Runs [`query`](Self::query) and folds any failure into the
    /// canonical failure response. Never fails.
    pub fn query_response(
        &self,
        embedding_json: &str,
        index_path: impl AsRef<Path>,
        top_k: usize,
        similarity_threshold: f64,
    ) -> QueryResponse {
        let result = self.query(embedding_json, index_path, top_k, similarity_threshold);
        if let Err(e) = &result {
            warn!(kind = %e.kind(), error = %e, "Query failed");
        }
        result.into()
    }

    /// Async variant of [`query`](Self::query).
    ///
    /// Validation runs inline; the index load (the only blocking I/O) and
    /// the search run on tokio's blocking pool. Must be called from within
    /// a tokio runtime.
    pub async fn query_async(
        &self,
        embedding_json: &str,
        index_path: impl AsRef<Path>,
        top_k: usize,
        similarity_threshold: f64,
    ) -> Result<QueryResult> {
        let (query, classifier) = self.validate(embedding_json, top_k, similarity_threshold)?;
        let index_path = resolve_index_path(index_path.as_ref())?;

        let engine = self.clone();
        tokio::task::spawn_blocking(move || {
            let index = Index::open_with(&index_path, &engine.config.hnsw)?;
            engine.run(&index, &query, top_k, &classifier)
        })
        .await
        .map_err(|e| SoundMatchError::vector(format!("Query task failed: {}", e)))?
    }

    /// Steps 1-3 of the pipeline.
    fn validate(
        &self,
        embedding_json: &str,
        top_k: usize,
        similarity_threshold: f64,
    ) -> Result<(Vec<f32>, RiskClassifier)> {
        let query = parse_embedding(embedding_json)?;
        validate_top_k(top_k)?;
        let classifier = validate_threshold(similarity_threshold)?;
        Ok((query, classifier))
    }

    /// Step 5: search, classify each match, aggregate.
    fn run(
        &self,
        index: &Index,
        query: &[f32],
        top_k: usize,
        classifier: &RiskClassifier,
    ) -> Result<QueryResult> {
        let hits = self.searcher().search(index, query, top_k)?;
        let overall = classifier.classify_aggregate(&hits);

        let matches = hits
            .into_iter()
            .map(|hit| -> Result<QueryMatch> {
                let record = index.get_record(hit.record)?.clone();
                Ok(QueryMatch {
                    record,
                    search: hit,
                    risk: classifier.classify_match(hit.similarity_score),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            matches = matches.len(),
            overall_risk = %overall.level,
            risk_score = overall.score,
            "Query complete"
        );
        Ok(QueryResult { matches, overall })
    }
}

/// Step 4: the index file must exist.
fn resolve_index_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        debug!(path = %path.display(), "Index path does not exist");
        return Err(NotFoundError::index(path).into());
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::risk::RiskLevel;
    use crate::track::TrackRecord;
    use crate::vector::IndexKind;

    fn small_index() -> Index {
        let mut index = Index::create(2, IndexKind::FlatL2).unwrap();
        index
            .add(
                &[[0.0f32, 0.0], [0.1, 0.0], [5.0, 5.0]],
                vec![
                    TrackRecord::new("origin.wav"),
                    TrackRecord::new("near.wav"),
                    TrackRecord::new("far.wav"),
                ],
            )
            .unwrap();
        index
    }

    fn engine() -> QueryEngine {
        QueryEngine::new(Config::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = QueryEngine::new(Config {
            default_top_k: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_query_index_assembles_result() {
        let result = engine().query_index(&small_index(), &[0.0, 0.0], 3, 0.8).unwrap();

        let names: Vec<&str> = result.matches.iter().map(|m| m.record.filename.as_str()).collect();
        assert_eq!(names, vec!["origin.wav", "near.wav", "far.wav"]);
        assert_eq!(result.matches[0].risk, RiskLevel::VeryHigh);
        assert_eq!(result.matches[2].risk, RiskLevel::VeryLow);
        assert_eq!(result.overall.level, RiskLevel::VeryHigh);
        assert_eq!(result.overall.score, 1.0);
    }

    #[test]
    fn test_query_index_validates_ranges() {
        let index = small_index();
        let e = engine();
        assert_eq!(
            e.query_index(&index, &[0.0, 0.0], 0, 0.8).unwrap_err().kind(),
            ErrorKind::Range
        );
        assert_eq!(
            e.query_index(&index, &[0.0, 0.0], 3, 1.5).unwrap_err().kind(),
            ErrorKind::Range
        );
        assert_eq!(
            e.query_index(&index, &[0.0], 3, 0.8).unwrap_err().kind(),
            ErrorKind::DimensionMismatch
        );
    }

    #[test]
    fn test_query_index_rejects_non_finite_query() {
        let e = engine();
        for kind in [IndexKind::FlatL2, IndexKind::Hnsw] {
            let mut index = Index::create(2, kind).unwrap();
            index
                .add(&[[0.0f32, 0.0], [1.0, 1.0]], vec![TrackRecord::new("a.wav"), TrackRecord::new("b.wav")])
                .unwrap();
            for bad in [f32::NAN, f32::INFINITY] {
                let err = e.query_index(&index, &[bad, 0.0], 2, 0.8).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::MalformedInput);
            }
        }
    }

    #[test]
    fn test_malformed_input_wins_over_range() {
        // Both the embedding and top_k are bad; parsing runs first
        let err = engine()
            .query("nope", "/definitely/missing.smix", 0, 0.8)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_range_wins_over_missing_index() {
        let err = engine()
            .query("[0.0, 0.0]", "/definitely/missing.smix", 101, 0.8)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_missing_index_is_not_found() {
        let err = engine()
            .query("[0.0, 0.0]", "/definitely/missing.smix", 5, 0.8)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QueryEngine>();
    }
}
