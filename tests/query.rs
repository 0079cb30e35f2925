//! Integration tests for the query pipeline.
//!
//! Tests the full stack: QueryEngine → Index file → Searcher →
//! RiskClassifier → QueryResponse. Verifies validation order, the canonical
//! failure shape, risk bands, and the async entry point.

use soundmatch::{
    Config, ErrorKind, Index, IndexKind, QueryEngine, QueryResponse, RiskLevel, TrackRecord,
};
use tempfile::tempdir;

const DIM: usize = 4;

fn embedding_json(v: &[f32]) -> String {
    serde_json::to_string(v).unwrap()
}

/// Helper: write a small index and return its path.
///
/// Distances from the origin query are 0.0, 0.1, 0.5, 1.0 and 3.0, giving
/// similarities 1.0, ~0.909, ~0.667, 0.5 and 0.25.
fn write_index(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let mut index = Index::create(DIM, IndexKind::FlatL2).unwrap();
    let vectors = [
        [0.0f32, 0.0, 0.0, 0.0],
        [0.1, 0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 3.0, 0.0],
    ];
    let records = vec![
        TrackRecord {
            filename: "original.wav".into(),
            artist: "The Originals".into(),
            album: "First".into(),
            genre: "Rock".into(),
            duration_seconds: 212.5,
            year: Some(1994),
        },
        TrackRecord::new("cover.mp3"),
        TrackRecord::new("remix.flac"),
        TrackRecord::new("sample.ogg"),
        TrackRecord::new("unrelated.wav"),
    ];
    index.add(&vectors, records).unwrap();

    let path = dir.path().join("tracks.smix");
    index.save_to(&path).unwrap();
    path
}

fn engine() -> QueryEngine {
    QueryEngine::new(Config::default()).unwrap()
}

// ============================================================================
// Successful Queries
// ============================================================================

#[test]
fn test_query_ranks_and_classifies() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    let result = engine()
        .query(&embedding_json(&[0.0; DIM]), &path, 5, 0.6)
        .unwrap();

    let levels: Vec<RiskLevel> = result.matches.iter().map(|m| m.risk).collect();
    assert_eq!(
        levels,
        vec![
            RiskLevel::VeryHigh,
            RiskLevel::High,
            RiskLevel::Medium,
            RiskLevel::Low,
            RiskLevel::VeryLow,
        ]
    );
    assert_eq!(result.overall.level, RiskLevel::VeryHigh);
    assert_eq!(result.overall.score, 1.0);
    assert_eq!(result.matches[0].record.artist, "The Originals");
}

#[test]
fn test_query_response_shape() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    let response = engine().query_response(&embedding_json(&[0.0; DIM]), &path, 2, 0.8);
    assert!(response.success);
    assert_eq!(response.total_matches, 2);
    assert_eq!(response.overall_risk, RiskLevel::VeryHigh);

    let json: serde_json::Value = serde_json::from_str(&response.to_json()).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["overallRisk"], "VERY_HIGH");
    assert_eq!(json["totalMatches"], 2);
    let first = &json["matches"][0];
    assert_eq!(first["filename"], "original.wav");
    assert_eq!(first["similarityScore"], 1.0);
    assert_eq!(first["distance"], 0.0);
    assert_eq!(first["copyrightRisk"], "VERY_HIGH");
    assert_eq!(first["duration"], 212.5);
    assert_eq!(first["year"], 1994);
}

#[test]
fn test_best_match_drives_overall_risk() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    // Query sits on "unrelated.wav"; everything else is far away
    let result = engine()
        .query(&embedding_json(&[0.0, 0.0, 3.0, 0.0]), &path, 3, 0.8)
        .unwrap();
    assert_eq!(result.matches[0].record.filename, "unrelated.wav");
    assert_eq!(result.overall.level, RiskLevel::VeryHigh);

    // A query far from everything lands in VERY_LOW
    let result = engine()
        .query(&embedding_json(&[50.0, 50.0, 50.0, 50.0]), &path, 3, 0.8)
        .unwrap();
    assert_eq!(result.overall.level, RiskLevel::VeryLow);
    assert!(result.overall.score < 0.5);
}

#[test]
fn test_top_k_larger_than_index() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    let result = engine()
        .query(&embedding_json(&[0.0; DIM]), &path, 100, 0.8)
        .unwrap();
    assert_eq!(result.matches.len(), 5);
}

#[test]
fn test_query_with_defaults() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    let result = engine()
        .query_with_defaults(&embedding_json(&[0.0; DIM]), &path)
        .unwrap();
    assert_eq!(result.matches.len(), 5);
}

#[test]
fn test_query_empty_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.smix");
    Index::create(DIM, IndexKind::FlatL2).unwrap().save_to(&path).unwrap();

    let result = engine()
        .query(&embedding_json(&[0.0; DIM]), &path, 10, 0.8)
        .unwrap();
    assert!(result.matches.is_empty());
    assert_eq!(result.overall.level, RiskLevel::VeryLow);
    assert_eq!(result.overall.score, 0.0);
}

// ============================================================================
// Failures
// ============================================================================

fn assert_canonical_failure(response: &QueryResponse) {
    assert!(!response.success);
    assert!(response.error.is_some());
    assert!(response.matches.is_empty());
    assert_eq!(response.overall_risk, RiskLevel::Unknown);
    assert_eq!(response.risk_score, 0.0);
    assert_eq!(response.total_matches, 0);
}

#[test]
fn test_top_k_out_of_range_gives_canonical_failure() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);
    let json = embedding_json(&[0.0; DIM]);

    for top_k in [0, 101] {
        let response = engine().query_response(&json, &path, top_k, 0.8);
        assert_canonical_failure(&response);
    }
}

#[test]
fn test_threshold_out_of_range() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    let err = engine()
        .query(&embedding_json(&[0.0; DIM]), &path, 5, -0.1)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn test_missing_index_path() {
    let dir = tempdir().unwrap();
    let err = engine()
        .query(&embedding_json(&[0.0; DIM]), dir.path().join("nope.smix"), 5, 0.8)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let response =
        engine().query_response(&embedding_json(&[0.0; DIM]), dir.path().join("nope.smix"), 5, 0.8);
    assert_canonical_failure(&response);
}

#[test]
fn test_malformed_embedding() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    for bad in ["", "not json", "{\"a\": 1}", "[1, \"two\"]", "[]"] {
        let err = engine().query(bad, &path, 5, 0.8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput, "input {:?}", bad);
    }
}

#[test]
fn test_wrong_dimension_query() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);

    let err = engine()
        .query(&embedding_json(&[0.0; 3]), &path, 5, 0.8)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}

#[test]
fn test_corrupt_index_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.smix");
    std::fs::write(&path, b"SMIX but not really").unwrap();

    let err = engine()
        .query(&embedding_json(&[0.0; DIM]), &path, 5, 0.8)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptIndex);
}

#[test]
fn test_index_file_with_nan_component() {
    let dir = tempdir().unwrap();
    for kind in [IndexKind::FlatL2, IndexKind::Hnsw] {
        let mut index = Index::create(DIM, kind).unwrap();
        index
            .add(&[[0.0f32, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]], vec![TrackRecord::new("a.wav"), TrackRecord::new("b.wav")])
            .unwrap();
        let mut bytes = index.to_bytes().unwrap();
        // First vector component follows the 24-byte header and the
        // sequence length.
        bytes[32..36].copy_from_slice(&f32::NAN.to_le_bytes());
        let path = dir.path().join(format!("{:?}.smix", kind));
        std::fs::write(&path, &bytes).unwrap();

        let query = embedding_json(&[0.0; DIM]);
        let err = engine().query(&query, &path, 2, 0.8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);
        assert_canonical_failure(&engine().query_response(&query, &path, 2, 0.8));
    }
}

// ============================================================================
// Async
// ============================================================================

#[tokio::test]
async fn test_query_async_matches_sync() {
    let dir = tempdir().unwrap();
    let path = write_index(&dir);
    let json = embedding_json(&[0.1, 0.0, 0.0, 0.0]);

    let sync = engine().query(&json, &path, 3, 0.8).unwrap();
    let async_result = engine().query_async(&json, &path, 3, 0.8).await.unwrap();
    assert_eq!(sync, async_result);
}

#[tokio::test]
async fn test_query_async_validation_errors() {
    let dir = tempdir().unwrap();
    let err = engine()
        .query_async("[0.0, 0.0, 0.0, 0.0]", dir.path().join("nope.smix"), 5, 0.8)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
