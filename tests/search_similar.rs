//! Integration tests for similarity search.
//!
//! Verifies result ordering, tie-breaking, `k` larger than the index,
//! dimension validation, deadlines, and agreement between the flat and
//! HNSW structures.

use std::time::{Duration, Instant};

use soundmatch::{
    search, similarity_from_distance, ErrorKind, HnswConfig, Index, IndexKind, Searcher,
    SoundMatchError, TrackRecord,
};

/// Default embedding dimension for tests (spectrogram model).
const DIM: usize = 128;

/// Generates a deterministic embedding from a seed.
/// Vectors with close seeds produce similar embeddings (smooth sin curve).
fn make_embedding(seed: u64) -> Vec<f32> {
    (0..DIM)
        .map(|i| (seed as f32 * 0.1 + i as f32 * 0.01).sin())
        .collect()
}

/// Helper: index holding seeds `0..n` of the given kind.
fn populated_index(kind: IndexKind, n: u64) -> Index {
    let mut index = Index::create(DIM, kind).unwrap();
    let vectors: Vec<Vec<f32>> = (0..n).map(make_embedding).collect();
    let records = (0..n)
        .map(|i| TrackRecord::new(format!("song_{}.wav", i)))
        .collect();
    index.add(&vectors, records).unwrap();
    index
}

// ============================================================================
// Result Ordering
// ============================================================================

#[test]
fn test_search_returns_sorted() {
    let index = populated_index(IndexKind::FlatL2, 10);
    let results = search(&index, &make_embedding(5), 5).unwrap();

    assert_eq!(results.len(), 5);
    for window in results.windows(2) {
        assert!(window[0].distance <= window[1].distance);
        assert!(window[0].similarity_score >= window[1].similarity_score);
    }
    // Seed 5 itself is the closest
    assert_eq!(results[0].record.position(), 5);
}

#[test]
fn test_self_match_scores_one() {
    let index = populated_index(IndexKind::FlatL2, 100);

    for seed in [0u64, 42, 99] {
        let results = search(&index, &make_embedding(seed), 1).unwrap();
        assert_eq!(results[0].record.position(), seed as usize);
        assert_eq!(results[0].distance, 0.0);
        assert_eq!(results[0].similarity_score, 1.0);
    }
}

#[test]
fn test_ties_broken_by_insertion_order() {
    let mut index = Index::create(2, IndexKind::FlatL2).unwrap();
    index
        .add(
            &[[1.0f32, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]],
            (0..4).map(|i| TrackRecord::new(format!("{}.wav", i))).collect(),
        )
        .unwrap();

    let results = search(&index, &[0.0, 0.0], 4).unwrap();
    let positions: Vec<usize> = results.iter().map(|m| m.record.position()).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
    assert!(results.iter().all(|m| m.distance == 1.0));
    assert!(results.iter().all(|m| m.similarity_score == 0.5));
}

#[test]
fn test_scores_match_mapping() {
    let index = populated_index(IndexKind::FlatL2, 10);
    for m in search(&index, &make_embedding(3), 10).unwrap() {
        assert_eq!(m.similarity_score, similarity_from_distance(m.distance));
        assert!((0.0..=1.0).contains(&m.similarity_score));
    }
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_k_larger_than_index_returns_everything() {
    let index = populated_index(IndexKind::FlatL2, 7);
    let results = search(&index, &make_embedding(0), 100).unwrap();
    assert_eq!(results.len(), 7);
}

#[test]
fn test_search_empty_index() {
    let index = Index::create(DIM, IndexKind::FlatL2).unwrap();
    assert!(search(&index, &make_embedding(0), 10).unwrap().is_empty());
}

#[test]
fn test_dimension_mismatch_rejected() {
    let index = populated_index(IndexKind::FlatL2, 5);
    let err = search(&index, &[0.5; 64], 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}

#[test]
fn test_search_does_not_mutate_index() {
    let index = populated_index(IndexKind::FlatL2, 20);
    let before = index.to_bytes().unwrap();
    for seed in 0..5 {
        search(&index, &make_embedding(seed), 10).unwrap();
    }
    assert_eq!(index.to_bytes().unwrap(), before);
}

// ============================================================================
// Deadlines
// ============================================================================

#[test]
fn test_expired_deadline_interrupts() {
    let index = populated_index(IndexKind::FlatL2, 50);
    let err = Searcher::new()
        .with_deadline(Instant::now() - Duration::from_millis(1))
        .search(&index, &make_embedding(1), 5)
        .unwrap_err();

    assert!(matches!(err, SoundMatchError::Interrupted { total: 50, .. }));
    assert_eq!(err.kind(), ErrorKind::Interrupted);
}

#[test]
fn test_timeout_long_enough_completes() {
    let index = populated_index(IndexKind::FlatL2, 50);
    let results = Searcher::new()
        .with_timeout(Duration::from_secs(30))
        .search(&index, &make_embedding(1), 5)
        .unwrap();
    assert_eq!(results.len(), 5);
}

// ============================================================================
// HNSW
// ============================================================================

#[test]
fn test_hnsw_finds_exact_match() {
    let index = populated_index(IndexKind::Hnsw, 200);
    let results = search(&index, &make_embedding(77), 5).unwrap();

    assert_eq!(results[0].record.position(), 77);
    assert_eq!(results[0].similarity_score, 1.0);
    for window in results.windows(2) {
        assert!(window[0].distance <= window[1].distance);
    }
}

#[test]
fn test_hnsw_agrees_with_flat_on_small_set() {
    let flat = populated_index(IndexKind::FlatL2, 40);
    let hnsw = populated_index(IndexKind::Hnsw, 40);

    let query = make_embedding(12);
    let a: Vec<usize> = search(&flat, &query, 5)
        .unwrap()
        .iter()
        .map(|m| m.record.position())
        .collect();
    let b: Vec<usize> = search(&hnsw, &query, 5)
        .unwrap()
        .iter()
        .map(|m| m.record.position())
        .collect();
    assert_eq!(a, b);
}

#[test]
fn test_hnsw_survives_reload() {
    let index = populated_index(IndexKind::Hnsw, 60);
    let reloaded = Index::from_bytes_with(&index.to_bytes().unwrap(), &HnswConfig::default())
        .unwrap();

    assert_eq!(reloaded.kind(), IndexKind::Hnsw);
    let results = search(&reloaded, &make_embedding(30), 3).unwrap();
    assert_eq!(results[0].record.position(), 30);
}
