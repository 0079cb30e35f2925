//! Demo index generation.
//!
//! Produces a small index of random vectors with synthetic metadata so the
//! query pipeline can be exercised without a real catalogue. Nothing in the
//! engine calls this on its own; callers opt in explicitly.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, instrument};

use crate::error::Result;
use crate::storage::Index;
use crate::track::TrackRecord;
use crate::vector::IndexKind;

/// Tracks written by [`ensure_demo_index`].
pub const DEMO_TRACK_COUNT: usize = 100;

/// Seed used by [`ensure_demo_index`].
pub const DEMO_SEED: u64 = 42;

const GENRES: [&str; 3] = ["Rock", "Pop", "Jazz"];

/// Synthetic metadata for demo track `i`.
pub fn demo_record(i: usize) -> TrackRecord {
    TrackRecord {
        filename: format!("demo_song_{}.wav", i),
        artist: format!("Demo Artist {}", i / 10),
        album: format!("Demo Album {}", i / 20),
        genre: GENRES[i % GENRES.len()].to_string(),
        duration_seconds: (180 + i % 60) as f64,
        year: Some(2020 + (i % 5) as i32),
    }
}

/// Builds a flat index of `count` uniformly random `[0, 1)` vectors.
///
/// The same `seed` always yields the same index.
///
/// ```rust
/// use soundmatch::bootstrap::demo_index;
///
/// let index = demo_index(8, 25, 7).unwrap();
/// assert_eq!(index.len(), 25);
/// assert_eq!(index.records()[12].genre, "Rock");
/// ```
pub fn demo_index(dimension: usize, count: usize, seed: u64) -> Result<Index> {
    let mut rng = StdRng::seed_from_u64(seed);

    let vectors: Vec<Vec<f32>> = (0..count)
        .map(|_| (0..dimension).map(|_| rng.random::<f32>()).collect())
        .collect();
    let records = (0..count).map(demo_record).collect();

    let mut index = Index::create(dimension, IndexKind::FlatL2)?;
    index.add(&vectors, records)?;
    Ok(index)
}

/// Writes a demo index to `path` unless something is already there.
///
/// Returns `true` if a new index was written, `false` if `path` existed.
#[instrument(fields(path = %path.as_ref().display()))]
pub fn ensure_demo_index(path: impl AsRef<Path>, dimension: usize) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }

    let index = demo_index(dimension, DEMO_TRACK_COUNT, DEMO_SEED)?;
    index.save_to(path)?;
    info!(tracks = index.len(), dimension, "Demo index created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_record_metadata() {
        let r = demo_record(47);
        assert_eq!(r.filename, "demo_song_47.wav");
        assert_eq!(r.artist, "Demo Artist 4");
        assert_eq!(r.album, "Demo Album 2");
        assert_eq!(r.genre, "Jazz");
        assert_eq!(r.duration_seconds, 227.0);
        assert_eq!(r.year, Some(2022));
    }

    #[test]
    fn test_demo_index_is_seeded() {
        let a = demo_index(4, 10, 1).unwrap();
        let b = demo_index(4, 10, 1).unwrap();
        assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());

        let v = a.vector(crate::types::RecordId(3)).unwrap();
        assert!(v.iter().all(|x| (0.0..1.0).contains(x)));
    }

    #[test]
    fn test_ensure_demo_index_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("demo.smix");

        assert!(ensure_demo_index(&path, 16).unwrap());
        let first = std::fs::read(&path).unwrap();

        assert!(!ensure_demo_index(&path, 32).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), first);
        assert_eq!(Index::open(&path).unwrap().len(), DEMO_TRACK_COUNT);
    }
}
