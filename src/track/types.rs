//! Type definitions for track metadata.

use serde::{Deserialize, Serialize};

/// Free-form metadata describing one indexed track.
///
/// Every field is optional in spirit: empty strings and a zero duration
/// are valid and mean "unknown". Only `year` is modeled as an `Option`
/// because the caller-facing response distinguishes a missing year (`null`)
/// from year zero.
///
/// # Example
///
/// ```rust
/// use soundmatch::TrackRecord;
///
/// let track = TrackRecord {
///     artist: "The Examples".into(),
///     year: Some(1999),
///     ..TrackRecord::new("intro.wav")
/// };
/// assert_eq!(track.filename, "intro.wav");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Source file name of the indexed audio.
    pub filename: String,

    /// Performing artist.
    pub artist: String,

    /// Album title.
    pub album: String,

    /// Genre label.
    pub genre: String,

    /// Track length in seconds.
    pub duration_seconds: f64,

    /// Release year, if known.
    pub year: Option<i32>,
}

impl TrackRecord {
    /// Creates a record with only the filename set.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_filename_only() {
        let track = TrackRecord::new("a.wav");
        assert_eq!(track.filename, "a.wav");
        assert!(track.artist.is_empty());
        assert_eq!(track.duration_seconds, 0.0);
        assert!(track.year.is_none());
    }

    #[test]
    fn test_bincode_roundtrip() {
        let track = TrackRecord {
            filename: "song.flac".into(),
            artist: "Artist".into(),
            album: "Album".into(),
            genre: "Jazz".into(),
            duration_seconds: 201.5,
            year: Some(2021),
        };
        let bytes = bincode::serialize(&track).unwrap();
        let restored: TrackRecord = bincode::deserialize(&bytes).unwrap();
        assert_eq!(track, restored);
    }
}
