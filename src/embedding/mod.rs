//! Embedding producer boundary.
//!
//! Turning audio into a fixed-length vector happens outside this crate.
//! This module only fixes the contract a producer must honor:
//!
//! - every vector it emits for a given [`AudioModel`] has the same length
//! - failures are reported as [`EmbeddingError`]s and never interpreted here
//!
//! # Example
//!
//! ```rust
//! use soundmatch::embedding::{AudioEmbedder, AudioModel, ExternalEmbedder};
//!
//! // Vectors are computed elsewhere and passed in by the caller
//! let embedder = ExternalEmbedder::for_model(AudioModel::Spectrogram);
//! assert_eq!(embedder.dimension(), 128);
//!
//! // It cannot extract on its own
//! assert!(embedder.extract("song.wav".as_ref()).is_err());
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{EmbeddingError, NotFoundError, Result, SoundMatchError};
use crate::types::Embedding;

/// Audio file extensions a producer is expected to accept.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["wav", "mp3", "flac", "ogg", "m4a", "aiff"];

/// Embedding model a vector was produced with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioModel {
    /// Mel-spectrogram statistics (128 dimensions).
    #[default]
    Spectrogram,
    /// OpenL3 music embeddings (512 dimensions).
    OpenL3,
    /// AudioCLIP embeddings (512 dimensions).
    AudioClip,
}

impl AudioModel {
    /// Model name as accepted by [`FromStr`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spectrogram => "spectrogram",
            Self::OpenL3 => "openl3",
            Self::AudioClip => "audioclip",
        }
    }

    /// Length of the vectors this model emits.
    pub const fn dimension(&self) -> usize {
        match self {
            Self::Spectrogram => 128,
            Self::OpenL3 | Self::AudioClip => 512,
        }
    }
}

impl fmt::Display for AudioModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioModel {
    type Err = SoundMatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spectrogram" => Ok(Self::Spectrogram),
            "openl3" => Ok(Self::OpenL3),
            "audioclip" => Ok(Self::AudioClip),
            other => Err(SoundMatchError::config(format!(
                "unknown audio model '{}' (expected spectrogram, openl3 or audioclip)",
                other
            ))),
        }
    }
}

/// One producer output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEmbedding {
    /// The embedding itself.
    pub vector: Embedding,
    /// Length of the source audio in seconds.
    pub duration_seconds: f64,
    /// Sample rate the audio was decoded at.
    pub sample_rate: u32,
    /// Model that produced `vector`.
    pub model: AudioModel,
}

/// Producer of audio embeddings.
///
/// Implementations must be thread-safe (`Send + Sync`) and must emit
/// vectors of exactly [`dimension`](Self::dimension) components.
///
/// # Implementing a Custom Producer
///
/// ```rust,ignore
/// use std::path::Path;
/// use soundmatch::embedding::{AudioEmbedder, AudioModel, ExtractedEmbedding};
/// use soundmatch::Result;
///
/// struct MelEmbedder;
///
/// impl AudioEmbedder for MelEmbedder {
///     fn extract(&self, path: &Path) -> Result<ExtractedEmbedding> {
///         soundmatch::embedding::validate_audio_path(path)?;
///         let (samples, rate) = decode(path)?;
///         Ok(ExtractedEmbedding {
///             vector: mel_statistics(&samples),
///             duration_seconds: samples.len() as f64 / rate as f64,
///             sample_rate: rate,
///             model: AudioModel::Spectrogram,
///         })
///     }
///
///     fn dimension(&self) -> usize {
///         128
///     }
/// }
/// ```
pub trait AudioEmbedder: Send + Sync {
    /// Extracts an embedding from an audio file.
    ///
    /// # Errors
    ///
    /// - [`NotFoundError::InputFile`] if the file does not exist
    /// - [`EmbeddingError::UnsupportedFormat`] if it cannot be decoded
    /// - [`EmbeddingError::Extraction`] if feature extraction fails
    fn extract(&self, path: &Path) -> Result<ExtractedEmbedding>;

    /// Length of every vector this producer emits.
    fn dimension(&self) -> usize;

    /// Checks a vector against [`dimension`](Self::dimension).
    fn validate_embedding(&self, embedding: &[f32]) -> Result<()> {
        let expected = self.dimension();
        if embedding.len() != expected {
            return Err(
                crate::error::ValidationError::dimension_mismatch(expected, embedding.len())
                    .into(),
            );
        }
        Ok(())
    }
}

/// Producer stand-in for vectors computed outside the process.
///
/// Knows the dimension so callers can validate vectors, but
/// [`extract`](AudioEmbedder::extract) always fails.
#[derive(Clone, Debug)]
pub struct ExternalEmbedder {
    dimension: usize,
}

impl ExternalEmbedder {
    /// Creates a stand-in with an explicit dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Creates a stand-in matching `model`'s output length.
    pub fn for_model(model: AudioModel) -> Self {
        Self::new(model.dimension())
    }
}

impl AudioEmbedder for ExternalEmbedder {
    fn extract(&self, path: &Path) -> Result<ExtractedEmbedding> {
        debug!(path = %path.display(), "Extraction requested from external embedder");
        Err(EmbeddingError::Extraction(
            "External embedding mode: embeddings must be provided by the caller".into(),
        )
        .into())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Creates the producer matching `config`'s embedding dimension.
pub fn create_embedder(config: &Config) -> Box<dyn AudioEmbedder> {
    Box::new(ExternalEmbedder::new(config.dimension()))
}

/// Checks that `path` exists and has a supported audio extension.
///
/// The extension check is case-insensitive.
pub fn validate_audio_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(NotFoundError::input_file(path).into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(EmbeddingError::UnsupportedFormat(format!(
            "'{}' (supported: {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        ))
        .into());
    }
    Ok(())
}
