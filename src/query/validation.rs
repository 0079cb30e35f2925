//! Input validation for queries.
//!
//! Each check maps to one step of the query pipeline and fails with the
//! category callers see in the response:
//!
//! ```text
//! QueryEngine::query()
//!     ├── parse_embedding()      ← MalformedInputError
//!     ├── validate_top_k()       ← RangeError
//!     ├── validate_threshold()   ← RangeError
//!     ├── resolve index path     ← NotFoundError
//!     └── search + classify      ← only reached if all of the above pass
//! ```

use crate::error::{Result, ValidationError};
use crate::risk::RiskClassifier;
use crate::types::Embedding;

/// Smallest `top_k` a query may ask for.
pub const MIN_TOP_K: usize = 1;

/// Largest `top_k` a query may ask for.
pub const MAX_TOP_K: usize = 100;

/// Parses a JSON array of numbers into an embedding.
///
/// # Rules
///
/// | Input | Result |
/// |-------|--------|
/// | `[0.1, 2, -3e-2]` | three-component vector |
/// | not JSON, not an array, nested arrays, strings, nulls | `MalformedInput` |
/// | `[]` | `MalformedInput` |
/// | a value beyond f32 range (e.g. `1e39`) | `MalformedInput` |
pub fn parse_embedding(embedding_json: &str) -> Result<Embedding> {
    let values: Vec<f64> = serde_json::from_str(embedding_json)
        .map_err(|e| ValidationError::malformed(format!("Invalid embedding data: {}", e)))?;

    if values.is_empty() {
        return Err(ValidationError::malformed("Invalid embedding data: empty vector").into());
    }

    let mut embedding = Vec::with_capacity(values.len());
    for (i, v) in values.into_iter().enumerate() {
        let narrowed = v as f32;
        if !narrowed.is_finite() {
            return Err(ValidationError::malformed(format!(
                "Invalid embedding data: component {} ({}) is outside f32 range",
                i, v
            ))
            .into());
        }
        embedding.push(narrowed);
    }
    Ok(embedding)
}

/// Checks `1 <= top_k <= 100`.
pub fn validate_top_k(top_k: usize) -> Result<()> {
    if !(MIN_TOP_K..=MAX_TOP_K).contains(&top_k) {
        return Err(ValidationError::out_of_range(
            "top_k",
            format!(
                "must be between {} and {}, got {}",
                MIN_TOP_K, MAX_TOP_K, top_k
            ),
        )
        .into());
    }
    Ok(())
}

/// Checks `0.0 <= threshold <= 1.0` and returns a classifier bound to it.
pub fn validate_threshold(threshold: f64) -> Result<RiskClassifier> {
    RiskClassifier::new(threshold)
}
