//! Copyright risk classification.
//!
//! Maps similarity scores to a discrete [`RiskLevel`] using fixed,
//! non-overlapping bands evaluated top-down:
//!
//! | condition                 | level       |
//! |---------------------------|-------------|
//! | score ≥ 0.95              | `VERY_HIGH` |
//! | score ≥ 0.85              | `HIGH`      |
//! | score ≥ threshold         | `MEDIUM`    |
//! | score ≥ 0.5               | `LOW`       |
//! | otherwise                 | `VERY_LOW`  |
//!
//! # Aggregation Rule
//!
//! The overall assessment of a match set is the risk of its single best
//! match: `score` is the maximum `similarity_score`, and `level` is that
//! score classified with the same bands. An empty match set is
//! `VERY_LOW` with score 0.0.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::search::SearchMatch;

/// Lower bound of the `VERY_HIGH` band.
pub const VERY_HIGH_FLOOR: f64 = 0.95;

/// Lower bound of the `HIGH` band.
pub const HIGH_FLOOR: f64 = 0.85;

/// Lower bound of the `LOW` band.
pub const LOW_FLOOR: f64 = 0.5;

/// Discrete copyright risk level.
///
/// Ordered from least to most severe; `Unknown` (no assessment possible)
/// sorts below everything.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// No assessment (failed query).
    #[default]
    Unknown,
    /// Similarity below 0.5.
    VeryLow,
    /// Similarity in `[0.5, threshold)`.
    Low,
    /// Similarity in `[threshold, 0.85)`.
    Medium,
    /// Similarity in `[0.85, 0.95)`.
    High,
    /// Similarity of 0.95 or more.
    VeryHigh,
}

impl RiskLevel {
    /// Wire name of the level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::VeryLow => "VERY_LOW",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::VeryHigh => "VERY_HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall risk of a match set. Derived per query, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall level.
    pub level: RiskLevel,
    /// Scalar summary the level was derived from.
    pub score: f64,
}

impl RiskAssessment {
    /// Assessment used for failed queries.
    pub const UNKNOWN: Self = Self {
        level: RiskLevel::Unknown,
        score: 0.0,
    };
}

/// Classifies one similarity score.
///
/// `threshold` is expected in `[0.0, 1.0]`; range checking is the caller's
/// job (see [`RiskClassifier::new`]). Monotone in `similarity_score` for
/// any fixed threshold.
///
/// ```rust
/// use soundmatch::{classify_match, RiskLevel};
///
/// assert_eq!(classify_match(0.96, 0.8), RiskLevel::VeryHigh);
/// assert_eq!(classify_match(0.81, 0.8), RiskLevel::Medium);
/// assert_eq!(classify_match(0.30, 0.8), RiskLevel::VeryLow);
/// ```
pub fn classify_match(similarity_score: f64, threshold: f64) -> RiskLevel {
    if similarity_score >= VERY_HIGH_FLOOR {
        RiskLevel::VeryHigh
    } else if similarity_score >= HIGH_FLOOR {
        RiskLevel::High
    } else if similarity_score >= threshold {
        RiskLevel::Medium
    } else if similarity_score >= LOW_FLOOR {
        RiskLevel::Low
    } else {
        RiskLevel::VeryLow
    }
}

/// Classifier bound to a validated similarity threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskClassifier {
    threshold: f64,
}

impl RiskClassifier {
    /// Creates a classifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] unless
    /// `0.0 <= threshold <= 1.0`. Out-of-range values are never clamped.
    pub fn new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ValidationError::out_of_range(
                "similarity_threshold",
                format!("must be between 0.0 and 1.0, got {}", threshold),
            )
            .into());
        }
        Ok(Self { threshold })
    }

    /// Threshold separating `MEDIUM` from `LOW`.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classifies one similarity score.
    pub fn classify_match(&self, similarity_score: f64) -> RiskLevel {
        classify_match(similarity_score, self.threshold)
    }

    /// Summarizes a whole match set with the best-match rule.
    pub fn classify_aggregate(&self, matches: &[SearchMatch]) -> RiskAssessment {
        let best = matches
            .iter()
            .map(|m| m.similarity_score)
            .filter(|s| !s.is_nan())
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));

        match best {
            Some(score) => RiskAssessment {
                level: self.classify_match(score),
                score,
            },
            None => RiskAssessment {
                level: RiskLevel::VeryLow,
                score: 0.0,
            },
        }
    }
}
