//! # Scoring Engine
//!
//! Maps six bounded ratings to a readiness percentage:
//!
//! ```text
//! percentage = 100 * sum(ratings) / 30
//! ```
//!
//! No rounding is applied here; the shell may round for display.
//! Ratings are expected to be range-checked already (see [`Ratings::validate`]).

// Readiness is a fractional percentage; this is the one place it is computed.
#![allow(clippy::float_arithmetic)]

use crate::Ratings;
use crate::primitives::MAX_TOTAL;

/// Compute the readiness percentage in `[0, 100]`.
#[must_use]
pub fn compute_score(ratings: &Ratings) -> f64 {
    100.0 * f64::from(ratings.total()) / f64::from(MAX_TOTAL)
}

/// Percentage points between two scores (`current - previous`).
#[must_use]
pub fn score_change(previous: f64, current: f64) -> f64 {
    current - previous
}

/// Percentage points from `score` up to `target`, never negative.
#[must_use]
pub fn points_to(score: f64, target: f64) -> f64 {
    (target - score).max(0.0)
}
