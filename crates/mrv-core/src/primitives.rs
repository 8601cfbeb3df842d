//! # Fixed Constants
//!
//! Scoring bounds, stage thresholds and text constants compiled into the
//! binary. None of these are configurable at runtime except the stage
//! thresholds, which `StageAssessor::with_thresholds` can override.

/// Highest value a single rating may take.
pub const MAX_RATING: u8 = 5;

/// Number of rated dimensions.
pub const DIMENSION_COUNT: usize = 6;

/// Highest possible sum of all ratings (`MAX_RATING * DIMENSION_COUNT`).
pub const MAX_TOTAL: u32 = MAX_RATING as u32 * DIMENSION_COUNT as u32;

/// Ratings offered by the form before the user moves any slider,
/// in dimension declaration order.
pub const DEFAULT_RATINGS: [u8; DIMENSION_COUNT] = [3, 3, 3, 2, 3, 2];

/// Lowest percentage classified as Intermediate.
pub const INTERMEDIATE_THRESHOLD: f64 = 50.0;

/// Lowest percentage classified as Strong.
pub const STRONG_THRESHOLD: f64 = 75.0;

/// Number of dimensions reported as strongest and as weakest.
pub const HIGHLIGHT_COUNT: usize = 2;

/// Closing line of every narrative.
pub const DISCLAIMER: &str =
    "> Note: This score is a structured clarity check, not an audit outcome.";

/// File name offered for the downloadable snapshot.
pub const REPORT_FILE_NAME: &str = "mrv_readiness_snapshot.md";

/// MIME type of the downloadable snapshot.
pub const REPORT_MIME: &str = "text/markdown";

/// Maximum length of free-text notes, in bytes.
pub const MAX_NOTES_LENGTH: usize = 16 * 1024;

/// Storage schema version written on first open.
pub const SCHEMA_VERSION: u64 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_total_is_thirty() {
        assert_eq!(MAX_TOTAL, 30);
    }

    #[test]
    fn highlights_never_overlap() {
        assert!(HIGHLIGHT_COUNT * 2 <= DIMENSION_COUNT);
    }
}
