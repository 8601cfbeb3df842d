//! # Narrative Generator
//!
//! Turns a readiness percentage and the six ratings into a short markdown
//! block: percentage, stage, strongest and weakest areas, a recommendation
//! and a fixed disclaimer.
//!
//! ## Ranking
//!
//! Dimensions are sorted ascending by rating with a stable sort over the
//! fixed declaration order (`boundary, baseline, assumptions, ef_trace,
//! data_quality, uncertainty`). The first two are the weakest, the last two
//! the strongest. With six dimensions the two pairs never overlap.

use crate::Ratings;
use crate::primitives::{DISCLAIMER, HIGHLIGHT_COUNT, MAX_RATING};
use crate::system::classify_stage;
use crate::types::Dimension;

/// Weakest and strongest dimensions of one set of ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionRanking {
    /// Lowest rated first.
    pub weakest: [(Dimension, u8); HIGHLIGHT_COUNT],
    /// In ascending order, so the highest rated comes last.
    pub strongest: [(Dimension, u8); HIGHLIGHT_COUNT],
}

/// Rank dimensions by rating.
#[must_use]
pub fn rank_dimensions(ratings: &Ratings) -> DimensionRanking {
    let mut sorted: Vec<(Dimension, u8)> = ratings.iter().collect();
    // sort_by_key is stable, so ties keep declaration order
    sorted.sort_by_key(|&(_, value)| value);

    let len = sorted.len();
    DimensionRanking {
        weakest: [sorted[0], sorted[1]],
        strongest: [sorted[len - 2], sorted[len - 1]],
    }
}

/// Format a dimension key for display: separators become spaces and each
/// word is title-cased (`ef_trace` → `Ef Trace`).
#[must_use]
pub fn format_dimension(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn describe(pairs: &[(Dimension, u8)]) -> String {
    pairs
        .iter()
        .map(|(dimension, value)| {
            format!(
                "{} ({}/{})",
                format_dimension(dimension.key()),
                value,
                MAX_RATING
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the narrative for a score. Pure and deterministic.
#[must_use]
pub fn build_narrative(score_pct: f64, ratings: &Ratings) -> String {
    let ranking = rank_dimensions(ratings);
    let stage = classify_stage(score_pct);

    let mut out = String::new();
    out.push_str("### Carbon Integrity Narrative\n");
    out.push_str(&format!(
        "- **MRV Readiness (screening):** {:.0}%\n",
        score_pct
    ));
    out.push_str(&format!("- **Maturity stage:** {}\n", stage.label()));
    out.push_str(&format!(
        "- **Strongest areas:** {}\n",
        describe(&ranking.strongest)
    ));
    out.push_str(&format!(
        "- **Weakest areas:** {}\n",
        describe(&ranking.weakest)
    ));
    out.push_str(&format!("- **Recommendation:** {}\n", stage.advice()));
    out.push('\n');
    out.push_str(DISCLAIMER);
    out.push('\n');
    out
}
