//! # Maturity Stage Assessment
//!
//! Classifies a readiness percentage into one of three maturity stages.
//!
//! | Stage | Label | Range | Advice |
//! |-------|-------|-------|--------|
//! | Early | Early-stage (screening only) | `< 50` | boundaries, assumptions, factor sources |
//! | Intermediate | Intermediate (decision-support) | `[50, 75)` | traceability, uncertainty |
//! | Strong | Strong (approaching audit-ready structure) | `>= 75` | maintain traceability, align to methodology |
//!
//! Ranges are half-open: 50.0 and 75.0 land in the higher stage.

use crate::primitives::{INTERMEDIATE_THRESHOLD, STRONG_THRESHOLD};
use crate::scoring::points_to;
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE ENUM
// =============================================================================

/// Maturity stage derived from a readiness percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Screening only.
    Early,
    /// Decision-support.
    Intermediate,
    /// Approaching audit-ready structure.
    Strong,
}

impl Stage {
    /// Short stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Early => "Early",
            Stage::Intermediate => "Intermediate",
            Stage::Strong => "Strong",
        }
    }

    /// Full label used in narratives.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Early => "Early-stage (screening only)",
            Stage::Intermediate => "Intermediate (decision-support)",
            Stage::Strong => "Strong (approaching audit-ready structure)",
        }
    }

    /// Recommendation for a project at this stage.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Stage::Early => {
                "Focus on clarifying boundaries, documenting assumptions, and recording factor sources."
            }
            Stage::Intermediate => {
                "Tighten evidence traceability and quantify uncertainty for critical inputs."
            }
            Stage::Strong => {
                "Maintain traceability and align fully to the chosen standard/methodology for audit defensibility."
            }
        }
    }

    /// Lowest percentage belonging to this stage (default thresholds).
    #[must_use]
    pub fn threshold(&self) -> f64 {
        match self {
            Stage::Early => 0.0,
            Stage::Intermediate => INTERMEDIATE_THRESHOLD,
            Stage::Strong => STRONG_THRESHOLD,
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Early => Some(Stage::Intermediate),
            Stage::Intermediate => Some(Stage::Strong),
            Stage::Strong => None,
        }
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(&self) -> Option<Stage> {
        match self {
            Stage::Early => None,
            Stage::Intermediate => Some(Stage::Early),
            Stage::Strong => Some(Stage::Intermediate),
        }
    }

    /// Check if this stage is terminal (Strong).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Strong)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a percentage with the default thresholds.
#[must_use]
pub fn classify_stage(score_pct: f64) -> Stage {
    StageAssessor::new().assess(score_pct)
}

// =============================================================================
// STAGE ASSESSOR
// =============================================================================

/// Stage Assessor - pure function from percentage to stage.
#[derive(Debug, Clone, Copy)]
pub struct StageAssessor {
    intermediate_threshold: f64,
    strong_threshold: f64,
}

impl Default for StageAssessor {
    fn default() -> Self {
        Self::new()
    }
}

impl StageAssessor {
    /// Create a new assessor with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            intermediate_threshold: INTERMEDIATE_THRESHOLD,
            strong_threshold: STRONG_THRESHOLD,
        }
    }

    /// Create an assessor with custom thresholds.
    #[must_use]
    pub fn with_thresholds(intermediate: f64, strong: f64) -> Self {
        Self {
            intermediate_threshold: intermediate,
            strong_threshold: strong,
        }
    }

    /// Assess the stage for a percentage.
    #[must_use]
    pub fn assess(&self, score_pct: f64) -> Stage {
        if score_pct >= self.strong_threshold {
            Stage::Strong
        } else if score_pct >= self.intermediate_threshold {
            Stage::Intermediate
        } else {
            Stage::Early
        }
    }

    /// Threshold of a stage under this assessor.
    fn threshold_of(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Early => 0.0,
            Stage::Intermediate => self.intermediate_threshold,
            Stage::Strong => self.strong_threshold,
        }
    }

    /// Get progress toward the next stage.
    #[must_use]
    pub fn progress(&self, score_pct: f64) -> StageProgress {
        let current = self.assess(score_pct);
        let next = current.next();
        let points_to_next = next.map(|stage| points_to(score_pct, self.threshold_of(stage)));

        StageProgress {
            current,
            next,
            score_pct,
            points_to_next,
        }
    }
}

/// Progress information toward the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageProgress {
    pub current: Stage,
    pub next: Option<Stage>,
    pub score_pct: f64,
    /// Percentage points still missing; `None` at the terminal stage.
    pub points_to_next: Option<f64>,
}

// =============================================================================
// TESTS
// =============================================================================
