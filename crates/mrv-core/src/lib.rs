//! # mrv-core
//!
//! The MRV readiness engine - THE LOGIC.
//!
//! A guided self-assessment for carbon-accounting project teams: six ratings
//! (boundary, baseline, assumptions, EF traceability, data quality,
//! uncertainty) become a readiness percentage, a maturity stage and a short
//! narrative, and each saved snapshot is appended to a project's history.
//!
//! ## Architectural Constraints
//!
//! - Scoring and narrative generation are pure and deterministic
//! - Saved scores are append-only; `score_pct` and the narrative are frozen
//!   at save time and never recomputed
//! - The store is an explicit handle owned by a [`Session`], not global state
//! - NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod concepts;
pub mod narrative;
pub mod primitives;
pub mod report;
pub mod scoring;
pub mod session;
pub mod storage;
pub mod store;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Dimension, MrvError, MrvId, MrvMeta, MrvScore, NewScore, Project, ProjectEntry, ProjectId,
    Ratings,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use concepts::{Concept, INTRODUCTION, KEY_CONCEPTS, render_concepts};
pub use narrative::{DimensionRanking, build_narrative, format_dimension, rank_dimensions};
pub use report::{SnapshotReport, render_report};
pub use scoring::compute_score;
pub use session::{Assessment, HistoryEntry, Session, SessionContext, StorageBackend};
pub use storage::RedbStore;
pub use store::{MemoryStore, ScoreStore};

// =============================================================================
// RE-EXPORTS: System (from system module)
// =============================================================================

pub use system::{Stage, StageAssessor, StageProgress, classify_stage};
