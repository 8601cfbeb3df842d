//! # Core Type Definitions
//!
//! This module contains the data model shared by every other module:
//! - Identifiers (`ProjectId`, `MrvId`)
//! - Rating inputs (`Dimension`, `Ratings`)
//! - Records (`Project`, `ProjectEntry`, `MrvMeta`, `NewScore`, `MrvScore`)
//! - Error types (`MrvError`)
//!
//! ## Invariants
//!
//! - Every rating is an integer in `0..=MAX_RATING`.
//! - `score_pct` is derived from the six ratings exactly once, when a
//!   [`NewScore`] is built, and is never recomputed afterwards.
//! - Score records are immutable once stored.

use crate::primitives::{DEFAULT_RATINGS, MAX_RATING};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque identifier of a project record.
///
/// Projects are created by an external registry; this crate only
/// lists and references them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a saved score snapshot (UUID v4 text).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MrvId(pub String);

impl MrvId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MrvId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// DIMENSIONS
// =============================================================================

/// The six rated dimensions, in fixed declaration order.
///
/// The declaration order is also the tie-break order used when ranking
/// dimensions that share a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Boundary,
    Baseline,
    Assumptions,
    EfTrace,
    DataQuality,
    Uncertainty,
}

impl Dimension {
    /// All dimensions in declaration order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Boundary,
        Dimension::Baseline,
        Dimension::Assumptions,
        Dimension::EfTrace,
        Dimension::DataQuality,
        Dimension::Uncertainty,
    ];

    /// Storage key (column name) of this dimension.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Boundary => "boundary",
            Dimension::Baseline => "baseline",
            Dimension::Assumptions => "assumptions",
            Dimension::EfTrace => "ef_trace",
            Dimension::DataQuality => "data_quality",
            Dimension::Uncertainty => "uncertainty",
        }
    }

    /// The question a rater answers for this dimension.
    #[must_use]
    pub fn prompt(&self) -> &'static str {
        match self {
            Dimension::Boundary => "Boundary clarity",
            Dimension::Baseline => "Baseline justification",
            Dimension::Assumptions => "Assumptions documented",
            Dimension::EfTrace => "EF traceability (cited)",
            Dimension::DataQuality => "Data quality (metering/invoices)",
            Dimension::Uncertainty => "Uncertainty expressed",
        }
    }

    /// Look up a dimension by its storage key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.key() == key)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// RATINGS
// =============================================================================

/// Six bounded integer ratings, one per [`Dimension`].
///
/// Fields are public so the shell can deserialize them directly;
/// call [`Ratings::validate`] before trusting values from outside.
/// Missing fields take their default rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Ratings {
    pub boundary: u8,
    pub baseline: u8,
    pub assumptions: u8,
    pub ef_trace: u8,
    pub data_quality: u8,
    pub uncertainty: u8,
}

impl Default for Ratings {
    fn default() -> Self {
        let [boundary, baseline, assumptions, ef_trace, data_quality, uncertainty] =
            DEFAULT_RATINGS;
        Self {
            boundary,
            baseline,
            assumptions,
            ef_trace,
            data_quality,
            uncertainty,
        }
    }
}

impl Ratings {
    /// Build ratings from values in declaration order, rejecting any value
    /// above `MAX_RATING`.
    pub fn new(values: [u8; 6]) -> Result<Self, MrvError> {
        let [boundary, baseline, assumptions, ef_trace, data_quality, uncertainty] = values;
        let ratings = Self {
            boundary,
            baseline,
            assumptions,
            ef_trace,
            data_quality,
            uncertainty,
        };
        ratings.validate()?;
        Ok(ratings)
    }

    /// Check every rating is within `0..=MAX_RATING`.
    pub fn validate(&self) -> Result<(), MrvError> {
        for (dimension, value) in self.iter() {
            if value > MAX_RATING {
                return Err(MrvError::InvalidRating { dimension, value });
            }
        }
        Ok(())
    }

    /// Rating for a single dimension.
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Boundary => self.boundary,
            Dimension::Baseline => self.baseline,
            Dimension::Assumptions => self.assumptions,
            Dimension::EfTrace => self.ef_trace,
            Dimension::DataQuality => self.data_quality,
            Dimension::Uncertainty => self.uncertainty,
        }
    }

    /// Set the rating for a single dimension.
    pub fn set(&mut self, dimension: Dimension, value: u8) {
        let slot = match dimension {
            Dimension::Boundary => &mut self.boundary,
            Dimension::Baseline => &mut self.baseline,
            Dimension::Assumptions => &mut self.assumptions,
            Dimension::EfTrace => &mut self.ef_trace,
            Dimension::DataQuality => &mut self.data_quality,
            Dimension::Uncertainty => &mut self.uncertainty,
        };
        *slot = value;
    }

    /// `(dimension, rating)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, u8)> + '_ {
        Dimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    /// Values in declaration order.
    #[must_use]
    pub fn to_array(&self) -> [u8; 6] {
        Dimension::ALL.map(|d| self.get(d))
    }

    /// Sum of all six ratings.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.iter().map(|(_, v)| u32::from(v)).sum()
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

/// A project record as kept by the external registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub project_code: Option<String>,
    pub project_name: Option<String>,
    pub status: Option<String>,
    /// Update timestamp as text; missing values sort last.
    pub updated_at: Option<String>,
}

impl Project {
    /// Create a project with only an identifier.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: ProjectId::new(project_id),
            project_code: None,
            project_name: None,
            status: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.project_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }

    /// Display label `"{code} — {name}"`.
    ///
    /// Falls back to the raw project id when code and name are both blank.
    #[must_use]
    pub fn label(&self) -> String {
        let code = self.project_code.as_deref().unwrap_or("");
        let name = self.project_name.as_deref().unwrap_or("");
        if code.trim().is_empty() && name.trim().is_empty() {
            return self.project_id.0.clone();
        }
        format!("{code} — {name}")
    }
}

/// A listed project together with its derived display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(flatten)]
    pub project: Project,
    pub label: String,
}

impl From<Project> for ProjectEntry {
    fn from(project: Project) -> Self {
        let label = project.label();
        Self { project, label }
    }
}

// =============================================================================
// SCORE RECORDS
// =============================================================================

/// Free-form metadata saved with a score.
///
/// Known keys are typed; anything else is carried through untouched so
/// payloads written by newer versions survive a round-trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MrvMeta {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub saved_on: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MrvMeta {
    /// Metadata for a save happening on `saved_on`. Blank notes become `None`.
    #[must_use]
    pub fn new(notes: &str, saved_on: NaiveDate) -> Self {
        let trimmed = notes.trim();
        Self {
            notes: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            saved_on: Some(saved_on),
            extra: BTreeMap::new(),
        }
    }

    /// Serialize to the JSON text stored alongside the score.
    pub fn to_json(&self) -> Result<String, MrvError> {
        serde_json::to_string(self).map_err(|e| MrvError::Serialization(e.to_string()))
    }

    /// Parse stored JSON text. An empty string is an empty payload.
    pub fn from_json(raw: &str) -> Result<Self, MrvError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw).map_err(|e| MrvError::Serialization(e.to_string()))
    }
}

/// A score ready to be inserted. The store assigns `mrv_id`, `seq` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScore {
    pub project_id: Option<ProjectId>,
    pub score_pct: f64,
    pub ratings: Ratings,
    pub narrative: String,
    pub meta: MrvMeta,
}

impl NewScore {
    /// Build a new score, deriving `score_pct` from the ratings.
    #[must_use]
    pub fn new(
        project_id: Option<ProjectId>,
        ratings: Ratings,
        narrative: impl Into<String>,
        meta: MrvMeta,
    ) -> Self {
        Self {
            project_id,
            score_pct: crate::scoring::compute_score(&ratings),
            ratings,
            narrative: narrative.into(),
            meta,
        }
    }

    /// Freeze into a stored record with a fresh id, the store's next
    /// insertion sequence and a second-precision UTC timestamp.
    #[must_use]
    pub fn into_record(self, seq: u64) -> MrvScore {
        MrvScore {
            mrv_id: MrvId::generate(),
            seq,
            project_id: self.project_id,
            score_pct: self.score_pct,
            ratings: self.ratings,
            narrative: self.narrative,
            meta: self.meta,
            created_at: Utc::now().trunc_subsecs(0),
        }
    }
}

/// One saved assessment snapshot. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrvScore {
    pub mrv_id: MrvId,
    /// Per-store insertion counter. Orders saves within the same second.
    #[serde(default)]
    pub seq: u64,
    /// Cleared when the referenced project is deleted.
    pub project_id: Option<ProjectId>,
    pub score_pct: f64,
    pub ratings: Ratings,
    pub narrative: String,
    pub meta: MrvMeta,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the MRV core.
///
/// - No silent failures, except project listing which is recovered locally
/// - Use `Result<T, MrvError>` for fallible operations
#[derive(Debug, Error)]
pub enum MrvError {
    /// A rating was outside `0..=5`.
    #[error("Rating for {dimension} must be between 0 and 5, got {value}")]
    InvalidRating { dimension: Dimension, value: u8 },

    /// The referenced project is not in the project listing.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// A save was attempted with no project available.
    #[error("No project selected; create a project in the registry first")]
    NoActiveProject,

    /// Writing a score failed. Carries the project the score was meant for.
    #[error("Failed to save MRV score for project {}: {reason}", project_label(.project_id))]
    ScoreWrite {
        project_id: Option<ProjectId>,
        reason: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The underlying store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Caller input failed validation (blank ids, oversized notes).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn project_label(project_id: &Option<ProjectId>) -> &str {
    project_id.as_ref().map_or("<none>", ProjectId::as_str)
}

// =============================================================================
// TESTS
// =============================================================================
