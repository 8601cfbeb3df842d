//! # API Request/Response Types
//!
//! JSON structures for the HTTP API.

use mrv_core::{
    Assessment, Concept, HistoryEntry, INTRODUCTION, KEY_CONCEPTS, MrvError, MrvId, ProjectEntry,
    ProjectId, Ratings, SnapshotReport, Stage, primitives::MAX_NOTES_LENGTH,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// CONCEPTS RESPONSE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptJson {
    pub number: u8,
    pub title: String,
    pub body: String,
}

impl From<&Concept> for ConceptJson {
    fn from(concept: &Concept) -> Self {
        Self {
            number: concept.number,
            title: concept.title.to_string(),
            body: concept.body.to_string(),
        }
    }
}

/// Static teaching content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptsResponse {
    pub introduction: String,
    pub concepts: Vec<ConceptJson>,
}

impl Default for ConceptsResponse {
    fn default() -> Self {
        Self {
            introduction: INTRODUCTION.to_string(),
            concepts: KEY_CONCEPTS.iter().map(ConceptJson::from).collect(),
        }
    }
}

// =============================================================================
// PROJECTS RESPONSE
// =============================================================================

/// Project listing. `active` is the project a save without an explicit
/// `project_id` would go to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectEntry>,
    pub active: Option<ProjectId>,
}

// =============================================================================
// ASSESS REQUEST/RESPONSE
// =============================================================================

/// Score ratings without saving. Missing ratings take the form defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessRequest {
    #[serde(default)]
    pub ratings: Ratings,
}

/// Assessment result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessResponse {
    pub success: bool,
    pub score_pct: Option<f64>,
    pub stage: Option<Stage>,
    pub stage_label: Option<String>,
    pub next_stage: Option<Stage>,
    pub points_to_next: Option<f64>,
    pub narrative: Option<String>,
    pub error: Option<String>,
}

impl AssessResponse {
    pub fn success(assessment: &Assessment) -> Self {
        let progress = assessment.progress();
        Self {
            success: true,
            score_pct: Some(assessment.score_pct),
            stage: Some(assessment.stage),
            stage_label: Some(assessment.stage.label().to_string()),
            next_stage: progress.next,
            points_to_next: progress.points_to_next,
            narrative: Some(assessment.narrative.clone()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            score_pct: None,
            stage: None,
            stage_label: None,
            next_stage: None,
            points_to_next: None,
            narrative: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SNAPSHOT REQUEST (save and report)
// =============================================================================

/// Ratings and notes for one project. Without `project_id` the active
/// project is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotRequest {
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub ratings: Ratings,
    #[serde(default)]
    pub notes: String,
}

impl SnapshotRequest {
    /// Validate ratings and notes length at the API boundary.
    pub fn validate(&self) -> Result<Ratings, MrvError> {
        self.ratings.validate()?;
        if self.notes.len() > MAX_NOTES_LENGTH {
            return Err(MrvError::InvalidInput(format!(
                "Notes length {} exceeds maximum {} bytes",
                self.notes.len(),
                MAX_NOTES_LENGTH
            )));
        }
        Ok(self.ratings)
    }
}

/// Save result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveScoreResponse {
    pub success: bool,
    pub mrv_id: Option<MrvId>,
    pub error: Option<String>,
}

impl SaveScoreResponse {
    pub fn success(mrv_id: MrvId) -> Self {
        Self {
            success: true,
            mrv_id: Some(mrv_id),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            mrv_id: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// HISTORY RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub project_id: ProjectId,
    pub entries: Vec<HistoryEntry>,
    pub error: Option<String>,
}

impl HistoryResponse {
    pub fn success(project_id: ProjectId, entries: Vec<HistoryEntry>) -> Self {
        Self {
            success: true,
            project_id,
            entries,
            error: None,
        }
    }

    pub fn error(project_id: ProjectId, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            project_id,
            entries: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// REPORT RESPONSE
// =============================================================================

/// Rendered snapshot. `content` is the markdown text, `data` the same bytes
/// base64 encoded for download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    pub file_name: Option<String>,
    pub mime: Option<String>,
    pub content: Option<String>,
    pub data: Option<String>, // Base64 encoded
    pub error: Option<String>,
}

impl ReportResponse {
    pub fn success(report: SnapshotReport) -> Self {
        let data = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            report.as_bytes(),
        );
        Self {
            success: true,
            file_name: Some(report.file_name),
            mime: Some(report.mime),
            content: Some(report.body),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            file_name: None,
            mime: None,
            content: None,
            data: None,
            error: Some(msg.into()),
        }
    }
}
