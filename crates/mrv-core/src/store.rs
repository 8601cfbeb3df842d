//! # Score Store
//!
//! The persistence contract for projects and saved scores, plus the
//! in-memory implementation.
//!
//! ## Tables
//!
//! - `projects(project_id PK, project_code, project_name, status, updated_at)`,
//!   owned by the external registry. Read here, written only for seeding.
//! - `mrv_scores(mrv_id PK, project_id → projects ON DELETE SET NULL, score_pct,
//!   six ratings, narrative, meta, created_at)`, append-only.
//!
//! ## Ordering
//!
//! - Projects: `updated_at` descending, missing timestamps treated as `""`
//!   (so they sort last), ties by `project_id` ascending.
//! - Score history: `created_at` ascending, ties by insertion sequence.

use crate::{MrvError, MrvId, MrvScore, NewScore, Project, ProjectEntry, ProjectId};
use std::collections::BTreeMap;

/// Log a recovered storage error as one structured line on stderr.
///
/// The core has no logging dependency; the shell's subscriber writes the
/// same shape.
pub(crate) fn log_recovered(context: &str, err: &MrvError) {
    eprintln!("{}", recovered_line(context, err));
}

fn recovered_line(context: &str, err: &MrvError) -> serde_json::Value {
    serde_json::json!({
        "level": "warn",
        "target": "mrv_core::store",
        "message": format!("{context} failed, continuing with defaults: {err}"),
    })
}

/// Sort projects for listing and attach labels.
pub fn sort_projects(mut projects: Vec<Project>) -> Vec<ProjectEntry> {
    projects.sort_by(|a, b| {
        let a_at = a.updated_at.as_deref().unwrap_or("");
        let b_at = b.updated_at.as_deref().unwrap_or("");
        b_at.cmp(a_at).then_with(|| a.project_id.cmp(&b.project_id))
    });
    projects.into_iter().map(ProjectEntry::from).collect()
}

/// Sort a project's scores oldest first.
pub fn sort_history(scores: &mut [MrvScore]) {
    scores.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.seq.cmp(&b.seq))
    });
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Storage operations shared by every backend.
pub trait ScoreStore {
    /// Create both tables if absent. Safe to call on every start.
    fn ensure_schema(&mut self) -> Result<(), MrvError>;

    /// All project rows, unordered. Fallible; prefer [`ScoreStore::list_projects`].
    fn projects(&self) -> Result<Vec<Project>, MrvError>;

    /// Insert or replace a project row.
    fn upsert_project(&mut self, project: Project) -> Result<(), MrvError>;

    /// Delete a project. Scores referencing it survive with `project_id`
    /// cleared. Returns whether the project existed.
    fn delete_project(&mut self, project_id: &ProjectId) -> Result<bool, MrvError>;

    /// Insert one score with a fresh id and timestamp.
    ///
    /// Fails with [`MrvError::ScoreWrite`] naming the attempted project.
    fn insert_score(&mut self, score: NewScore) -> Result<MrvId, MrvError>;

    /// Fetch one score by id.
    fn get_score(&self, mrv_id: &MrvId) -> Result<Option<MrvScore>, MrvError>;

    /// All scores for a project, oldest first.
    fn scores_for_project(&self, project_id: &ProjectId) -> Result<Vec<MrvScore>, MrvError>;

    /// Total number of stored scores.
    fn score_count(&self) -> Result<usize, MrvError>;

    /// Projects sorted for display, with labels.
    ///
    /// Never fails: listing is informational, so a storage error is
    /// logged and yields an empty list.
    fn list_projects(&self) -> Vec<ProjectEntry> {
        match self.projects() {
            Ok(projects) => sort_projects(projects),
            Err(e) => {
                log_recovered("list_projects", &e);
                Vec::new()
            }
        }
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile store used for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: BTreeMap<ProjectId, Project>,
    scores: BTreeMap<MrvId, MrvScore>,
    next_seq: u64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with projects.
    #[must_use]
    pub fn with_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        let mut store = Self::new();
        for project in projects {
            store.projects.insert(project.project_id.clone(), project);
        }
        store
    }
}

impl ScoreStore for MemoryStore {
    fn ensure_schema(&mut self) -> Result<(), MrvError> {
        Ok(())
    }

    fn projects(&self) -> Result<Vec<Project>, MrvError> {
        Ok(self.projects.values().cloned().collect())
    }

    fn upsert_project(&mut self, project: Project) -> Result<(), MrvError> {
        self.projects.insert(project.project_id.clone(), project);
        Ok(())
    }

    fn delete_project(&mut self, project_id: &ProjectId) -> Result<bool, MrvError> {
        if self.projects.remove(project_id).is_none() {
            return Ok(false);
        }
        for score in self.scores.values_mut() {
            if score.project_id.as_ref() == Some(project_id) {
                score.project_id = None;
            }
        }
        Ok(true)
    }

    fn insert_score(&mut self, score: NewScore) -> Result<MrvId, MrvError> {
        self.next_seq += 1;
        let record = score.into_record(self.next_seq);
        let mrv_id = record.mrv_id.clone();
        self.scores.insert(mrv_id.clone(), record);
        Ok(mrv_id)
    }

    fn get_score(&self, mrv_id: &MrvId) -> Result<Option<MrvScore>, MrvError> {
        Ok(self.scores.get(mrv_id).cloned())
    }

    fn scores_for_project(&self, project_id: &ProjectId) -> Result<Vec<MrvScore>, MrvError> {
        let mut scores: Vec<MrvScore> = self
            .scores
            .values()
            .filter(|s| s.project_id.as_ref() == Some(project_id))
            .cloned()
            .collect();
        sort_history(&mut scores);
        Ok(scores)
    }

    fn score_count(&self) -> Result<usize, MrvError> {
        Ok(self.scores.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
