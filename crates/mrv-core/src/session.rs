//! # Session Module
//!
//! A `Session` owns the injected store and a small volatile context holding
//! the active project selection. It runs the assessment flow in fixed order:
//!
//! ```text
//! list projects → collect ratings → compute score → build narrative
//!               → (optional) insert score → (optional) render report
//! ```
//!
//! ## Storage Backends
//!
//! - `InMemory`: [`MemoryStore`] (fast, volatile)
//! - `Persistent`: [`RedbStore`] (disk-backed, ACID)
//! - `Custom`: any other [`ScoreStore`] supplied by the caller

use crate::narrative::build_narrative;
use crate::report::SnapshotReport;
use crate::scoring::{compute_score, score_change};
use crate::storage::RedbStore;
use crate::store::{MemoryStore, ScoreStore};
use crate::system::{Stage, StageAssessor, StageProgress};
use crate::{MrvError, MrvId, MrvMeta, MrvScore, NewScore, Project, ProjectEntry, ProjectId, Ratings};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Storage backend for a Session.
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
    /// Caller-supplied store.
    Custom(Box<dyn ScoreStore + Send + Sync>),
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory(store) => f.debug_tuple("InMemory").field(store).finish(),
            Self::Persistent(store) => f.debug_tuple("Persistent").field(store).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn ScoreStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
            Self::Custom(store) => &**store,
        }
    }

    fn store_mut(&mut self) -> &mut dyn ScoreStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
            Self::Custom(store) => &mut **store,
        }
    }
}

// =============================================================================
// SESSION CONTEXT
// =============================================================================

/// Volatile per-session state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    active_project: Option<ProjectId>,
}

impl SessionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected project id, if any.
    #[must_use]
    pub fn active_project(&self) -> Option<&ProjectId> {
        self.active_project.as_ref()
    }

    pub fn select(&mut self, project_id: ProjectId) {
        self.active_project = Some(project_id);
    }

    pub fn clear(&mut self) {
        self.active_project = None;
    }
}

// =============================================================================
// ASSESSMENT
// =============================================================================

/// The result of scoring one set of ratings. Nothing is stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub ratings: Ratings,
    pub score_pct: f64,
    pub stage: Stage,
    pub narrative: String,
}

impl Assessment {
    /// Score, classify and narrate. Pure.
    #[must_use]
    pub fn evaluate(ratings: Ratings) -> Self {
        let score_pct = compute_score(&ratings);
        let stage = StageAssessor::new().assess(score_pct);
        let narrative = build_narrative(score_pct, &ratings);
        Self {
            ratings,
            score_pct,
            stage,
            narrative,
        }
    }

    /// Progress toward the next stage.
    #[must_use]
    pub fn progress(&self) -> StageProgress {
        StageAssessor::new().progress(self.score_pct)
    }
}

/// A stored score with its change against the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub score: MrvScore,
    /// Percentage points versus the previous snapshot; `None` for the first.
    pub change_pct: Option<f64>,
}

// =============================================================================
// SESSION
// =============================================================================

/// A Session combines a store with the volatile selection context.
#[derive(Debug, Default)]
pub struct Session {
    backend: StorageBackend,
    context: SessionContext,
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session around an existing in-memory store.
    #[must_use]
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            backend: StorageBackend::InMemory(store),
            context: SessionContext::new(),
        }
    }

    /// Create a session around any other store.
    #[must_use]
    pub fn with_backend(store: Box<dyn ScoreStore + Send + Sync>) -> Self {
        Self {
            backend: StorageBackend::Custom(store),
            context: SessionContext::new(),
        }
    }

    /// Create a session with persistent redb storage.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, MrvError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
            context: SessionContext::new(),
        })
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    /// Projects for display. Empty on storage failure.
    #[must_use]
    pub fn list_projects(&self) -> Vec<ProjectEntry> {
        self.backend.store().list_projects()
    }

    /// Find a listed project.
    pub fn project(&self, project_id: &ProjectId) -> Result<ProjectEntry, MrvError> {
        self.list_projects()
            .into_iter()
            .find(|p| &p.project.project_id == project_id)
            .ok_or_else(|| MrvError::ProjectNotFound(project_id.clone()))
    }

    pub fn upsert_project(&mut self, project: Project) -> Result<(), MrvError> {
        self.backend.store_mut().upsert_project(project)
    }

    /// Delete a project, keeping its scores. Clears the selection if it
    /// pointed at the deleted project.
    pub fn delete_project(&mut self, project_id: &ProjectId) -> Result<bool, MrvError> {
        let existed = self.backend.store_mut().delete_project(project_id)?;
        if self.context.active_project() == Some(project_id) {
            self.context.clear();
        }
        Ok(existed)
    }

    /// Select the active project. Only listed projects can be selected.
    pub fn select_project(&mut self, project_id: &ProjectId) -> Result<ProjectEntry, MrvError> {
        let entry = self.project(project_id)?;
        self.context.select(project_id.clone());
        Ok(entry)
    }

    /// The active project: the selection if it is still listed, otherwise
    /// the first listed project. `None` when there are no projects.
    #[must_use]
    pub fn active_project(&self) -> Option<ProjectEntry> {
        let projects = self.list_projects();
        let selected = self.context.active_project().and_then(|id| {
            projects
                .iter()
                .find(|p| &p.project.project_id == id)
                .cloned()
        });
        selected.or_else(|| projects.into_iter().next())
    }

    // -------------------------------------------------------------------------
    // Assessment
    // -------------------------------------------------------------------------

    /// Score a set of ratings. Does not touch storage.
    #[must_use]
    pub fn assess(&self, ratings: Ratings) -> Assessment {
        Assessment::evaluate(ratings)
    }

    /// Save an assessment for the active project.
    pub fn save(&mut self, assessment: &Assessment, notes: &str) -> Result<MrvId, MrvError> {
        let project = self.active_project().ok_or(MrvError::NoActiveProject)?;
        self.save_for(&project.project.project_id, assessment, notes)
    }

    /// Save an assessment for a specific listed project.
    ///
    /// The narrative is frozen as generated; meta records the trimmed notes
    /// and today's UTC date.
    pub fn save_for(
        &mut self,
        project_id: &ProjectId,
        assessment: &Assessment,
        notes: &str,
    ) -> Result<MrvId, MrvError> {
        if self.list_projects().is_empty() {
            return Err(MrvError::NoActiveProject);
        }
        let project = self.project(project_id)?;
        let meta = MrvMeta::new(notes, today());
        let score = NewScore::new(
            Some(project.project.project_id),
            assessment.ratings,
            assessment.narrative.clone(),
            meta,
        );
        self.backend.store_mut().insert_score(score)
    }

    /// Render the downloadable snapshot for a listed project.
    pub fn report(
        &self,
        project_id: &ProjectId,
        assessment: &Assessment,
        notes: &str,
    ) -> Result<SnapshotReport, MrvError> {
        let project = self.project(project_id)?;
        Ok(SnapshotReport::new(
            &project.label,
            today(),
            &assessment.narrative,
            notes,
        ))
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    pub fn get_score(&self, mrv_id: &MrvId) -> Result<Option<MrvScore>, MrvError> {
        self.backend.store().get_score(mrv_id)
    }

    /// All saved scores of a project, oldest first, with deltas.
    pub fn history(&self, project_id: &ProjectId) -> Result<Vec<HistoryEntry>, MrvError> {
        let scores = self.backend.store().scores_for_project(project_id)?;
        let mut previous: Option<f64> = None;
        Ok(scores
            .into_iter()
            .map(|score| {
                let change_pct = previous.map(|prev| score_change(prev, score.score_pct));
                previous = Some(score.score_pct);
                HistoryEntry { score, change_pct }
            })
            .collect())
    }

    pub fn score_count(&self) -> Result<usize, MrvError> {
        self.backend.store().score_count()
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Session {
        Session::with_store(MemoryStore::with_projects([
            Project::new("p-old")
                .with_code("CR-1")
                .with_name("Old")
                .with_updated_at("2025-01-01"),
            Project::new("p-new")
                .with_code("CR-2")
                .with_name("New")
                .with_updated_at("2026-01-01"),
        ]))
    }

    #[test]
    fn active_defaults_to_first_listed() {
        let session = seeded();
        let active = session.active_project().expect("active");
        assert_eq!(active.project.project_id.as_str(), "p-new");
    }

    #[test]
    fn select_listed_project() {
        let mut session = seeded();
        let entry = session
            .select_project(&ProjectId::new("p-old"))
            .expect("select");
        assert_eq!(entry.label, "CR-1 — Old");
        assert_eq!(
            session.active_project().map(|p| p.project.project_id),
            Some(ProjectId::new("p-old"))
        );
    }

    #[test]
    fn select_unknown_project_fails() {
        let mut session = seeded();
        let result = session.select_project(&ProjectId::new("ghost"));
        assert!(matches!(result, Err(MrvError::ProjectNotFound(_))));
        assert!(session.context().active_project().is_none());
    }

    #[test]
    fn save_without_projects_is_rejected() {
        let mut session = Session::new();
        let assessment = session.assess(Ratings::default());
        assert!(matches!(
            session.save(&assessment, ""),
            Err(MrvError::NoActiveProject)
        ));
        assert_eq!(session.score_count().expect("count"), 0);
    }

    #[test]
    fn save_freezes_narrative_and_meta() {
        let mut session = seeded();
        let assessment = session.assess(Ratings::default());
        let id = session
            .save(&assessment, "  EF source not yet confirmed  ")
            .expect("save");

        let stored = session.get_score(&id).expect("get").expect("present");
        assert_eq!(stored.narrative, assessment.narrative);
        assert_eq!(stored.score_pct, assessment.score_pct);
        assert_eq!(stored.project_id, Some(ProjectId::new("p-new")));
        assert_eq!(
            stored.meta.notes.as_deref(),
            Some("EF source not yet confirmed")
        );
        assert!(stored.meta.saved_on.is_some());
    }

    #[test]
    fn save_for_unknown_project_fails() {
        let mut session = seeded();
        let assessment = session.assess(Ratings::default());
        let result = session.save_for(&ProjectId::new("ghost"), &assessment, "");
        assert!(matches!(result, Err(MrvError::ProjectNotFound(_))));
    }

    #[test]
    fn history_reports_changes() {
        let mut session = seeded();
        let first = session.assess(Ratings::new([1; 6]).expect("valid"));
        let second = session.assess(Ratings::new([4; 6]).expect("valid"));
        for _ in 0..50 {
            session.save(&first, "").expect("save");
            session.save(&second, "").expect("save");
        }

        let history = session.history(&ProjectId::new("p-new")).expect("history");
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].change_pct, None);
        for (i, entry) in history.iter().enumerate() {
            let expected = if i % 2 == 0 { &first } else { &second };
            assert_eq!(entry.score.score_pct, expected.score_pct);
            if i > 0 {
                let change = entry.change_pct.expect("change");
                assert_eq!(change > 0.0, i % 2 == 1);
            }
        }
    }

    /// Lists one project but refuses every score write.
    struct ReadOnlyStore(MemoryStore);

    impl ScoreStore for ReadOnlyStore {
        fn ensure_schema(&mut self) -> Result<(), MrvError> {
            Ok(())
        }
        fn projects(&self) -> Result<Vec<Project>, MrvError> {
            self.0.projects()
        }
        fn upsert_project(&mut self, project: Project) -> Result<(), MrvError> {
            self.0.upsert_project(project)
        }
        fn delete_project(&mut self, project_id: &ProjectId) -> Result<bool, MrvError> {
            self.0.delete_project(project_id)
        }
        fn insert_score(&mut self, score: NewScore) -> Result<MrvId, MrvError> {
            Err(MrvError::ScoreWrite {
                project_id: score.project_id,
                reason: "read-only".into(),
            })
        }
        fn get_score(&self, mrv_id: &MrvId) -> Result<Option<MrvScore>, MrvError> {
            self.0.get_score(mrv_id)
        }
        fn scores_for_project(&self, project_id: &ProjectId) -> Result<Vec<MrvScore>, MrvError> {
            self.0.scores_for_project(project_id)
        }
        fn score_count(&self) -> Result<usize, MrvError> {
            self.0.score_count()
        }
    }

    #[test]
    fn write_failure_surfaces_through_session() {
        let store = ReadOnlyStore(MemoryStore::with_projects([Project::new("p-ro")]));
        let mut session = Session::with_backend(Box::new(store));
        assert!(!session.is_persistent());

        let assessment = session.assess(Ratings::default());
        let err = session.save(&assessment, "").expect_err("write refused");
        assert!(err.to_string().contains("p-ro"));
        assert!(matches!(err, MrvError::ScoreWrite { .. }));
        assert_eq!(session.score_count().expect("count"), 0);
    }

    #[test]
    fn delete_clears_selection() {
        let mut session = seeded();
        session
            .select_project(&ProjectId::new("p-old"))
            .expect("select");
        assert!(session.delete_project(&ProjectId::new("p-old")).expect("delete"));
        assert!(session.context().active_project().is_none());
        assert_eq!(
            session.active_project().map(|p| p.project.project_id),
            Some(ProjectId::new("p-new"))
        );
    }

    #[test]
    fn report_uses_project_label() {
        let session = seeded();
        let assessment = session.assess(Ratings::default());
        let report = session
            .report(&ProjectId::new("p-old"), &assessment, "")
            .expect("report");
        assert!(report.body.contains("- Project: CR-1 — Old"));
        assert!(report.body.contains(&assessment.narrative));
        assert!(report.body.ends_with("### Notes\n-\n"));
    }

    #[test]
    fn assessment_progress() {
        let assessment = Assessment::evaluate(Ratings::default());
        assert_eq!(assessment.stage, Stage::Intermediate);
        let progress = assessment.progress();
        assert_eq!(progress.next, Some(Stage::Strong));
    }
}
