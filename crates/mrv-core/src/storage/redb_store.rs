//! # redb-backed Score Storage
//!
//! A disk-backed [`ScoreStore`] using the redb embedded database.
//!
//! - ACID transactions: a score write either lands completely or not at all
//! - Crash safety (copy-on-write B-trees)
//! - MVCC: concurrent readers, single writer
//!
//! Rows are `postcard`-encoded. The score `meta` payload is kept as JSON text
//! inside the row so it stays readable and forward-compatible.

use crate::primitives::SCHEMA_VERSION;
use crate::store::{ScoreStore, sort_history};
use crate::{MrvError, MrvId, MrvMeta, MrvScore, NewScore, Project, ProjectId, Ratings};
use chrono::{DateTime, SecondsFormat, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Table for projects: project_id -> serialized Project bytes
const PROJECTS: TableDefinition<&str, &[u8]> = TableDefinition::new("projects");

/// Table for scores: mrv_id -> serialized ScoreRow bytes
const MRV_SCORES: TableDefinition<&str, &[u8]> = TableDefinition::new("mrv_scores");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

/// Metadata key holding the last assigned score sequence.
const SCORE_SEQ: &str = "score_seq";

fn io(e: impl std::fmt::Display) -> MrvError {
    MrvError::Storage(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, MrvError> {
    postcard::to_allocvec(value).map_err(|e| MrvError::Serialization(e.to_string()))
}

fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, MrvError> {
    postcard::from_bytes(bytes).map_err(|e| MrvError::Serialization(e.to_string()))
}

// =============================================================================
// ROW FORMAT
// =============================================================================

/// On-disk shape of a score row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScoreRow {
    mrv_id: String,
    seq: u64,
    project_id: Option<String>,
    score_pct: f64,
    boundary: u8,
    baseline: u8,
    assumptions: u8,
    ef_trace: u8,
    data_quality: u8,
    uncertainty: u8,
    narrative: String,
    meta_json: String,
    /// RFC 3339, UTC, second precision.
    created_at: String,
}

impl ScoreRow {
    fn from_record(record: &MrvScore) -> Result<Self, MrvError> {
        let r = record.ratings;
        Ok(Self {
            mrv_id: record.mrv_id.0.clone(),
            seq: record.seq,
            project_id: record.project_id.as_ref().map(|p| p.0.clone()),
            score_pct: record.score_pct,
            boundary: r.boundary,
            baseline: r.baseline,
            assumptions: r.assumptions,
            ef_trace: r.ef_trace,
            data_quality: r.data_quality,
            uncertainty: r.uncertainty,
            narrative: record.narrative.clone(),
            meta_json: record.meta.to_json()?,
            created_at: record
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    fn into_record(self) -> Result<MrvScore, MrvError> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| MrvError::Serialization(format!("created_at: {e}")))?
            .with_timezone(&Utc);
        Ok(MrvScore {
            mrv_id: MrvId(self.mrv_id),
            seq: self.seq,
            project_id: self.project_id.map(ProjectId),
            score_pct: self.score_pct,
            ratings: Ratings {
                boundary: self.boundary,
                baseline: self.baseline,
                assumptions: self.assumptions,
                ef_trace: self.ef_trace,
                data_quality: self.data_quality,
                uncertainty: self.uncertainty,
            },
            narrative: self.narrative,
            meta: MrvMeta::from_json(&self.meta_json)?,
            created_at,
        })
    }
}

// =============================================================================
// REDB STORE
// =============================================================================

/// A disk-backed score store using redb.
///
/// Opened once per process and injected into the session; there is no
/// global connection.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path and ensure the schema.
    ///
    /// The parent directory is created if missing. Any failure here is
    /// fatal for the caller: nothing works without the tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MrvError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| MrvError::Storage(format!("create {}: {e}", parent.display())))?;
        }

        let db = Database::create(path).map_err(io)?;
        let mut store = Self { db };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Schema version recorded in the metadata table.
    pub fn schema_version(&self) -> Result<Option<u64>, MrvError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(METADATA).map_err(io)?;
        Ok(table.get("schema_version").map_err(io)?.map(|v| v.value()))
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), MrvError> {
        self.db.compact().map_err(io)?;
        Ok(())
    }

    /// Allocate the next sequence and write the row in one transaction.
    fn write_score(&self, score: NewScore) -> Result<MrvScore, MrvError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let record = {
            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let last = meta.get(SCORE_SEQ).map_err(io)?.map_or(0, |v| v.value());
            let seq = last.saturating_add(1);
            meta.insert(SCORE_SEQ, seq).map_err(io)?;

            let record = score.into_record(seq);
            let bytes = encode(&ScoreRow::from_record(&record)?)?;
            let mut scores = write_txn.open_table(MRV_SCORES).map_err(io)?;
            scores
                .insert(record.mrv_id.as_str(), bytes.as_slice())
                .map_err(io)?;
            record
        };
        write_txn.commit().map_err(io)?;
        Ok(record)
    }

    fn all_scores(&self) -> Result<Vec<MrvScore>, MrvError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(MRV_SCORES).map_err(io)?;

        let mut scores = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (_, value) = entry.map_err(io)?;
            let row: ScoreRow = decode(value.value())?;
            scores.push(row.into_record()?);
        }
        Ok(scores)
    }
}

// =============================================================================
// SCORESTORE TRAIT IMPLEMENTATION
// =============================================================================

impl ScoreStore for RedbStore {
    fn ensure_schema(&mut self) -> Result<(), MrvError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let _ = write_txn.open_table(PROJECTS).map_err(io)?;
            let _ = write_txn.open_table(MRV_SCORES).map_err(io)?;
            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let existing = meta.get("schema_version").map_err(io)?.map(|v| v.value());
            if existing.is_none() {
                meta.insert("schema_version", SCHEMA_VERSION).map_err(io)?;
            }
        }
        write_txn.commit().map_err(io)?;
        Ok(())
    }

    fn projects(&self) -> Result<Vec<Project>, MrvError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(PROJECTS).map_err(io)?;

        let mut projects = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (_, value) = entry.map_err(io)?;
            projects.push(decode::<Project>(value.value())?);
        }
        Ok(projects)
    }

    fn upsert_project(&mut self, project: Project) -> Result<(), MrvError> {
        let bytes = encode(&project)?;
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(PROJECTS).map_err(io)?;
            table
                .insert(project.project_id.as_str(), bytes.as_slice())
                .map_err(io)?;
        }
        write_txn.commit().map_err(io)?;
        Ok(())
    }

    fn delete_project(&mut self, project_id: &ProjectId) -> Result<bool, MrvError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let existed = {
            let mut projects = write_txn.open_table(PROJECTS).map_err(io)?;
            let existed = projects.remove(project_id.as_str()).map_err(io)?.is_some();

            // ON DELETE SET NULL: rewrite referencing rows in the same transaction.
            let mut scores = write_txn.open_table(MRV_SCORES).map_err(io)?;
            let mut orphaned = Vec::new();
            for entry in scores.iter().map_err(io)? {
                let (_, value) = entry.map_err(io)?;
                let row: ScoreRow = decode(value.value())?;
                if row.project_id.as_deref() == Some(project_id.as_str()) {
                    orphaned.push(row);
                }
            }
            for mut row in orphaned {
                row.project_id = None;
                let bytes = encode(&row)?;
                scores
                    .insert(row.mrv_id.as_str(), bytes.as_slice())
                    .map_err(io)?;
            }
            existed
        };
        write_txn.commit().map_err(io)?;
        Ok(existed)
    }

    fn insert_score(&mut self, score: NewScore) -> Result<MrvId, MrvError> {
        let project_id = score.project_id.clone();
        let record = self
            .write_score(score)
            .map_err(|e| MrvError::ScoreWrite {
                project_id,
                reason: e.to_string(),
            })?;
        Ok(record.mrv_id)
    }

    fn get_score(&self, mrv_id: &MrvId) -> Result<Option<MrvScore>, MrvError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(MRV_SCORES).map_err(io)?;

        match table.get(mrv_id.as_str()).map_err(io)? {
            Some(data) => {
                let row: ScoreRow = decode(data.value())?;
                Ok(Some(row.into_record()?))
            }
            None => Ok(None),
        }
    }

    fn scores_for_project(&self, project_id: &ProjectId) -> Result<Vec<MrvScore>, MrvError> {
        let mut scores: Vec<MrvScore> = self
            .all_scores()?
            .into_iter()
            .filter(|s| s.project_id.as_ref() == Some(project_id))
            .collect();
        sort_history(&mut scores);
        Ok(scores)
    }

    fn score_count(&self) -> Result<usize, MrvError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(MRV_SCORES).map_err(io)?;
        let count = table.len().map_err(io)?;
        Ok(count as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::compute_score;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn new_score(project: &str, values: [u8; 6]) -> NewScore {
        let ratings = Ratings::new(values).expect("valid");
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
        NewScore::new(
            Some(ProjectId::new(project)),
            ratings,
            "### Carbon Integrity Narrative\n",
            MrvMeta::new("invoices missing for Q3", date),
        )
    }

    #[test]
    fn open_creates_schema() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("mrv.redb")).expect("open db");
        assert_eq!(store.schema_version().expect("version"), Some(SCHEMA_VERSION));
        assert_eq!(store.score_count().expect("count"), 0);
        assert!(store.list_projects().is_empty());
    }

    #[test]
    fn open_creates_parent_dir() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("data").join("carbon_registry.redb");
        let _store = RedbStore::open(&path).expect("open db");
        assert!(path.exists());
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("mrv.redb")).expect("open db");
        store.ensure_schema().expect("second");
        store.ensure_schema().expect("third");
        assert_eq!(store.schema_version().expect("version"), Some(SCHEMA_VERSION));
    }

    #[test]
    fn roundtrip_preserves_ratings_and_score() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("mrv.redb")).expect("open db");
        store.upsert_project(Project::new("p")).expect("project");

        let score = new_score("p", [3, 3, 3, 2, 3, 2]);
        let expected_pct = score.score_pct;
        let id = store.insert_score(score).expect("insert");

        let stored = store.get_score(&id).expect("get").expect("present");
        assert_eq!(stored.ratings.to_array(), [3, 3, 3, 2, 3, 2]);
        assert_eq!(stored.score_pct.to_bits(), expected_pct.to_bits());
        assert_eq!(stored.score_pct.to_bits(), compute_score(&stored.ratings).to_bits());
        assert_eq!(stored.meta.notes.as_deref(), Some("invoices missing for Q3"));
        assert_eq!(stored.created_at.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn persistence_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("mrv.redb");

        let id = {
            let mut store = RedbStore::open(&path).expect("open db");
            store
                .upsert_project(Project::new("p").with_code("CR-1").with_name("Wind"))
                .expect("project");
            store.insert_score(new_score("p", [5; 6])).expect("insert")
        };

        let store = RedbStore::open(&path).expect("reopen");
        let stored = store.get_score(&id).expect("get").expect("present");
        assert_eq!(stored.score_pct, 100.0);
        let projects = store.list_projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].label, "CR-1 — Wind");
    }

    #[test]
    fn history_is_per_project_and_ordered() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("mrv.redb")).expect("open db");

        let first = store.insert_score(new_score("p", [1; 6])).expect("insert");
        store.insert_score(new_score("q", [2; 6])).expect("insert");
        let second = store.insert_score(new_score("p", [4; 6])).expect("insert");

        let history = store.scores_for_project(&ProjectId::new("p")).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].mrv_id, first);
        assert_eq!(history[1].mrv_id, second);
        assert!(history[0].seq < history[1].seq);
        assert!(
            history
                .iter()
                .all(|s| s.project_id == Some(ProjectId::new("p")))
        );
    }

    #[test]
    fn sequence_survives_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("mrv.redb");

        let ids: Vec<MrvId> = {
            let mut store = RedbStore::open(&path).expect("open db");
            (0..5)
                .map(|i| store.insert_score(new_score("p", [i; 6])).expect("insert"))
                .collect()
        };

        let mut store = RedbStore::open(&path).expect("reopen");
        let last = store.insert_score(new_score("p", [5; 6])).expect("insert");

        let history: Vec<MrvScore> = store
            .scores_for_project(&ProjectId::new("p"))
            .expect("history");
        let order: Vec<MrvId> = history.iter().map(|s| s.mrv_id.clone()).collect();
        let mut expected = ids;
        expected.push(last);
        assert_eq!(order, expected);
        assert_eq!(history.last().map(|s| s.seq), Some(6));
    }

    #[test]
    fn delete_project_sets_reference_null() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("mrv.redb")).expect("open db");
        store.upsert_project(Project::new("p")).expect("project");
        let id = store.insert_score(new_score("p", [2; 6])).expect("insert");

        assert!(store.delete_project(&ProjectId::new("p")).expect("delete"));

        assert!(store.list_projects().is_empty());
        let orphan = store.get_score(&id).expect("get").expect("survives");
        assert_eq!(orphan.project_id, None);
        assert_eq!(orphan.ratings.to_array(), [2; 6]);
        assert!(
            store
                .scores_for_project(&ProjectId::new("p"))
                .expect("history")
                .is_empty()
        );
    }

    #[test]
    fn upsert_replaces_project() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("mrv.redb")).expect("open db");
        store
            .upsert_project(Project::new("p").with_status("draft"))
            .expect("project");
        store
            .upsert_project(Project::new("p").with_status("active"))
            .expect("project");

        let projects = store.list_projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project.status.as_deref(), Some("active"));
    }

    #[test]
    fn get_missing_score_is_none() {
        let temp = tempdir().expect("temp dir");
        let store = RedbStore::open(temp.path().join("mrv.redb")).expect("open db");
        assert!(store.get_score(&MrvId::generate()).expect("get").is_none());
    }

    #[test]
    fn compact_and_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("mrv.redb");
        {
            let mut store = RedbStore::open(&path).expect("open db");
            store.insert_score(new_score("p", [3; 6])).expect("insert");
            store.compact().expect("compact");
        }
        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.score_count().expect("count"), 1);
    }
}
