//! # CLI Command Implementations

use crate::api;
use crate::config::{MrvConfig, ServerSettings};
use mrv_core::{
    Dimension, INTRODUCTION, KEY_CONCEPTS, MrvError, Project, ProjectId, Ratings, Session,
    StorageBackend, render_concepts,
};
use std::path::{Path, PathBuf};

/// Printed wherever a project is needed but the registry is empty.
pub const NO_PROJECTS_NOTICE: &str =
    "No projects found. Add one with `mrv project add --id <ID>` before saving scores.";

// =============================================================================
// PATH VALIDATION
// =============================================================================

/// Validate an output path: the parent directory must exist.
///
/// Returns the path with its parent canonicalized.
fn validate_output_path(path: &Path) -> Result<PathBuf, MrvError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        MrvError::Storage(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(MrvError::Storage(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| MrvError::Storage("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    config: &MrvConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), MrvError> {
    let session = open_session(db_path)?;
    let settings = ServerSettings::from_config(&config.server).with_overrides(host, port);

    println!("MRV Readiness Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", settings.addr());
    println!("  Database: {}", db_path.display());
    println!(
        "  Auth:     {}",
        if settings.api_key.is_some() {
            "api key"
        } else {
            "disabled"
        }
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /health                      - Health check");
    println!("  GET  /concepts                    - Key concepts");
    println!("  GET  /projects                    - List projects");
    println!("  POST /assess                      - Score ratings (no write)");
    println!("  POST /scores                      - Save a snapshot");
    println!("  GET  /projects/{{project_id}}/scores - Snapshot history");
    println!("  POST /report                      - Markdown snapshot");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&settings, session).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Open the store, creating the schema.
pub fn cmd_init(db_path: &Path, json_mode: bool) -> Result<(), MrvError> {
    let session = open_session(db_path)?;
    let schema_version = match session.backend() {
        StorageBackend::Persistent(store) => store.schema_version()?,
        StorageBackend::InMemory(_) | StorageBackend::Custom(_) => None,
    };
    let scores = session.score_count()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "schema_version": schema_version,
            "projects": session.list_projects().len(),
            "scores": scores,
        }));
        return Ok(());
    }

    println!("Initialized MRV database at {}", db_path.display());
    if let Some(version) = schema_version {
        println!("  Schema version: {}", version);
    }
    println!("  Projects:       {}", session.list_projects().len());
    println!("  Saved scores:   {}", scores);
    Ok(())
}

// =============================================================================
// CONCEPTS COMMAND
// =============================================================================

/// Print the key concepts.
pub fn cmd_concepts(json_mode: bool) -> Result<(), MrvError> {
    if json_mode {
        print_json(&serde_json::json!({
            "introduction": INTRODUCTION,
            "concepts": KEY_CONCEPTS,
        }));
        return Ok(());
    }
    println!("{}", render_concepts());
    Ok(())
}

// =============================================================================
// PROJECT COMMANDS
// =============================================================================

/// List projects with their labels.
pub fn cmd_projects(db_path: &Path, json_mode: bool) -> Result<(), MrvError> {
    let session = open_session(db_path)?;
    let projects = session.list_projects();

    if json_mode {
        print_json(&serde_json::json!({ "projects": projects }));
        return Ok(());
    }

    if projects.is_empty() {
        println!("{}", NO_PROJECTS_NOTICE);
        return Ok(());
    }

    println!("Projects");
    println!("========");
    for entry in &projects {
        let status = entry.project.status.as_deref().unwrap_or("-");
        let updated = entry.project.updated_at.as_deref().unwrap_or("-");
        println!(
            "  {:<20} {:<40} {:<12} {}",
            entry.project.project_id, entry.label, status, updated
        );
    }
    Ok(())
}

/// Add or replace a project.
pub fn cmd_project_add(
    db_path: &Path,
    json_mode: bool,
    id: String,
    code: Option<String>,
    name: Option<String>,
    status: Option<String>,
) -> Result<(), MrvError> {
    if id.trim().is_empty() {
        return Err(MrvError::InvalidInput(
            "Project id must not be empty".to_string(),
        ));
    }

    let mut session = open_session(db_path)?;
    let mut project = Project::new(id).with_updated_at(now_rfc3339());
    if let Some(code) = code {
        project = project.with_code(code);
    }
    if let Some(name) = name {
        project = project.with_name(name);
    }
    if let Some(status) = status {
        project = project.with_status(status);
    }

    let label = project.label();
    let project_id = project.project_id.clone();
    session.upsert_project(project)?;
    tracing::info!(project_id = %project_id, "project saved");

    if json_mode {
        print_json(&serde_json::json!({ "project_id": project_id, "label": label }));
    } else {
        println!("Saved project {} ({})", project_id, label);
    }
    Ok(())
}

/// Remove a project. Saved scores stay, unlinked.
pub fn cmd_project_remove(db_path: &Path, json_mode: bool, id: &str) -> Result<(), MrvError> {
    let mut session = open_session(db_path)?;
    let project_id = ProjectId::new(id);
    let removed = session.delete_project(&project_id)?;

    if json_mode {
        print_json(&serde_json::json!({ "project_id": project_id, "removed": removed }));
    } else if removed {
        println!("Removed project {}; its saved scores are kept", project_id);
    } else {
        println!("Project {} not found", project_id);
    }
    Ok(())
}

// =============================================================================
// ASSESS COMMAND
// =============================================================================

/// Inputs of one `assess` run.
#[derive(Debug, Clone)]
pub struct AssessOptions {
    pub project: Option<String>,
    pub ratings: Ratings,
    pub notes: String,
    pub save: bool,
    pub report: Option<PathBuf>,
}

/// Score ratings, print the narrative, optionally save and write a report.
pub fn cmd_assess(db_path: &Path, json_mode: bool, options: AssessOptions) -> Result<(), MrvError> {
    validate_notes(&options.notes)?;

    let mut session = open_session(db_path)?;
    if let Some(id) = &options.project {
        session.select_project(&ProjectId::new(id.as_str()))?;
    }

    let active = session.active_project();
    if active.is_none() && !json_mode {
        println!("{}", NO_PROJECTS_NOTICE);
        println!();
    }

    let assessment = session.assess(options.ratings);

    // Everything that can reject the report is checked before the row is written.
    let pending_report = match &options.report {
        Some(path) => {
            let project = active.as_ref().ok_or(MrvError::NoActiveProject)?;
            let report = session.report(&project.project.project_id, &assessment, &options.notes)?;
            Some((validate_output_path(path)?, report))
        }
        None => None,
    };

    let saved = if options.save {
        let id = session.save(&assessment, &options.notes)?;
        tracing::info!(mrv_id = %id, "MRV score saved");
        Some(id)
    } else {
        None
    };

    let report_path = match pending_report {
        Some((output, report)) => {
            std::fs::write(&output, report.as_bytes()).map_err(|e| match &saved {
                Some(id) => MrvError::Storage(format!(
                    "Saved MRV score {}, but writing the report failed: {}",
                    id, e
                )),
                None => MrvError::Storage(format!("Write report: {}", e)),
            })?;
            Some(output)
        }
        None => None,
    };

    if json_mode {
        let progress = assessment.progress();
        print_json(&serde_json::json!({
            "project": active.as_ref().map(|p| &p.project.project_id),
            "ratings": assessment.ratings,
            "score_pct": assessment.score_pct,
            "stage": assessment.stage,
            "points_to_next": progress.points_to_next,
            "narrative": assessment.narrative,
            "mrv_id": saved,
            "report": report_path.as_ref().map(|p| p.to_string_lossy()),
        }));
        return Ok(());
    }

    if let Some(project) = &active {
        println!("Project: {}", project.label);
        println!();
    }
    for dimension in Dimension::ALL {
        println!(
            "  {:<14} {}/5  {}",
            dimension.key(),
            assessment.ratings.get(dimension),
            dimension.prompt()
        );
    }
    println!();
    println!("{}", assessment.narrative);

    let progress = assessment.progress();
    if let (Some(next), Some(points)) = (progress.next, progress.points_to_next) {
        println!();
        println!("{:.1} points to {}", points, next.name());
    }

    if let Some(id) = saved {
        println!();
        println!("Saved MRV score: {}", id);
    }
    if let Some(path) = report_path {
        println!("Wrote snapshot to {}", path.display());
    }
    Ok(())
}

// =============================================================================
// HISTORY COMMAND
// =============================================================================

/// List a project's saved snapshots with deltas.
pub fn cmd_history(db_path: &Path, json_mode: bool, project: &str) -> Result<(), MrvError> {
    let session = open_session(db_path)?;
    let project_id = ProjectId::new(project);
    let history = session.history(&project_id)?;

    if json_mode {
        print_json(&serde_json::json!({
            "project_id": project_id,
            "entries": history,
        }));
        return Ok(());
    }

    if history.is_empty() {
        println!("No saved scores for project {}", project_id);
        return Ok(());
    }

    println!("History for {}", project_id);
    println!("{}", "=".repeat(12 + project_id.as_str().len()));
    for entry in &history {
        let change = entry
            .change_pct
            .map(|c| format!("{:+.1}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  {:>5.1}%  {:>6}  {}",
            entry.score.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.score.score_pct,
            change,
            entry.score.mrv_id
        );
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the persistent session at `db_path`.
pub fn open_session(db_path: &Path) -> Result<Session, MrvError> {
    Session::with_redb(db_path)
}

/// Reject notes above the storage limit.
pub fn validate_notes(notes: &str) -> Result<(), MrvError> {
    if notes.len() > mrv_core::primitives::MAX_NOTES_LENGTH {
        return Err(MrvError::InvalidInput(format!(
            "Notes length {} exceeds maximum {} bytes",
            notes.len(),
            mrv_core::primitives::MAX_NOTES_LENGTH
        )));
    }
    Ok(())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

// =============================================================================
// TESTS
// =============================================================================
