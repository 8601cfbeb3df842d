//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        AssessRequest, AssessResponse, ConceptsResponse, HealthResponse, HistoryResponse,
        ProjectsResponse, ReportResponse, SaveScoreResponse, SnapshotRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use mrv_core::{MrvError, ProjectId};

/// HTTP status for a core error.
fn status_for(error: &MrvError) -> StatusCode {
    match error {
        MrvError::InvalidRating { .. } | MrvError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MrvError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
        MrvError::NoActiveProject => StatusCode::CONFLICT,
        MrvError::ScoreWrite { .. }
        | MrvError::Serialization(_)
        | MrvError::Storage(_)
        | MrvError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// READ-ONLY HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Key concepts.
pub async fn concepts_handler() -> impl IntoResponse {
    Json(ConceptsResponse::default())
}

/// List projects. Storage failures yield an empty list.
pub async fn projects_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let response = ProjectsResponse {
        projects: session.list_projects(),
        active: session.active_project().map(|p| p.project.project_id),
    };
    (StatusCode::OK, Json(response))
}

// =============================================================================
// ASSESS HANDLER
// =============================================================================

/// Score ratings. Nothing is written.
pub async fn assess_handler(
    State(state): State<AppState>,
    Json(request): Json<AssessRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.ratings.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AssessResponse::error(format!("Invalid ratings: {}", e))),
        );
    }

    let session = state.session.read().await;
    let assessment = session.assess(request.ratings);
    (StatusCode::OK, Json(AssessResponse::success(&assessment)))
}

// =============================================================================
// SAVE HANDLER
// =============================================================================

/// Score ratings and append the snapshot to a project's history.
pub async fn save_score_handler(
    State(state): State<AppState>,
    Json(request): Json<SnapshotRequest>,
) -> impl IntoResponse {
    let ratings = match request.validate() {
        Ok(r) => r,
        Err(e) => {
            return (
                status_for(&e),
                Json(SaveScoreResponse::error(format!("Invalid request: {}", e))),
            );
        }
    };

    let mut session = state.session.write().await;
    let assessment = session.assess(ratings);
    let result = match &request.project_id {
        Some(project_id) => session.save_for(project_id, &assessment, &request.notes),
        None => session.save(&assessment, &request.notes),
    };

    match result {
        Ok(mrv_id) => {
            tracing::info!(mrv_id = %mrv_id, score_pct = assessment.score_pct, "MRV score saved");
            (StatusCode::OK, Json(SaveScoreResponse::success(mrv_id)))
        }
        Err(e) => {
            tracing::error!(error = %e, "MRV score not saved");
            (status_for(&e), Json(SaveScoreResponse::error(e.to_string())))
        }
    }
}

// =============================================================================
// HISTORY HANDLER
// =============================================================================

/// Saved snapshots of one project, oldest first.
pub async fn history_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> impl IntoResponse {
    let project_id = ProjectId::new(project_id);
    let session = state.session.read().await;
    match session.history(&project_id) {
        Ok(entries) => (
            StatusCode::OK,
            Json(HistoryResponse::success(project_id, entries)),
        ),
        Err(e) => (
            status_for(&e),
            Json(HistoryResponse::error(project_id, e.to_string())),
        ),
    }
}

// =============================================================================
// REPORT HANDLER
// =============================================================================

/// Render the markdown snapshot without saving.
pub async fn report_handler(
    State(state): State<AppState>,
    Json(request): Json<SnapshotRequest>,
) -> impl IntoResponse {
    let ratings = match request.validate() {
        Ok(r) => r,
        Err(e) => {
            return (
                status_for(&e),
                Json(ReportResponse::error(format!("Invalid request: {}", e))),
            );
        }
    };

    let session = state.session.read().await;
    let project_id = match request.project_id {
        Some(id) => id,
        None => match session.active_project() {
            Some(entry) => entry.project.project_id,
            None => {
                let e = MrvError::NoActiveProject;
                return (status_for(&e), Json(ReportResponse::error(e.to_string())));
            }
        },
    };

    let assessment = session.assess(ratings);
    match session.report(&project_id, &assessment, &request.notes) {
        Ok(report) => (StatusCode::OK, Json(ReportResponse::success(report))),
        Err(e) => (status_for(&e), Json(ReportResponse::error(e.to_string()))),
    }
}
