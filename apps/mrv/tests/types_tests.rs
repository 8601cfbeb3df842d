//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use mrv::api::{
    AssessRequest, AssessResponse, ConceptsResponse, HealthResponse, ReportResponse,
    SaveScoreResponse, SnapshotRequest,
};
use mrv_core::{
    Assessment, MrvError, MrvId, ProjectId, Ratings, SnapshotReport, Stage, primitives,
};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// CONCEPTS RESPONSE TESTS
// =============================================================================

#[test]
fn test_concepts_numbered_in_order() {
    let concepts = ConceptsResponse::default();
    let numbers: Vec<u8> = concepts.concepts.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}

// =============================================================================
// REQUEST TESTS
// =============================================================================

#[test]
fn test_assess_request_defaults_ratings() {
    let request: AssessRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(request.ratings, Ratings::default());
}

#[test]
fn test_assess_request_partial_ratings_use_defaults() {
    let request: AssessRequest = serde_json::from_str(r#"{"ratings":{"boundary":5}}"#).unwrap();
    assert_eq!(request.ratings.to_array(), [5, 3, 3, 2, 3, 2]);
}

#[test]
fn test_snapshot_request_partial_ratings_use_defaults() {
    let json = r#"{"project_id":"p-1","ratings":{"ef_trace":5,"uncertainty":4}}"#;
    let request: SnapshotRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.validate().unwrap().to_array(), [3, 3, 3, 5, 3, 4]);
}

#[test]
fn test_snapshot_request_minimal() {
    let json = r#"{"ratings":{"boundary":1,"baseline":2,"assumptions":3,"ef_trace":4,"data_quality":5,"uncertainty":0}}"#;
    let request: SnapshotRequest = serde_json::from_str(json).unwrap();
    assert!(request.project_id.is_none());
    assert!(request.notes.is_empty());
    assert_eq!(request.validate().unwrap().to_array(), [1, 2, 3, 4, 5, 0]);
}

#[test]
fn test_snapshot_request_project_id_is_plain_string() {
    let json = r#"{"project_id":"p-7"}"#;
    let request: SnapshotRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.project_id, Some(ProjectId::new("p-7")));
}

#[test]
fn test_snapshot_request_rejects_rating() {
    let request = SnapshotRequest {
        ratings: Ratings {
            data_quality: 8,
            ..Ratings::default()
        },
        ..SnapshotRequest::default()
    };
    assert!(matches!(
        request.validate(),
        Err(MrvError::InvalidRating { value: 8, .. })
    ));
}

#[test]
fn test_snapshot_request_rejects_long_notes() {
    let request = SnapshotRequest {
        notes: "n".repeat(primitives::MAX_NOTES_LENGTH + 1),
        ..SnapshotRequest::default()
    };
    assert!(matches!(request.validate(), Err(MrvError::InvalidInput(_))));
}

// =============================================================================
// RESPONSE TESTS
// =============================================================================

#[test]
fn test_assess_response_success() {
    let assessment = Assessment::evaluate(Ratings::new([5; 6]).unwrap());
    let response = AssessResponse::success(&assessment);

    assert!(response.success);
    assert_eq!(response.stage, Some(Stage::Strong));
    assert_eq!(response.next_stage, None);
    assert_eq!(response.points_to_next, None);
    assert_eq!(
        response.stage_label.as_deref(),
        Some("Strong (approaching audit-ready structure)")
    );
}

#[test]
fn test_assess_response_error_serialization() {
    let response = AssessResponse::error("bad");
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"success\":false"));
    assert!(json.contains("\"error\":\"bad\""));
    assert!(json.contains("\"score_pct\":null"));
}

#[test]
fn test_save_score_response_roundtrip() {
    let response = SaveScoreResponse::success(MrvId("abc".to_string()));
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"mrv_id\":\"abc\""));

    let back: SaveScoreResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(back.mrv_id, Some(MrvId("abc".to_string())));
    assert!(back.error.is_none());
}

#[test]
fn test_report_response_encodes_body() {
    let report = SnapshotReport::new(
        "CR-1 — Test",
        chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        "narrative",
        "",
    );
    let body = report.body.clone();
    let response = ReportResponse::success(report);

    assert_eq!(response.content.as_deref(), Some(body.as_str()));
    assert!(response.content.unwrap().contains("- Date: 2026-01-15"));
    assert!(!response.data.unwrap().is_empty());
}
