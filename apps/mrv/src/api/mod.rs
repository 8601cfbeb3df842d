//! # MRV HTTP API Module
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /concepts` - Key concepts
//! - `GET /projects` - Project listing with labels
//! - `POST /assess` - Score ratings (no write)
//! - `POST /scores` - Save a snapshot for a project
//! - `GET /projects/{project_id}/scores` - Snapshot history
//! - `POST /report` - Markdown snapshot for download
//!
//! ## Security
//!
//! Settings come from [`ServerSettings`]: allowed CORS origins (localhost
//! only by default), a global rate limit and an optional bearer API key.

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::ApiKey;
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    AssessRequest, AssessResponse, ConceptJson, ConceptsResponse, HealthResponse, HistoryResponse,
    ProjectsResponse, ReportResponse, SaveScoreResponse, SnapshotRequest,
};

use crate::config::ServerSettings;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use mrv_core::{MrvError, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state. Writes (saves) take the lock exclusively.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `["*"]`: all origins
/// - `None` or no valid origin: localhost only
/// - otherwise: the listed origins
fn build_cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some([only]) if only == "*" => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Rate limiting (if enabled)
/// 4. Authentication (if a key is configured)
pub fn create_router(state: AppState, settings: &ServerSettings) -> Router {
    let cors = build_cors_layer(settings.cors_origins.as_deref());

    let rate_limiter = if settings.rate_limit > 0 {
        tracing::info!(
            "Rate limiting enabled: {} requests/second",
            settings.rate_limit
        );
        Some(create_rate_limiter(settings.rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let api_key = ApiKey::new(settings.api_key.as_deref());
    if api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible. \
             Set MRV_API_KEY or [server] api_key to enable it."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/concepts", get(handlers::concepts_handler))
        .route("/projects", get(handlers::projects_handler))
        .route(
            "/projects/{project_id}/scores",
            get(handlers::history_handler),
        )
        .route("/assess", post(handlers::assess_handler))
        .route("/scores", post(handlers::save_score_handler))
        .route("/report", post(handlers::report_handler));

    if let Some(key) = api_key {
        router = router.layer(axum_middleware::from_fn_with_state(
            key,
            auth::api_key_auth_middleware,
        ));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(256 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server. Stops on Ctrl+C.
pub async fn run_server(settings: &ServerSettings, session: Session) -> Result<(), MrvError> {
    let state = AppState::new(session);
    let router = create_router(state, settings);
    let addr = settings.addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MrvError::Config(format!("Bind {} failed: {}", addr, e)))?;

    tracing::info!("MRV HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("Ctrl+C handler unavailable; stop the process to shut down");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await
        .map_err(|e| MrvError::Storage(format!("Server error: {}", e)))
}
