//! # Centile HTTP API Module
//!
//! This module implements the Screen Presenter boundary as an HTTP REST API
//! using axum. The presenter (a browser front end) renders whatever the core
//! describes for the current stage and posts raw values back; all survey
//! logic stays in `centile-core`.
//!
//! ## Endpoints
//!
//! - `POST /session` - Create a participant session
//! - `GET  /session/{id}/screen` - Re-render the current screen
//! - `POST /session/{id}/advance` - Attempt one stage transition
//! - `GET  /status` - Session counts and sink description
//! - `GET  /health` - Health check
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `CENTILE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `CENTILE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)

mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `centile::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    advance_handler, create_session_handler, health_handler, screen_handler, status_handler,
};
#[allow(unused_imports)]
pub use types::{
    AdvanceAction, AdvanceRequest, AdvanceResponse, ErrorResponse, HealthResponse,
    PredictionEntry, SessionResponse, StatusResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use centile_core::{QuestionSet, SurveyConfig, SurveyError, SurveySession};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::sink::StoreBackend;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: sessions, the sink, and the survey policy.
#[derive(Clone)]
pub struct AppState {
    /// Live participant sessions by id.
    pub sessions: Arc<RwLock<HashMap<Uuid, SurveySession>>>,
    /// The configured persistence sink; all appends serialize here.
    pub sink: Arc<Mutex<StoreBackend>>,
    /// The active question set.
    pub questions: Arc<QuestionSet>,
    /// The survey policy.
    pub config: Arc<SurveyConfig>,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(questions: QuestionSet, config: SurveyConfig, sink: StoreBackend) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            sink: Arc::new(Mutex::new(sink)),
            questions: Arc::new(questions),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `CENTILE_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("CENTILE_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (CENTILE_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in CENTILE_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No CENTILE_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests from the survey front end
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects the public endpoints (if enabled)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/session", post(handlers::create_session_handler))
        .route("/session/{id}/screen", get(handlers::screen_handler))
        .route("/session/{id}/advance", post(handlers::advance_handler));

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(256 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), SurveyError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SurveyError::Io(format!("Bind failed: {e}")))?;

    tracing::info!("Centile HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| SurveyError::Io(format!("Server error: {e}")))
}
