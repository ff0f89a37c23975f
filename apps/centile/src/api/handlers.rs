//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers. Sessions live in
//! a shared map; each participant drives one session serially. The only
//! blocking work is the final submit's sink append, which runs on the
//! blocking pool so a slow sheet gateway never stalls the async executor.

use super::{
    AppState,
    types::{
        AdvanceAction, AdvanceRequest, AdvanceResponse, ErrorResponse, HealthResponse,
        SessionResponse, StatusResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use centile_core::{Stage, SurveyError, SurveySession};
use std::collections::BTreeMap;
use uuid::Uuid;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Server status: session counts and the configured sink.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.read().await;
    let completed = sessions.values().filter(|s| s.is_complete()).count();
    let backend = state.sink.lock().await.describe();

    let response = StatusResponse {
        active_sessions: sessions.len() - completed,
        completed_sessions: completed,
        question_count: state.questions.len(),
        backend,
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// SESSION CREATION
// =============================================================================

/// Create a fresh participant session and return its first screen.
pub async fn create_session_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = SurveySession::new(&state.questions, &state.config);
    let participant_id = session.participant_id();
    let screen = session.screen(&state.questions);
    let stage = session.stage();

    state.sessions.write().await.insert(participant_id, session);
    tracing::info!(%participant_id, "session created");

    (
        StatusCode::CREATED,
        Json(SessionResponse {
            participant_id,
            stage,
            screen,
        }),
    )
}

// =============================================================================
// SCREEN HANDLER
// =============================================================================

/// Re-render the current screen for a session.
///
/// Idempotent except for the prediction screen's one-shot scroll signal,
/// which only the first render after entering the stage carries.
pub async fn screen_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        return session_not_found(id).into_response();
    };

    let screen = session.screen(&state.questions);
    (
        StatusCode::OK,
        Json(SessionResponse {
            participant_id: id,
            stage: session.stage(),
            screen,
        }),
    )
        .into_response()
}

// =============================================================================
// ADVANCE HANDLER
// =============================================================================

/// Attempt one stage transition.
///
/// - `200` — transition accepted; the body carries the next screen
/// - `404` — unknown session
/// - `422` — validation refused; the session is unchanged
/// - `502` — the sink failed on final submit; `retryable` is set and the
///   same payload can be re-submitted without re-entering prior stages
pub async fn advance_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdvanceRequest>,
) -> Response {
    // Reject malformed values (unknown bands, out-of-range sliders) before
    // touching the session.
    let action = match request.into_action() {
        Ok(action) => action,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response();
        }
    };

    match action {
        AdvanceAction::Prediction(predictions) => submit(state, id, predictions).await,
        AdvanceAction::Consent(input) => {
            advance_in_place(state, id, move |session| session.advance_consent(&input)).await
        }
        AdvanceAction::Instructions { wechat_id } => {
            advance_in_place(state, id, move |session| {
                session.advance_instructions(&wechat_id)
            })
            .await
        }
        AdvanceAction::SelfReport(answers) => {
            advance_in_place(state, id, move |session| {
                session.advance_self_report(&answers)
            })
            .await
        }
    }
}

/// Run a validation-only transition under the session-map lock.
async fn advance_in_place(
    state: AppState,
    id: Uuid,
    transition: impl FnOnce(&mut SurveySession) -> Result<Stage, SurveyError>,
) -> Response {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        return session_not_found(id).into_response();
    };

    match transition(session) {
        Ok(stage) => {
            let screen = session.screen(&state.questions);
            (StatusCode::OK, Json(AdvanceResponse::accepted(stage, screen))).into_response()
        }
        Err(e) => {
            tracing::debug!(%id, error = %e, "transition refused");
            (
                advance_error_status(&e),
                Json(AdvanceResponse::rejected(session.stage(), &e)),
            )
                .into_response()
        }
    }
}

/// Run the final submit on the blocking pool: sink I/O is synchronous.
async fn submit(
    state: AppState,
    id: Uuid,
    predictions: BTreeMap<centile_core::QuestionId, centile_core::PredictionInput>,
) -> Response {
    let sessions = state.sessions.clone();
    let sink = state.sink.clone();
    let questions = state.questions.clone();

    let joined = tokio::task::spawn_blocking(move || {
        let mut sessions = sessions.blocking_write();
        let session = sessions.get_mut(&id)?;
        let mut sink = sink.blocking_lock();
        let outcome = match session.submit(&predictions, &questions, &mut *sink) {
            Ok(stage) => Ok((stage, session.screen(&questions))),
            Err(e) => Err((session.stage(), e)),
        };
        Some(outcome)
    })
    .await;

    let Ok(outcome) = joined else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("submit task failed")),
        )
            .into_response();
    };
    match outcome {
        None => session_not_found(id).into_response(),
        Some(Ok((stage, screen))) => {
            tracing::info!(%id, "response persisted");
            (StatusCode::OK, Json(AdvanceResponse::accepted(stage, screen))).into_response()
        }
        Some(Err((stage, e))) => {
            tracing::warn!(%id, error = %e, "submit refused or failed");
            (advance_error_status(&e), Json(AdvanceResponse::rejected(stage, &e))).into_response()
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn session_not_found(id: Uuid) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("unknown session {id}"))),
    )
}

/// Map a refused or failed transition onto an HTTP status.
fn advance_error_status(error: &SurveyError) -> StatusCode {
    if error.is_retryable() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}
