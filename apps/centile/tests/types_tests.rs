//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use centile::api::{
    AdvanceAction, AdvanceRequest, AdvanceResponse, HealthResponse, PredictionEntry,
    StatusResponse,
};
use centile_core::{Band, QuestionId, ScreenSpec, Stage, SurveyError};

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
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        active_sessions: 4,
        completed_sessions: 11,
        question_count: 15,
        backend: "local file results.csv".to_string(),
    };

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"active_sessions\":4"));
    assert!(json.contains("\"completed_sessions\":11"));
    assert!(json.contains("\"question_count\":15"));
}

// =============================================================================
// ADVANCE REQUEST TESTS
// =============================================================================

#[test]
fn test_advance_request_instructions_defaults_blank_wechat() {
    let request: AdvanceRequest = serde_json::from_str(r#"{"stage": "instructions"}"#).unwrap();
    match request.into_action().unwrap() {
        AdvanceAction::Instructions { wechat_id } => assert_eq!(wechat_id, ""),
        other => panic!("expected instructions action, got {other:?}"),
    }
}

#[test]
fn test_advance_request_consent_parses_choice() {
    let request: AdvanceRequest = serde_json::from_str(
        r#"{"stage": "consent", "confirmed": true, "share_choice": "identifiable"}"#,
    )
    .unwrap();
    match request.into_action().unwrap() {
        AdvanceAction::Consent(input) => {
            assert!(input.confirmed);
            assert_eq!(
                input.share_choice,
                Some(centile_core::ConsentChoice::Identifiable)
            );
        }
        other => panic!("expected consent action, got {other:?}"),
    }
}

#[test]
fn test_advance_request_unknown_consent_rejected() {
    let request: AdvanceRequest = serde_json::from_str(
        r#"{"stage": "consent", "confirmed": true, "share_choice": "everything"}"#,
    )
    .unwrap();
    assert!(matches!(
        request.into_action(),
        Err(SurveyError::UnknownConsent(_))
    ));
}

#[test]
fn test_prediction_entry_round_trip() {
    let entry = PredictionEntry {
        prediction: 48,
        band: "wide".to_string(),
    };
    let json = serde_json::to_string(&entry).unwrap();
    let back: PredictionEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back.prediction, 48);
    assert_eq!(back.band, "wide");
}

#[test]
fn test_prediction_request_converts_bands() {
    let request: AdvanceRequest = serde_json::from_str(
        r#"{"stage": "prediction", "entries": {
            "1": {"prediction": 12, "band": "narrow"},
            "2": {"prediction": 48, "band": "wide"}
        }}"#,
    )
    .unwrap();
    match request.into_action().unwrap() {
        AdvanceAction::Prediction(entries) => {
            assert_eq!(entries.get(&QuestionId(1)).unwrap().band, Band::Narrow);
            assert_eq!(entries.get(&QuestionId(2)).unwrap().band, Band::Wide);
        }
        other => panic!("expected prediction action, got {other:?}"),
    }
}

#[test]
fn test_unknown_stage_tag_rejected() {
    let result: Result<AdvanceRequest, _> =
        serde_json::from_str(r#"{"stage": "bonus_round", "answers": {}}"#);
    assert!(result.is_err());
}

// =============================================================================
// ADVANCE RESPONSE TESTS
// =============================================================================

#[test]
fn test_advance_response_accepted() {
    let response = AdvanceResponse::accepted(Stage::Done, ScreenSpec::Done { base_fee: 10 });
    assert!(response.ok);
    assert!(!response.retryable);
    assert!(response.error.is_none());

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"stage\":\"done\""));
}

#[test]
fn test_advance_response_rejected_persistence_is_retryable() {
    let error = SurveyError::Persistence("gateway down".to_string());
    let response = AdvanceResponse::rejected(Stage::Prediction, &error);
    assert!(!response.ok);
    assert!(response.retryable);
    assert!(response.error.unwrap().contains("gateway down"));
}

#[test]
fn test_advance_response_rejected_validation_is_not_retryable() {
    let error = SurveyError::Validation {
        stage: Stage::SelfReport,
        reason: "q2 is missing an answer".to_string(),
    };
    let response = AdvanceResponse::rejected(Stage::SelfReport, &error);
    assert!(!response.ok);
    assert!(!response.retryable);
}
