//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API. Incoming
//! payloads carry raw strings and integers; conversion into the core's closed
//! types happens here, at the boundary, so an unknown band or an out-of-range
//! slider value is rejected before it reaches the session.

use centile_core::{
    ConsentChoice, ConsentInput, PredictionInput, QuestionId, ScaleValue, ScreenSpec, Stage,
    SurveyError,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Deserialize a `BTreeMap` with `u16` keys.
///
/// Internally-tagged enums (`#[serde(tag = "stage")]`) buffer their payload
/// into an intermediate representation whose map keys are stored as strings;
/// that buffer cannot re-parse integer keys directly. Reading the map with
/// string keys (which the buffer supports) and parsing each key to `u16` here
/// preserves the integer-keyed wire format without changing any behavior.
fn btreemap_u16_keys<'de, D, V>(deserializer: D) -> Result<BTreeMap<u16, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let string_keyed: BTreeMap<String, V> = BTreeMap::deserialize(deserializer)?;
    string_keyed
        .into_iter()
        .map(|(key, value)| {
            key.parse::<u16>()
                .map(|key| (key, value))
                .map_err(serde::de::Error::custom)
        })
        .collect()
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Server status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Sessions currently in progress.
    pub active_sessions: usize,
    /// Sessions that reached the terminal stage.
    pub completed_sessions: usize,
    /// Number of questions in the active set.
    pub question_count: usize,
    /// Description of the configured sink.
    pub backend: String,
}

// =============================================================================
// SESSION RESPONSES
// =============================================================================

/// A session's identity plus the screen to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The participant's session id.
    pub participant_id: Uuid,
    /// The active stage.
    pub stage: Stage,
    /// What to render.
    pub screen: ScreenSpec,
}

/// Outcome of an advance attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceResponse {
    /// Whether the transition was accepted.
    pub ok: bool,
    /// The stage after the attempt (unchanged on refusal).
    pub stage: Stage,
    /// The screen to render next.
    pub screen: Option<ScreenSpec>,
    /// Refusal or failure message.
    pub error: Option<String>,
    /// Whether re-submitting the same payload may succeed (sink failures).
    pub retryable: bool,
}

impl AdvanceResponse {
    /// An accepted transition.
    #[must_use]
    pub fn accepted(stage: Stage, screen: ScreenSpec) -> Self {
        Self {
            ok: true,
            stage,
            screen: Some(screen),
            error: None,
            retryable: false,
        }
    }

    /// A refused or failed transition; the stage is unchanged.
    #[must_use]
    pub fn rejected(stage: Stage, error: &SurveyError) -> Self {
        Self {
            ok: false,
            stage,
            screen: None,
            error: Some(error.to_string()),
            retryable: error.is_retryable(),
        }
    }
}

/// Generic error body for non-advance failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

// =============================================================================
// ADVANCE REQUEST
// =============================================================================

/// One stage-tagged advance payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AdvanceRequest {
    /// Consent screen: confirmation plus sharing election.
    Consent {
        confirmed: bool,
        #[serde(default)]
        share_choice: Option<String>,
    },
    /// Instructions screen: payment identifier (blank means cash).
    Instructions {
        #[serde(default)]
        wechat_id: String,
    },
    /// Stage-1 answers keyed by question id.
    SelfReport {
        #[serde(deserialize_with = "btreemap_u16_keys")]
        answers: BTreeMap<u16, u8>,
    },
    /// Stage-2 predictions and bands keyed by question id.
    Prediction {
        #[serde(deserialize_with = "btreemap_u16_keys")]
        entries: BTreeMap<u16, PredictionEntry>,
    },
}

/// One question's prediction-screen input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionEntry {
    /// Predicted group median, 0..=100.
    pub prediction: u8,
    /// Band choice: "narrow" or "wide".
    pub band: String,
}

/// The converted, core-typed advance action.
#[derive(Debug, Clone)]
pub enum AdvanceAction {
    Consent(ConsentInput),
    Instructions { wechat_id: String },
    SelfReport(BTreeMap<QuestionId, ScaleValue>),
    Prediction(BTreeMap<QuestionId, PredictionInput>),
}

impl AdvanceRequest {
    /// Convert raw wire values into the core's closed types.
    ///
    /// Unknown bands, unknown consent choices, and out-of-range slider
    /// values are rejected here, before any session state is touched.
    pub fn into_action(self) -> Result<AdvanceAction, SurveyError> {
        match self {
            AdvanceRequest::Consent {
                confirmed,
                share_choice,
            } => {
                let share_choice = share_choice
                    .map(|raw| raw.parse::<ConsentChoice>())
                    .transpose()?;
                Ok(AdvanceAction::Consent(ConsentInput {
                    confirmed,
                    share_choice,
                }))
            }
            AdvanceRequest::Instructions { wechat_id } => {
                Ok(AdvanceAction::Instructions { wechat_id })
            }
            AdvanceRequest::SelfReport { answers } => {
                let mut converted = BTreeMap::new();
                for (id, value) in answers {
                    converted.insert(QuestionId(id), ScaleValue::new(value)?);
                }
                Ok(AdvanceAction::SelfReport(converted))
            }
            AdvanceRequest::Prediction { entries } => {
                let mut converted = BTreeMap::new();
                for (id, entry) in entries {
                    converted.insert(
                        QuestionId(id),
                        PredictionInput {
                            prediction: ScaleValue::new(entry.prediction)?,
                            band: entry.band.parse()?,
                        },
                    );
                }
                Ok(AdvanceAction::Prediction(converted))
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use centile_core::Band;

    #[test]
    fn advance_request_parses_stage_tag() {
        let request: AdvanceRequest = serde_json::from_str(
            r#"{"stage": "self_report", "answers": {"1": 10, "2": 50, "3": 90}}"#,
        )
        .expect("parse");
        let action = request.into_action().expect("convert");
        match action {
            AdvanceAction::SelfReport(answers) => {
                assert_eq!(answers.len(), 3);
                assert_eq!(
                    answers.get(&QuestionId(2)).map(|v| v.value()),
                    Some(50)
                );
            }
            other => panic!("expected self-report action, got {other:?}"),
        }
    }

    #[test]
    fn unknown_band_rejected_at_the_boundary() {
        let request: AdvanceRequest = serde_json::from_str(
            r#"{"stage": "prediction", "entries": {"1": {"prediction": 40, "band": "medium"}}}"#,
        )
        .expect("parse");
        let err = request.into_action().expect_err("unknown band");
        assert!(matches!(err, SurveyError::UnknownBand(_)));
    }

    #[test]
    fn out_of_range_answer_rejected() {
        let request: AdvanceRequest =
            serde_json::from_str(r#"{"stage": "self_report", "answers": {"1": 101}}"#)
                .expect("parse");
        assert!(matches!(
            request.into_action(),
            Err(SurveyError::OutOfRange { .. })
        ));
    }

    #[test]
    fn prediction_entry_converts_to_core_types() {
        let request: AdvanceRequest = serde_json::from_str(
            r#"{"stage": "prediction", "entries": {"7": {"prediction": 48, "band": "wide"}}}"#,
        )
        .expect("parse");
        match request.into_action().expect("convert") {
            AdvanceAction::Prediction(entries) => {
                let input = entries.get(&QuestionId(7)).expect("entry");
                assert_eq!(input.prediction.value(), 48);
                assert_eq!(input.band, Band::Wide);
            }
            other => panic!("expected prediction action, got {other:?}"),
        }
    }
}
