//! # Participant Session
//!
//! One session per participant: identity, the presentation order (computed
//! exactly once at creation), per-question slider defaults for both stages,
//! the one-shot scroll latch, the current stage, and the accumulating
//! response record.
//!
//! ## Transition Contract
//!
//! Each stage has exactly one advance operation. An advance validates its
//! input fully before touching the record; a refused transition leaves both
//! the stage and the record exactly as they were. Only the final submit
//! performs I/O, and only a successful sink write finalizes the transition
//! to `Done` — on a sink error the session stays in `Prediction` with the
//! record intact, so the same submit can be retried without re-entering
//! prior stages.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::SurveyConfig;
use crate::question::QuestionSet;
use crate::record::ResponseRecord;
use crate::screen::{BandOption, ScreenSpec, SliderField};
use crate::stage::Stage;
use crate::storage::RecordSink;
use crate::types::{Band, ConsentChoice, QuestionId, SCALE_MAX, ScaleValue, SurveyError};
use crate::{interval, schema};

// =============================================================================
// ADVANCE INPUTS
// =============================================================================

/// Raw consent-screen input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentInput {
    /// The "I have read and agree" checkbox.
    pub confirmed: bool,
    /// The data-sharing election; `None` when nothing was selected.
    pub share_choice: Option<ConsentChoice>,
}

/// Raw per-question prediction-screen input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Predicted group median.
    pub prediction: ScaleValue,
    /// Committed band.
    pub band: Band,
}

// =============================================================================
// SURVEY SESSION
// =============================================================================

/// The state of one participant's walk through the survey.
#[derive(Debug, Clone)]
pub struct SurveySession {
    participant_id: Uuid,
    created_at: DateTime<Utc>,
    stage: Stage,
    config: SurveyConfig,
    presentation_order: Vec<QuestionId>,
    self_defaults: BTreeMap<QuestionId, ScaleValue>,
    prediction_defaults: BTreeMap<QuestionId, ScaleValue>,
    scroll_fired: bool,
    record: ResponseRecord,
}

impl SurveySession {
    /// Create a session with OS entropy for the shuffle and slider defaults.
    #[must_use]
    pub fn new(questions: &QuestionSet, config: &SurveyConfig) -> Self {
        Self::with_rng(questions, config, &mut StdRng::from_os_rng())
    }

    /// Create a session with a caller-supplied random source.
    pub fn with_rng<R: Rng + ?Sized>(
        questions: &QuestionSet,
        config: &SurveyConfig,
        rng: &mut R,
    ) -> Self {
        let participant_id = Uuid::new_v4();
        let created_at = Utc::now();
        let presentation_order = questions.presentation_order(config.randomize_order, rng);

        let mut self_defaults = BTreeMap::new();
        let mut prediction_defaults = BTreeMap::new();
        for id in questions.ids() {
            self_defaults.insert(id, ScaleValue::clamped(rng.random_range(0..=SCALE_MAX)));
            prediction_defaults.insert(id, ScaleValue::clamped(rng.random_range(0..=SCALE_MAX)));
        }

        Self {
            participant_id,
            created_at,
            stage: Stage::initial(config.require_consent),
            config: config.clone(),
            presentation_order,
            self_defaults,
            prediction_defaults,
            scroll_fired: false,
            record: ResponseRecord::new(participant_id, created_at),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Session identity.
    #[must_use]
    pub fn participant_id(&self) -> Uuid {
        self.participant_id
    }

    /// Session creation time (UTC).
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The active stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The session's fixed presentation order.
    #[must_use]
    pub fn presentation_order(&self) -> &[QuestionId] {
        &self.presentation_order
    }

    /// The accumulating record.
    #[must_use]
    pub fn record(&self) -> &ResponseRecord {
        &self.record
    }

    /// Whether the session has reached the terminal stage.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stage.is_terminal()
    }

    // =========================================================================
    // SCROLL LATCH
    // =========================================================================

    /// Consume the one-shot scroll-to-top signal.
    ///
    /// Returns `true` exactly once per session: on the first inspection after
    /// entering `Prediction`. Re-renders, input changes, and repeated calls
    /// all observe `false` afterwards; the latch is never reset.
    pub fn take_scroll_signal(&mut self) -> bool {
        if self.stage == Stage::Prediction && !self.scroll_fired {
            self.scroll_fired = true;
            return true;
        }
        false
    }

    // =========================================================================
    // SCREEN RENDERING
    // =========================================================================

    /// Describe the current screen for the presenter.
    ///
    /// Idempotent except for the prediction screen's one-shot scroll signal,
    /// which is consumed by the first render.
    pub fn screen(&mut self, questions: &QuestionSet) -> ScreenSpec {
        match self.stage {
            Stage::Consent => ScreenSpec::Consent {
                share_choices: ConsentChoice::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            },
            Stage::Instructions => ScreenSpec::Instructions {
                require_wechat_id: self.config.require_wechat_id,
                base_fee: self.config.base_fee,
            },
            Stage::SelfReport => ScreenSpec::SelfReport {
                items: self.slider_items(questions, &self.self_defaults),
            },
            Stage::Prediction => {
                let items = self.slider_items(questions, &self.prediction_defaults);
                ScreenSpec::Prediction {
                    scroll_to_top: self.take_scroll_signal(),
                    band_options: Band::ALL
                        .iter()
                        .map(|&band| BandOption::for_band(band, &self.config))
                        .collect(),
                    items,
                }
            }
            Stage::Done => ScreenSpec::Done {
                base_fee: self.config.base_fee,
            },
        }
    }

    fn slider_items(
        &self,
        questions: &QuestionSet,
        defaults: &BTreeMap<QuestionId, ScaleValue>,
    ) -> Vec<SliderField> {
        self.presentation_order
            .iter()
            .filter_map(|&id| {
                let question = questions.get(id)?;
                Some(SliderField {
                    question: id,
                    prompt: question.prompt.clone(),
                    min: 0,
                    max: SCALE_MAX,
                    default: defaults.get(&id).copied().unwrap_or_default().value(),
                })
            })
            .collect()
    }

    // =========================================================================
    // STAGE TRANSITIONS
    // =========================================================================

    /// `Consent → Instructions`.
    ///
    /// Requires the confirmation flag and a non-empty sharing choice. A
    /// refused transition records nothing.
    pub fn advance_consent(&mut self, input: &ConsentInput) -> Result<Stage, SurveyError> {
        self.expect_stage(Stage::Consent)?;
        if !input.confirmed {
            return Err(self.refuse("the consent confirmation is required"));
        }
        let Some(share) = input.share_choice else {
            return Err(self.refuse("a data-sharing choice is required"));
        };

        self.record.record_consent(true, share);
        self.stage = Stage::Instructions;
        Ok(self.stage)
    }

    /// `Instructions → SelfReport`.
    ///
    /// The payment identifier is required only under `require_wechat_id`;
    /// otherwise a blank identifier means cash payment.
    pub fn advance_instructions(&mut self, wechat_id: &str) -> Result<Stage, SurveyError> {
        self.expect_stage(Stage::Instructions)?;
        if self.config.require_wechat_id && wechat_id.trim().is_empty() {
            return Err(self.refuse("a payment identifier is required"));
        }

        self.record.record_wechat_id(wechat_id);
        self.stage = Stage::SelfReport;
        Ok(self.stage)
    }

    /// `SelfReport → Prediction`.
    ///
    /// Requires one answer for every question in the session's order. Values
    /// left at the random slider default are accepted. A refused transition
    /// records nothing.
    pub fn advance_self_report(
        &mut self,
        answers: &BTreeMap<QuestionId, ScaleValue>,
    ) -> Result<Stage, SurveyError> {
        self.expect_stage(Stage::SelfReport)?;
        self.check_coverage(answers.keys().copied(), "answer")?;

        for (&id, &value) in answers {
            self.record.record_self_report(id, value);
        }
        self.stage = Stage::Prediction;
        Ok(self.stage)
    }

    /// `Prediction → Done`.
    ///
    /// Requires a prediction and a band for every question; derives the
    /// intervals; hands the finalized record to the sink. Only a successful
    /// sink write finalizes the transition — on failure the session stays in
    /// `Prediction` and the record is preserved so the same submit can be
    /// retried. Resubmission after a reported failure is not deduplicated.
    pub fn submit(
        &mut self,
        predictions: &BTreeMap<QuestionId, PredictionInput>,
        questions: &QuestionSet,
        sink: &mut dyn RecordSink,
    ) -> Result<Stage, SurveyError> {
        self.expect_stage(Stage::Prediction)?;
        self.check_coverage(predictions.keys().copied(), "prediction")?;

        for (&id, input) in predictions {
            self.record
                .record_prediction(id, input.prediction, &self.config);
            self.record.record_band(id, input.band, &self.config);
        }

        let snapshot = self.record.finalize(questions)?;
        let header = schema::canonical_header(questions, self.config.require_consent);
        let row = schema::render_row(&snapshot, questions, self.config.require_consent);
        sink.append(&header, &row)?;

        self.stage = Stage::Done;
        Ok(self.stage)
    }

    // =========================================================================
    // VALIDATION HELPERS
    // =========================================================================

    fn expect_stage(&self, expected: Stage) -> Result<(), SurveyError> {
        if self.stage == expected {
            return Ok(());
        }
        Err(SurveyError::Validation {
            stage: self.stage,
            reason: format!(
                "the {} screen is not active (currently on {})",
                expected, self.stage
            ),
        })
    }

    /// Check that `provided` covers the session's question order exactly.
    fn check_coverage(
        &self,
        provided: impl Iterator<Item = QuestionId>,
        what: &str,
    ) -> Result<(), SurveyError> {
        let provided: std::collections::BTreeSet<QuestionId> = provided.collect();
        for &id in &self.presentation_order {
            if !provided.contains(&id) {
                return Err(self.refuse(&format!("{id} is missing a {what}")));
            }
        }
        for id in &provided {
            if !self.presentation_order.contains(id) {
                return Err(self.refuse(&format!("{id} is not part of this survey")));
            }
        }
        Ok(())
    }

    fn refuse(&self, reason: &str) -> SurveyError {
        SurveyError::Validation {
            stage: self.stage,
            reason: reason.to_string(),
        }
    }

    // =========================================================================
    // INCENTIVE PREVIEW
    // =========================================================================

    /// Bonus preview in currency tenths for a band, under this session's
    /// configuration.
    #[must_use]
    pub fn band_payout_tenths(&self, band: Band) -> u32 {
        interval::band_payout_tenths(band, &self.config)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::MemorySink;
    use rand::SeedableRng;

    fn questions() -> QuestionSet {
        QuestionSet::from_prompts(vec!["Likely", "About even", "Unlikely"]).expect("valid set")
    }

    fn config() -> SurveyConfig {
        SurveyConfig {
            randomize_order: false,
            ..SurveyConfig::default()
        }
    }

    fn scale(v: u8) -> ScaleValue {
        ScaleValue::new(v).expect("test value in range")
    }

    fn session() -> SurveySession {
        let mut rng = StdRng::seed_from_u64(3);
        SurveySession::with_rng(&questions(), &config(), &mut rng)
    }

    fn answers(values: &[u8]) -> BTreeMap<QuestionId, ScaleValue> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (QuestionId((i + 1) as u16), scale(v)))
            .collect()
    }

    #[test]
    fn session_starts_at_instructions_without_consent() {
        assert_eq!(session().stage(), Stage::Instructions);
    }

    #[test]
    fn session_starts_at_consent_when_required() {
        let config = SurveyConfig {
            require_consent: true,
            randomize_order: false,
            ..SurveyConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let session = SurveySession::with_rng(&questions(), &config, &mut rng);
        assert_eq!(session.stage(), Stage::Consent);
    }

    #[test]
    fn consent_requires_confirmation_and_choice() {
        let config = SurveyConfig {
            require_consent: true,
            randomize_order: false,
            ..SurveyConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = SurveySession::with_rng(&questions(), &config, &mut rng);

        let unconfirmed = ConsentInput {
            confirmed: false,
            share_choice: Some(ConsentChoice::NoShare),
        };
        assert!(session.advance_consent(&unconfirmed).is_err());
        assert_eq!(session.stage(), Stage::Consent);

        let no_choice = ConsentInput {
            confirmed: true,
            share_choice: None,
        };
        assert!(session.advance_consent(&no_choice).is_err());
        assert_eq!(session.stage(), Stage::Consent);

        let complete = ConsentInput {
            confirmed: true,
            share_choice: Some(ConsentChoice::Deidentified),
        };
        assert_eq!(
            session.advance_consent(&complete).expect("advance"),
            Stage::Instructions
        );
    }

    #[test]
    fn wechat_id_optional_by_default() {
        let mut session = session();
        assert_eq!(
            session.advance_instructions("").expect("advance"),
            Stage::SelfReport
        );
        assert_eq!(session.record().wechat_id(), Some(""));
    }

    #[test]
    fn wechat_id_required_by_policy() {
        let config = SurveyConfig {
            require_wechat_id: true,
            randomize_order: false,
            ..SurveyConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = SurveySession::with_rng(&questions(), &config, &mut rng);

        assert!(session.advance_instructions("  ").is_err());
        assert_eq!(session.stage(), Stage::Instructions);
        assert!(session.advance_instructions("wx-9").is_ok());
    }

    #[test]
    fn self_report_requires_every_answer() {
        let mut session = session();
        session.advance_instructions("").expect("instructions");

        let mut partial = answers(&[10, 50, 90]);
        partial.remove(&QuestionId(2));
        assert!(session.advance_self_report(&partial).is_err());
        assert_eq!(session.stage(), Stage::SelfReport);
        // Refused transition recorded nothing.
        assert_eq!(session.record().self_report_count(), 0);

        assert_eq!(
            session
                .advance_self_report(&answers(&[10, 50, 90]))
                .expect("advance"),
            Stage::Prediction
        );
    }

    #[test]
    fn unknown_question_id_refused() {
        let mut session = session();
        session.advance_instructions("").expect("instructions");

        let mut extra = answers(&[10, 50, 90]);
        extra.insert(QuestionId(9), scale(1));
        assert!(session.advance_self_report(&extra).is_err());
        assert_eq!(session.stage(), Stage::SelfReport);
    }

    #[test]
    fn scroll_signal_fires_exactly_once() {
        let mut session = session();
        session.advance_instructions("").expect("instructions");

        // Not yet in Prediction: no signal.
        assert!(!session.take_scroll_signal());

        session
            .advance_self_report(&answers(&[10, 50, 90]))
            .expect("self report");

        let fired: Vec<bool> = (0..5).map(|_| session.take_scroll_signal()).collect();
        assert_eq!(fired, vec![true, false, false, false, false]);
    }

    #[test]
    fn screen_render_consumes_scroll_signal_once() {
        let set = questions();
        let mut session = session();
        session.advance_instructions("").expect("instructions");
        session
            .advance_self_report(&answers(&[10, 50, 90]))
            .expect("self report");

        let first = session.screen(&set);
        let second = session.screen(&set);
        match (first, second) {
            (
                ScreenSpec::Prediction {
                    scroll_to_top: a, ..
                },
                ScreenSpec::Prediction {
                    scroll_to_top: b, ..
                },
            ) => {
                assert!(a);
                assert!(!b);
            }
            other => panic!("expected prediction screens, got {other:?}"),
        }
    }

    #[test]
    fn submit_requires_prediction_screen() {
        let mut session = session();
        let mut sink = MemorySink::new();
        let result = session.submit(&BTreeMap::new(), &questions(), &mut sink);
        assert!(result.is_err());
        assert_eq!(sink.row_count(), 0);
    }

    #[test]
    fn sink_failure_keeps_session_in_prediction() {
        let set = questions();
        let mut session = session();
        session.advance_instructions("").expect("instructions");
        session
            .advance_self_report(&answers(&[10, 50, 90]))
            .expect("self report");

        let predictions: BTreeMap<QuestionId, PredictionInput> = set
            .ids()
            .map(|id| {
                (
                    id,
                    PredictionInput {
                        prediction: scale(50),
                        band: Band::Narrow,
                    },
                )
            })
            .collect();

        let mut sink = MemorySink::new();
        sink.fail_next = true;
        let err = session
            .submit(&predictions, &set, &mut sink)
            .expect_err("sink failure");
        assert!(err.is_retryable());
        assert_eq!(session.stage(), Stage::Prediction);

        // The same submit succeeds once the sink recovers.
        sink.fail_next = false;
        assert_eq!(
            session.submit(&predictions, &set, &mut sink).expect("retry"),
            Stage::Done
        );
        assert_eq!(sink.row_count(), 1);
    }

    #[test]
    fn done_is_terminal_and_idempotent_to_render() {
        let set = questions();
        let mut session = session();
        session.advance_instructions("").expect("instructions");
        session
            .advance_self_report(&answers(&[10, 50, 90]))
            .expect("self report");

        let predictions: BTreeMap<QuestionId, PredictionInput> = set
            .ids()
            .map(|id| {
                (
                    id,
                    PredictionInput {
                        prediction: scale(40),
                        band: Band::Wide,
                    },
                )
            })
            .collect();
        let mut sink = MemorySink::new();
        session.submit(&predictions, &set, &mut sink).expect("submit");
        assert!(session.is_complete());

        // Re-render is idempotent; further advances refuse.
        assert_eq!(session.screen(&set), session.screen(&set));
        assert!(session.advance_instructions("x").is_err());
        assert!(session.submit(&predictions, &set, &mut sink).is_err());
        assert_eq!(sink.row_count(), 1);
    }
}
