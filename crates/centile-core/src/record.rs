//! # Response Record
//!
//! The accumulating result of one participant session. Fields land
//! incrementally as the session advances; `finalize()` produces the immutable
//! snapshot that is handed to the persistence sink.
//!
//! Per-question data is keyed by `QuestionId` in `BTreeMap`s so iteration is
//! always in canonical id order, independent of the session's presentation
//! order.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::config::SurveyConfig;
use crate::interval;
use crate::question::QuestionSet;
use crate::types::{Band, ConsentChoice, FieldKind, QuestionId, ScaleValue, SurveyError};

// =============================================================================
// RESPONSE RECORD (builder)
// =============================================================================

/// Accumulating key/value state for one participant.
///
/// Mutated field-by-field as the participant advances; becomes immutable via
/// [`ResponseRecord::finalize`] at the final submit transition.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    participant_id: Uuid,
    timestamp: DateTime<Utc>,
    wechat_id: Option<String>,
    consent_confirmed: Option<bool>,
    consent_share: Option<ConsentChoice>,
    self_reports: BTreeMap<QuestionId, ScaleValue>,
    predictions: BTreeMap<QuestionId, ScaleValue>,
    bands: BTreeMap<QuestionId, Band>,
    intervals: BTreeMap<QuestionId, (ScaleValue, ScaleValue)>,
}

impl ResponseRecord {
    /// Create an empty record for one participant.
    #[must_use]
    pub fn new(participant_id: Uuid, timestamp: DateTime<Utc>) -> Self {
        Self {
            participant_id,
            timestamp,
            wechat_id: None,
            consent_confirmed: None,
            consent_share: None,
            self_reports: BTreeMap::new(),
            predictions: BTreeMap::new(),
            bands: BTreeMap::new(),
            intervals: BTreeMap::new(),
        }
    }

    /// Record the consent confirmation and data-sharing choice.
    pub fn record_consent(&mut self, confirmed: bool, share: ConsentChoice) {
        self.consent_confirmed = Some(confirmed);
        self.consent_share = Some(share);
    }

    /// Record the payment identifier. Blank means cash payment.
    pub fn record_wechat_id(&mut self, wechat_id: &str) {
        self.wechat_id = Some(wechat_id.trim().to_string());
    }

    /// Record a stage-1 self-report value.
    ///
    /// Values equal to the random slider default are accepted; there is no
    /// requirement that the participant moved the control.
    pub fn record_self_report(&mut self, question: QuestionId, value: ScaleValue) {
        self.self_reports.insert(question, value);
    }

    /// Record a stage-2 prediction.
    ///
    /// If a band is already stored for the question, the interval is
    /// recomputed; otherwise derivation waits for the band choice.
    pub fn record_prediction(
        &mut self,
        question: QuestionId,
        value: ScaleValue,
        config: &SurveyConfig,
    ) {
        self.predictions.insert(question, value);
        if let Some(&band) = self.bands.get(&question) {
            self.intervals
                .insert(question, interval::interval(value, band, config));
        }
    }

    /// Record a band choice and derive the interval from the latest stored
    /// prediction, if one exists.
    pub fn record_band(&mut self, question: QuestionId, band: Band, config: &SurveyConfig) {
        self.bands.insert(question, band);
        if let Some(&pred) = self.predictions.get(&question) {
            self.intervals
                .insert(question, interval::interval(pred, band, config));
        }
    }

    /// The stage-1 answer for a question, if recorded.
    #[must_use]
    pub fn self_report(&self, question: QuestionId) -> Option<ScaleValue> {
        self.self_reports.get(&question).copied()
    }

    /// Number of stage-1 answers recorded so far.
    #[must_use]
    pub fn self_report_count(&self) -> usize {
        self.self_reports.len()
    }

    /// The recorded payment identifier, if any.
    #[must_use]
    pub fn wechat_id(&self) -> Option<&str> {
        self.wechat_id.as_deref()
    }

    /// Produce the immutable snapshot for persistence.
    ///
    /// Fails with [`SurveyError::IncompleteRecord`] naming the first question
    /// (in canonical order) that is missing any of its five fields. Stage
    /// validation makes this unreachable in a well-behaved session; a failure
    /// here is a programming-contract violation, not user error.
    pub fn finalize(&self, questions: &QuestionSet) -> Result<FinalRecord, SurveyError> {
        for id in questions.ids() {
            let checks = [
                (FieldKind::Stage1, self.self_reports.contains_key(&id)),
                (FieldKind::Pred, self.predictions.contains_key(&id)),
                (FieldKind::Band, self.bands.contains_key(&id)),
                (FieldKind::Low, self.intervals.contains_key(&id)),
            ];
            for (field, present) in checks {
                if !present {
                    return Err(SurveyError::IncompleteRecord {
                        question: id,
                        field,
                    });
                }
            }
        }

        Ok(FinalRecord {
            participant_id: self.participant_id,
            timestamp: self.timestamp,
            wechat_id: self.wechat_id.clone().unwrap_or_default(),
            consent_confirmed: self.consent_confirmed,
            consent_share: self.consent_share,
            self_reports: self.self_reports.clone(),
            predictions: self.predictions.clone(),
            bands: self.bands.clone(),
            intervals: self.intervals.clone(),
        })
    }
}

// =============================================================================
// FINAL RECORD (immutable snapshot)
// =============================================================================

/// The completed, immutable response of one participant.
///
/// Every question in the active set has all five per-question fields.
/// Produced only by [`ResponseRecord::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalRecord {
    /// Session identity.
    pub participant_id: Uuid,
    /// Session creation time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Payment identifier; empty string means cash payment.
    pub wechat_id: String,
    /// Consent confirmation, when consent was collected.
    pub consent_confirmed: Option<bool>,
    /// Data-sharing election, when consent was collected.
    pub consent_share: Option<ConsentChoice>,
    /// Stage-1 answers by canonical id.
    pub self_reports: BTreeMap<QuestionId, ScaleValue>,
    /// Stage-2 predictions by canonical id.
    pub predictions: BTreeMap<QuestionId, ScaleValue>,
    /// Band choices by canonical id.
    pub bands: BTreeMap<QuestionId, Band>,
    /// Derived intervals by canonical id.
    pub intervals: BTreeMap<QuestionId, (ScaleValue, ScaleValue)>,
}

// =============================================================================
// TESTS
// =============================================================================
