//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the Centile survey engine:
//! - Question identifiers (`QuestionId`) and 0–100 scale values (`ScaleValue`)
//! - Closed enumerations for interval bands (`Band`) and data-sharing consent
//!   (`ConsentChoice`)
//! - The persisted per-question field kinds (`FieldKind`)
//! - Error types (`SurveyError`)
//!
//! ## Construction-Time Validation
//!
//! Bands, consent choices, and scale values reject invalid input when they
//! are built, never later. A `Band` in a record is always `narrow` or `wide`;
//! a `ScaleValue` is always within 0..=100.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::stage::Stage;

// =============================================================================
// QUESTION IDENTIFIER
// =============================================================================

/// Stable identifier for a question, 1..=N.
///
/// Identifiers never change when the presentation order is shuffled; the
/// persisted column layout is keyed by this id, not by screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub u16);

impl QuestionId {
    /// Get the raw id value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

// =============================================================================
// SCALE VALUE (0..=100)
// =============================================================================

/// A value on the 0–100 response scale.
///
/// Used for self-reports, predictions, and interval endpoints. The inner
/// value is guaranteed to be within range by construction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct ScaleValue(u8);

/// Upper bound of the response scale.
pub const SCALE_MAX: u8 = 100;

impl ScaleValue {
    /// Create a scale value, rejecting anything above 100.
    pub fn new(value: u8) -> Result<Self, SurveyError> {
        if value > SCALE_MAX {
            return Err(SurveyError::OutOfRange {
                what: "scale value",
                value: u32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Create a scale value, clamping anything above 100 down to 100.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > SCALE_MAX {
            Self(SCALE_MAX)
        } else {
            Self(value)
        }
    }

    /// Get the raw value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Subtract a radius, clamping at the bottom of the scale.
    #[must_use]
    pub const fn saturating_sub(self, radius: u8) -> Self {
        Self(self.0.saturating_sub(radius))
    }

    /// Add a radius, clamping at the top of the scale.
    #[must_use]
    pub const fn saturating_add(self, radius: u8) -> Self {
        let sum = self.0.saturating_add(radius);
        if sum > SCALE_MAX { Self(SCALE_MAX) } else { Self(sum) }
    }
}

impl TryFrom<u8> for ScaleValue {
    type Error = SurveyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScaleValue> for u8 {
    fn from(value: ScaleValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for ScaleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// BAND
// =============================================================================

/// The chosen interval half-width category.
///
/// Narrow trades a bigger reward for a smaller hit window; wide the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Small half-width, high reward.
    Narrow,
    /// Large half-width, low reward.
    Wide,
}

impl Band {
    /// Get the persisted cell value for this band.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Band::Narrow => "narrow",
            Band::Wide => "wide",
        }
    }

    /// All bands, in presentation order.
    pub const ALL: [Band; 2] = [Band::Narrow, Band::Wide];
}

impl FromStr for Band {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "narrow" => Ok(Band::Narrow),
            "wide" => Ok(Band::Wide),
            other => Err(SurveyError::UnknownBand(other.to_string())),
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONSENT CHOICE
// =============================================================================

/// The participant's data-sharing election on the consent screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentChoice {
    /// Responses are used for this study only.
    NoShare,
    /// Responses may be shared after de-identification.
    Deidentified,
    /// Responses may be shared in identifiable form.
    Identifiable,
}

impl ConsentChoice {
    /// Get the persisted cell value for this choice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ConsentChoice::NoShare => "no_share",
            ConsentChoice::Deidentified => "deidentified",
            ConsentChoice::Identifiable => "identifiable",
        }
    }

    /// All choices, in presentation order.
    pub const ALL: [ConsentChoice; 3] = [
        ConsentChoice::NoShare,
        ConsentChoice::Deidentified,
        ConsentChoice::Identifiable,
    ];
}

impl FromStr for ConsentChoice {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_share" => Ok(ConsentChoice::NoShare),
            "deidentified" => Ok(ConsentChoice::Deidentified),
            "identifiable" => Ok(ConsentChoice::Identifiable),
            other => Err(SurveyError::UnknownConsent(other.to_string())),
        }
    }
}

impl std::fmt::Display for ConsentChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PER-QUESTION FIELD KINDS
// =============================================================================

/// The five persisted fields each question contributes to a record.
///
/// The canonical column layout groups columns by field kind across all
/// questions (`q1_stage1..qN_stage1, q1_pred..qN_pred, ...`), so the order of
/// this enum's variants is the order of the column groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// Stage-1 self-report value.
    Stage1,
    /// Stage-2 prediction of the group median.
    Pred,
    /// Stage-2 band choice.
    Band,
    /// Derived interval lower endpoint.
    Low,
    /// Derived interval upper endpoint.
    High,
}

impl FieldKind {
    /// Column-name suffix for this field kind.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            FieldKind::Stage1 => "stage1",
            FieldKind::Pred => "pred",
            FieldKind::Band => "band",
            FieldKind::Low => "low",
            FieldKind::High => "high",
        }
    }

    /// All field kinds, in canonical column-group order.
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Stage1,
        FieldKind::Pred,
        FieldKind::Band,
        FieldKind::Low,
        FieldKind::High,
    ];
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Centile survey engine.
///
/// - Validation failures are recoverable: the refused transition leaves the
///   session untouched and the current screen is re-rendered.
/// - `IncompleteRecord` is a contract violation that stage validation should
///   make unreachable.
/// - Only `Persistence` crosses the stage boundary as a user-visible,
///   retryable failure.
#[derive(Debug, Error)]
pub enum SurveyError {
    /// A stage transition was refused; the session is unchanged.
    #[error("validation failed in {stage}: {reason}")]
    Validation {
        /// The stage whose advance operation refused.
        stage: Stage,
        /// Human-readable refusal reason, shown on re-render.
        reason: String,
    },

    /// `finalize()` was called with a per-question field missing.
    #[error("incomplete record: {question} is missing {field}")]
    IncompleteRecord {
        /// The question with missing data.
        question: QuestionId,
        /// The specific missing field.
        field: FieldKind,
    },

    /// The persistence sink failed; the record is preserved for retry.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The survey configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The question set is invalid (empty, gapped ids, blank prompts).
    #[error("invalid question set: {0}")]
    InvalidQuestionSet(String),

    /// A value fell outside the 0..=100 response scale.
    #[error("{what} {value} is out of range (0..=100)")]
    OutOfRange {
        /// What was being validated.
        what: &'static str,
        /// The offending value.
        value: u32,
    },

    /// An unrecognized band string was supplied.
    #[error("unknown band choice: {0:?} (expected \"narrow\" or \"wide\")")]
    UnknownBand(String),

    /// An unrecognized consent choice string was supplied.
    #[error("unknown consent choice: {0:?}")]
    UnknownConsent(String),

    /// An I/O error occurred in the local store.
    #[error("I/O error: {0}")]
    Io(String),
}

impl SurveyError {
    /// Whether the caller may retry the same operation unchanged.
    ///
    /// True only for persistence failures: the record is still in memory and
    /// the submit transition can be re-attempted without re-entering prior
    /// stages.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SurveyError::Persistence(_) | SurveyError::Io(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
