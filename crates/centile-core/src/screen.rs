//! # Screen Descriptions
//!
//! The Screen Presenter boundary: for each stage the core exposes the set of
//! fields to render, with types, valid ranges, and per-session slider
//! defaults. The presenter renders these and feeds raw values back through
//! the session's advance operations; it holds no survey logic of its own.

use serde::{Deserialize, Serialize};

use crate::config::SurveyConfig;
use crate::interval::{band_payout_tenths, band_radius, format_currency_tenths};
use crate::types::{Band, QuestionId};

// =============================================================================
// FIELD DESCRIPTIONS
// =============================================================================

/// One 0–100 slider to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderField {
    /// The question this slider answers.
    pub question: QuestionId,
    /// Prompt text shown beside the control.
    pub prompt: String,
    /// Lower bound of the control.
    pub min: u8,
    /// Upper bound of the control.
    pub max: u8,
    /// Session-scoped random starting position.
    pub default: u8,
}

/// One band radio option with its incentive preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandOption {
    /// The band this option commits to.
    pub band: Band,
    /// Half-width of the committed interval.
    pub radius: u8,
    /// Points awarded on a hit.
    pub points: u32,
    /// Formatted currency bonus on a hit (e.g. "14").
    pub payout: String,
}

impl BandOption {
    /// Build the option row for a band under the given configuration.
    #[must_use]
    pub fn for_band(band: Band, config: &SurveyConfig) -> Self {
        Self {
            band,
            radius: band_radius(band, config),
            points: crate::interval::band_points(band, config),
            payout: format_currency_tenths(band_payout_tenths(band, config)),
        }
    }
}

// =============================================================================
// SCREEN SPEC
// =============================================================================

/// What the presenter should render for the session's current stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ScreenSpec {
    /// Consent form: confirmation checkbox plus a data-sharing choice.
    Consent {
        /// Allowed values for the sharing election.
        share_choices: Vec<String>,
    },
    /// Welcome text and payment-identifier entry.
    Instructions {
        /// Whether a blank identifier refuses the transition.
        require_wechat_id: bool,
        /// Show-up fee in whole currency units.
        base_fee: u32,
    },
    /// Stage 1: one slider per question, in presentation order.
    SelfReport {
        /// Sliders in presentation order.
        items: Vec<SliderField>,
    },
    /// Stage 2: prediction slider plus band choice per question.
    Prediction {
        /// One-shot signal: scroll the page to the top. True exactly once
        /// per session, on the first render after entering this stage.
        scroll_to_top: bool,
        /// The two band options with incentive previews.
        band_options: Vec<BandOption>,
        /// Prediction sliders in presentation order.
        items: Vec<SliderField>,
    },
    /// Terminal thanks screen.
    Done {
        /// Show-up fee in whole currency units, echoed in the thanks text.
        base_fee: u32,
    },
}

// =============================================================================
// TESTS
// =============================================================================
