//! # Band Intervals and Payouts
//!
//! The deterministic mapping from a prediction and a band choice to the
//! committed interval, plus the incentive arithmetic shown to participants.
//! Pure functions, integer arithmetic only.

use crate::config::SurveyConfig;
use crate::types::{Band, ScaleValue};

// =============================================================================
// INTERVAL COMPUTATION
// =============================================================================

/// Compute the committed interval for a prediction and band choice.
///
/// `interval(pred, band) = (clamp(pred - half), clamp(pred + half))` where
/// `half` is the configured radius of the chosen band. Both endpoints are
/// clamped to the 0–100 scale, so the interval narrows at the boundaries
/// (`pred = 0, wide → (0, 6)`).
#[must_use]
pub fn interval(pred: ScaleValue, band: Band, config: &SurveyConfig) -> (ScaleValue, ScaleValue) {
    let half = band_radius(band, config);
    (pred.saturating_sub(half), pred.saturating_add(half))
}

/// The half-width of a band under the given configuration.
#[must_use]
pub fn band_radius(band: Band, config: &SurveyConfig) -> u8 {
    match band {
        Band::Narrow => config.narrow_radius,
        Band::Wide => config.wide_radius,
    }
}

// =============================================================================
// INCENTIVE ARITHMETIC
// =============================================================================

/// Points awarded for a correct prediction with the given band.
#[must_use]
pub fn band_points(band: Band, config: &SurveyConfig) -> u32 {
    match band {
        Band::Narrow => config.narrow_points,
        Band::Wide => config.wide_points,
    }
}

/// Bonus for a correct prediction, in tenths of a currency unit.
#[must_use]
pub fn band_payout_tenths(band: Band, config: &SurveyConfig) -> u32 {
    band_points(band, config).saturating_mul(config.points_to_currency_tenths)
}

/// Render an amount of currency tenths as a display string ("14" or "7.5").
#[must_use]
pub fn format_currency_tenths(tenths: u32) -> String {
    let whole = tenths / 10;
    let fraction = tenths % 10;
    if fraction == 0 {
        format!("{whole}")
    } else {
        format!("{whole}.{fraction}")
    }
}

// =============================================================================
// TESTS
// =============================================================================
