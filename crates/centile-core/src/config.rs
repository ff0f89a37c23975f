//! # Survey Configuration
//!
//! Policy knobs for one deployment of the instrument. All monetary amounts
//! are integers; the points-to-currency conversion rate is expressed in
//! tenths of a currency unit per point so the engine never touches floating
//! point (20 points × 7 tenths = 14 currency units exactly).

use serde::{Deserialize, Serialize};

use crate::types::{SCALE_MAX, SurveyError};

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default narrow-band half-width.
pub const DEFAULT_NARROW_RADIUS: u8 = 3;

/// Default wide-band half-width.
pub const DEFAULT_WIDE_RADIUS: u8 = 6;

/// Default points awarded for a narrow-band hit.
pub const DEFAULT_NARROW_POINTS: u32 = 20;

/// Default points awarded for a wide-band hit.
pub const DEFAULT_WIDE_POINTS: u32 = 10;

/// Default conversion rate: tenths of a currency unit per point (0.7/point).
pub const DEFAULT_CURRENCY_TENTHS: u32 = 7;

/// Default show-up fee in whole currency units.
pub const DEFAULT_BASE_FEE: u32 = 10;

// =============================================================================
// SURVEY CONFIG
// =============================================================================

/// Policy configuration for one survey deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurveyConfig {
    /// Shuffle the presentation order once per session.
    pub randomize_order: bool,
    /// Narrow-band half-width on the 0–100 scale.
    pub narrow_radius: u8,
    /// Wide-band half-width on the 0–100 scale.
    pub wide_radius: u8,
    /// Points for a correct narrow-band prediction.
    pub narrow_points: u32,
    /// Points for a correct wide-band prediction.
    pub wide_points: u32,
    /// Conversion rate in tenths of a currency unit per point.
    pub points_to_currency_tenths: u32,
    /// Show-up fee in whole currency units.
    pub base_fee: u32,
    /// Refuse the instructions transition without a payment identifier.
    /// When false, a blank identifier means cash payment.
    pub require_wechat_id: bool,
    /// Collect consent as a leading stage.
    pub require_consent: bool,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            randomize_order: true,
            narrow_radius: DEFAULT_NARROW_RADIUS,
            wide_radius: DEFAULT_WIDE_RADIUS,
            narrow_points: DEFAULT_NARROW_POINTS,
            wide_points: DEFAULT_WIDE_POINTS,
            points_to_currency_tenths: DEFAULT_CURRENCY_TENTHS,
            base_fee: DEFAULT_BASE_FEE,
            require_wechat_id: false,
            require_consent: false,
        }
    }
}

impl SurveyConfig {
    /// Validate the configuration.
    ///
    /// Radii must be non-zero and fit on the scale; point awards must be
    /// non-zero so the incentive text is never vacuous.
    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.narrow_radius == 0 || self.wide_radius == 0 {
            return Err(SurveyError::InvalidConfig(
                "band radii must be non-zero".to_string(),
            ));
        }
        if self.narrow_radius > SCALE_MAX || self.wide_radius > SCALE_MAX {
            return Err(SurveyError::InvalidConfig(format!(
                "band radii must be at most {SCALE_MAX}"
            )));
        }
        if self.narrow_points == 0 || self.wide_points == 0 {
            return Err(SurveyError::InvalidConfig(
                "band point awards must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SurveyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.narrow_radius, 3);
        assert_eq!(config.wide_radius, 6);
        assert_eq!(config.points_to_currency_tenths, 7);
    }

    #[test]
    fn zero_radius_rejected() {
        let config = SurveyConfig {
            narrow_radius: 0,
            ..SurveyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SurveyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn oversized_radius_rejected() {
        let config = SurveyConfig {
            wide_radius: 101,
            ..SurveyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        let parsed: Result<SurveyConfig, _> =
            serde_json::from_str(r#"{"randomize_order": false, "points_to_rmb": 0.7}"#);
        assert!(parsed.is_err());
    }
}
