//! # Application Configuration
//!
//! TOML file configuration for one deployment (`centile.toml` by default):
//!
//! ```toml
//! questions = ["Almost certain", "..."]  # optional; built-in set otherwise
//!
//! [survey]
//! randomize_order = true
//! require_wechat_id = false
//!
//! [store]
//! backend = "local"            # "local" | "sheet" — always explicit
//! path = "centile_results.csv"
//!
//! [sheet]                      # required when backend = "sheet"
//! endpoint = "https://sheets.example.com"
//! document = "study-2026"
//! worksheet = "responses"
//! token = "..."
//! ```
//!
//! The persistence backend is chosen by the `store.backend` field, never by
//! probing which credentials happen to be present.

use centile_core::{QuestionSet, SurveyConfig, SurveyError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "centile.toml";

/// Default local store path.
pub const DEFAULT_STORE_PATH: &str = "centile_results.csv";

// =============================================================================
// STORE SELECTION
// =============================================================================

/// Which persistence sink to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local append-only CSV file.
    Local,
    /// Remote spreadsheet gateway.
    Sheet,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Sheet => f.write_str("sheet"),
        }
    }
}

/// Store selection and location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// The selected sink.
    pub backend: BackendKind,
    /// Path of the local CSV file (local backend).
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

/// Remote spreadsheet-gateway connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetConfig {
    /// Base URL of the gateway.
    pub endpoint: String,
    /// Target document name.
    pub document: String,
    /// Target worksheet name.
    pub worksheet: String,
    /// Bearer token, if the gateway requires one.
    #[serde(default)]
    pub token: Option<String>,
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// The full application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Survey policy knobs.
    pub survey: SurveyConfig,
    /// Prompt list; empty means the built-in fifteen-prompt set.
    pub questions: Vec<String>,
    /// Sink selection.
    pub store: StoreConfig,
    /// Gateway settings, required when `store.backend = "sheet"`.
    pub sheet: Option<SheetConfig>,
}

impl AppConfig {
    /// Load configuration from an explicit path, or from `centile.toml` in
    /// the working directory when present, or defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, SurveyError> {
        let contents = match path {
            Some(p) => std::fs::read_to_string(p).map_err(|e| {
                SurveyError::InvalidConfig(format!("cannot read {}: {e}", p.display()))
            })?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                std::fs::read_to_string(default).map_err(|e| {
                    SurveyError::InvalidConfig(format!("cannot read {DEFAULT_CONFIG_PATH}: {e}"))
                })?
            }
        };
        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| SurveyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), SurveyError> {
        self.survey.validate()?;
        if self.store.backend == BackendKind::Sheet && self.sheet.is_none() {
            return Err(SurveyError::InvalidConfig(
                "store.backend = \"sheet\" requires a [sheet] section".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the active question set.
    pub fn question_set(&self) -> Result<QuestionSet, SurveyError> {
        if self.questions.is_empty() {
            Ok(QuestionSet::builtin())
        } else {
            QuestionSet::from_prompts(self.questions.clone())
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_local_backend_and_builtin_questions() {
        let config = AppConfig::default();
        assert_eq!(config.store.backend, BackendKind::Local);
        assert!(config.validate().is_ok());
        assert_eq!(config.question_set().expect("set").len(), 15);
    }

    #[test]
    fn sheet_backend_requires_sheet_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            backend = "sheet"
            "#,
        )
        .expect("parse");
        assert!(matches!(
            config.validate(),
            Err(SurveyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn full_sheet_config_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            questions = ["Likely", "Unlikely"]

            [survey]
            randomize_order = false
            require_wechat_id = true

            [store]
            backend = "sheet"

            [sheet]
            endpoint = "https://sheets.example.com"
            document = "study-2026"
            worksheet = "responses"
            token = "secret"
            "#,
        )
        .expect("parse");
        assert!(config.validate().is_ok());
        assert_eq!(config.question_set().expect("set").len(), 2);
        assert!(config.survey.require_wechat_id);
        let sheet = config.sheet.expect("sheet section");
        assert_eq!(sheet.worksheet, "responses");
    }

    #[test]
    fn unknown_store_backend_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
            [store]
            backend = "ftp"
            "#,
        );
        assert!(result.is_err());
    }
}
