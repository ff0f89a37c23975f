//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use centile_core::{CsvStore, QuestionSet, SurveyError, canonical_header, reconcile, HeaderAction};

use crate::api::{self, AppState};
use crate::config::{AppConfig, BackendKind};
use crate::sink::StoreBackend;

use super::Cli;

// =============================================================================
// COMMAND CONTEXT
// =============================================================================

/// Resolved configuration shared by all commands.
pub struct CommandContext {
    /// The loaded application configuration, with CLI overrides applied.
    pub config: AppConfig,
    /// The active question set.
    pub questions: QuestionSet,
}

impl CommandContext {
    /// Load configuration and apply CLI overrides.
    pub fn from_cli(cli: &Cli) -> Result<Self, SurveyError> {
        let mut config = AppConfig::load(cli.config.as_deref())?;

        if let Some(ref path) = cli.store {
            config.store.path = path.clone();
        }
        if let Some(ref backend) = cli.backend {
            config.store.backend = match backend.as_str() {
                "local" => BackendKind::Local,
                "sheet" => BackendKind::Sheet,
                other => {
                    return Err(SurveyError::InvalidConfig(format!(
                        "unknown backend {other:?} (expected \"local\" or \"sheet\")"
                    )));
                }
            };
        }
        config.validate()?;

        let questions = config.question_set()?;
        Ok(Self { config, questions })
    }

    /// The canonical header under the active policy.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        canonical_header(&self.questions, self.config.survey.require_consent)
    }
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(ctx: &CommandContext, host: &str, port: u16) -> Result<(), SurveyError> {
    let sink = StoreBackend::from_config(&ctx.config)?;

    println!("Centile Survey Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", host);
    println!("  Port:      {}", port);
    println!("  Sink:      {}", sink.describe());
    println!("  Questions: {}", ctx.questions.len());
    println!(
        "  Order:     {}",
        if ctx.config.survey.randomize_order {
            "randomized per session"
        } else {
            "canonical"
        }
    );
    println!();
    println!("Endpoints:");
    println!("  POST /session              - Create a participant session");
    println!("  GET  /session/{{id}}/screen  - Re-render the current screen");
    println!("  POST /session/{{id}}/advance - Attempt one stage transition");
    println!("  GET  /status               - Session counts");
    println!("  GET  /health               - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(
        ctx.questions.clone(),
        ctx.config.survey.clone(),
        sink,
    );
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the local store and write the canonical header.
pub fn cmd_init(ctx: &CommandContext, force: bool) -> Result<(), SurveyError> {
    if ctx.config.store.backend != BackendKind::Local {
        return Err(SurveyError::InvalidConfig(
            "init only applies to the local backend; the sheet header is reconciled on first append"
                .to_string(),
        ));
    }

    let store = CsvStore::new(&ctx.config.store.path);
    store.init(&ctx.header(), force)?;
    println!(
        "Initialized {} with {} columns",
        store.path().display(),
        ctx.header().len()
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store row count and header state.
pub fn cmd_status(ctx: &CommandContext, json_mode: bool) -> Result<(), SurveyError> {
    match ctx.config.store.backend {
        BackendKind::Local => {
            let store = CsvStore::new(&ctx.config.store.path);
            let rows = store.row_count()?;
            let canonical = ctx.header();
            let header_state = match reconcile(store.first_row()?.as_deref(), &canonical) {
                HeaderAction::Keep => "canonical",
                HeaderAction::WriteHeader => "empty",
                HeaderAction::ReplaceHeader => "MISMATCHED",
            };

            if json_mode {
                let output = serde_json::json!({
                    "backend": "local",
                    "store": store.path().to_string_lossy(),
                    "rows": rows,
                    "header": header_state,
                    "questions": ctx.questions.len(),
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).unwrap_or_default()
                );
                return Ok(());
            }

            println!("Centile Store Status");
            println!("====================");
            println!("Backend:   local");
            println!("Store:     {}", store.path().display());
            println!();
            println!("Rows:      {}", rows);
            println!("Header:    {}", header_state);
            println!("Questions: {}", ctx.questions.len());
        }
        BackendKind::Sheet => {
            let sheet = ctx.config.sheet.as_ref().ok_or_else(|| {
                SurveyError::InvalidConfig("sheet backend without a [sheet] section".to_string())
            })?;

            if json_mode {
                let output = serde_json::json!({
                    "backend": "sheet",
                    "endpoint": sheet.endpoint,
                    "document": sheet.document,
                    "worksheet": sheet.worksheet,
                    "questions": ctx.questions.len(),
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).unwrap_or_default()
                );
                return Ok(());
            }

            println!("Centile Store Status");
            println!("====================");
            println!("Backend:   sheet");
            println!("Endpoint:  {}", sheet.endpoint);
            println!("Document:  {}", sheet.document);
            println!("Worksheet: {}", sheet.worksheet);
            println!("Questions: {}", ctx.questions.len());
            println!();
            println!("Row counts for the sheet backend are tracked by the gateway.");
        }
    }
    Ok(())
}

// =============================================================================
// HEADER COMMAND
// =============================================================================

/// Print the canonical column header.
pub fn cmd_header(ctx: &CommandContext, json_mode: bool) -> Result<(), SurveyError> {
    let header = ctx.header();
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&header).unwrap_or_default()
        );
    } else {
        println!("{}", header.join(","));
    }
    Ok(())
}

// =============================================================================
// QUESTIONS COMMAND
// =============================================================================

/// List the active question set.
pub fn cmd_questions(ctx: &CommandContext, json_mode: bool) -> Result<(), SurveyError> {
    if json_mode {
        let items: Vec<serde_json::Value> = ctx
            .questions
            .iter()
            .map(|q| serde_json::json!({"id": q.id.value(), "prompt": q.prompt}))
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&items).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Active question set ({} prompts):", ctx.questions.len());
    for question in ctx.questions.iter() {
        println!("  {:>3}  {}", question.id.to_string(), question.prompt);
    }
    Ok(())
}
