//! # Centile CLI Module
//!
//! This module implements the CLI interface for Centile.
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP survey server
//! - `init` - Create the local store and write the canonical header
//! - `status` - Show store row count and header state
//! - `header` - Print the canonical column header
//! - `questions` - List the active question set

mod commands;

use centile_core::SurveyError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Centile - Interval-Elicitation Survey Server
///
/// Walks participants through a self-report stage and an incentivized
/// prediction stage, then appends one row per completed session to a local
/// CSV file or a remote spreadsheet gateway.
#[derive(Parser, Debug)]
#[command(name = "centile")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file (default: centile.toml when present)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the local store path from the configuration
    #[arg(short = 'S', long, global = true)]
    pub store: Option<PathBuf>,

    /// Override the persistence backend: "local" or "sheet"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP survey server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Create the local store and write the canonical header
    Init {
        /// Recreate the store even if it already has content
        #[arg(short, long)]
        force: bool,
    },

    /// Show store row count and header state
    Status,

    /// Print the canonical column header
    Header,

    /// List the active question set
    Questions,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SurveyError> {
    let ctx = CommandContext::from_cli(&cli)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(&ctx, &host, port).await,
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Status) => cmd_status(&ctx, cli.json_mode),
        Some(Commands::Header) => cmd_header(&ctx, cli.json_mode),
        Some(Commands::Questions) => cmd_questions(&ctx, cli.json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(&ctx, cli.json_mode)
        }
    }
}
