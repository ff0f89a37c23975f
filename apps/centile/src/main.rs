//! # Centile - Interval-Elicitation Survey Server
//!
//! The main binary for the Centile survey engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based Screen Presenter boundary)
//! - CLI interface for store management and inspection
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                    apps/centile (THE BINARY)                   │
//! │                                                                │
//! │  ┌─────────────┐    ┌──────────────┐    ┌──────────────────┐  │
//! │  │   CLI       │    │  HTTP API    │    │   Sheet Sink     │  │
//! │  │  (clap)     │    │  (axum)      │    │   (reqwest)      │  │
//! │  └──────┬──────┘    └──────┬───────┘    └────────┬─────────┘  │
//! │         │                  │                     │            │
//! │         └──────────────────┼─────────────────────┘            │
//! │                            ▼                                  │
//! │                    ┌───────────────┐                          │
//! │                    │ centile-core  │                          │
//! │                    │  (THE LOGIC)  │                          │
//! │                    └───────────────┘                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! centile serve --host 0.0.0.0 --port 8080
//!
//! # Store management
//! centile init
//! centile status
//! centile header
//! centile questions
//! ```

use centile::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — CENTILE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CENTILE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "centile=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Centile startup banner.
fn print_banner() {
    println!(
        r#"
   ██████╗███████╗███╗   ██╗████████╗██╗██╗     ███████╗
  ██╔════╝██╔════╝████╗  ██║╚══██╔══╝██║██║     ██╔════╝
  ██║     █████╗  ██╔██╗ ██║   ██║   ██║██║     █████╗
  ██║     ██╔══╝  ██║╚██╗██║   ██║   ██║██║     ██╔══╝
  ╚██████╗███████╗██║ ╚████║   ██║   ██║███████╗███████╗
   ╚═════╝╚══════╝╚═╝  ╚═══╝   ╚═╝   ╚═╝╚══════╝╚══════╝

  Interval-Elicitation Survey Server v{}

  Elicit • Predict • Commit
"#,
        env!("CARGO_PKG_VERSION")
    );
}
