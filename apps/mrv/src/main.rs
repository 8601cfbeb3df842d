//! # MRV Readiness
//!
//! The main binary for the MRV readiness self-assessment.
//!
//! This application provides:
//! - CLI interface for projects, assessments and history
//! - HTTP REST API server (axum-based)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              apps/mrv (THE BINARY)           │
//! │                                              │
//! │   ┌─────────────┐        ┌─────────────┐     │
//! │   │    CLI      │        │  HTTP API   │     │
//! │   │   (clap)    │        │   (axum)    │     │
//! │   └──────┬──────┘        └──────┬──────┘     │
//! │          └───────────┬──────────┘            │
//! │                      ▼                       │
//! │              ┌───────────────┐               │
//! │              │   mrv-core    │               │
//! │              │  (THE LOGIC)  │               │
//! │              └───────────────┘               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! mrv project add --id p-1 --code CR-001 --name "Cookstoves Kenya"
//! mrv assess --project p-1 --ef-trace 2 --uncertainty 2 --save
//! mrv history --project p-1
//! mrv server --port 8080
//! ```

use clap::Parser;
use mrv::{cli, config::MrvConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Config is needed before tracing so the file can pick the log format.
    let config = match MrvConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mrv=info,tower_http=debug".into());

    match config.log_format().as_str() {
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

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ███╗   ███╗██████╗ ██╗   ██╗
  ████╗ ████║██╔══██╗██║   ██║
  ██╔████╔██║██████╔╝██║   ██║
  ██║╚██╔╝██║██╔══██╗╚██╗ ██╔╝
  ██║ ╚═╝ ██║██║  ██║ ╚████╔╝
  ╚═╝     ╚═╝╚═╝  ╚═╝  ╚═══╝

  MRV Readiness v{}

  Boundary • Baseline • Assumptions • Factors • Uncertainty
"#,
        env!("CARGO_PKG_VERSION")
    );
}
