//! # Skein - Graph Instance Runner
//!
//! The main binary for the Skein instance core.
//!
//! This application provides:
//! - Headless instance runs driven from snapshot files
//! - Snapshot format conversion (JSON <-> binary envelope)
//! - Snapshot inspection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            apps/skein (THE BINARY)          │
//! │                                             │
//! │   ┌───────────┐      ┌──────────────────┐   │
//! │   │   CLI     │      │  Snapshot I/O    │   │
//! │   │  (clap)   │      │  (JSON/envelope) │   │
//! │   └─────┬─────┘      └────────┬─────────┘   │
//! │         └───────────┬─────────┘             │
//! │                     ▼                       │
//! │             ┌──────────────┐                │
//! │             │  skein-core  │                │
//! │             │ (THE LOGIC)  │                │
//! │             └──────────────┘                │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Run a snapshot through a headless bootstrap and print the result
//! skein run -f graph.json --layout grid
//!
//! # Convert between formats
//! skein convert -f graph.json -o graph.skein
//!
//! # Inspect a snapshot
//! skein info -f graph.skein
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — SKEIN_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SKEIN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "skein=debug,skein_core=debug"
    } else {
        "skein=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

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

/// Print the Skein startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗██╗  ██╗███████╗██╗███╗   ██╗
  ██╔════╝██║ ██╔╝██╔════╝██║████╗  ██║
  ███████╗█████╔╝ █████╗  ██║██╔██╗ ██║
  ╚════██║██╔═██╗ ██╔══╝  ██║██║╚██╗██║
  ███████║██║  ██╗███████╗██║██║ ╚████║
  ╚══════╝╚═╝  ╚═╝╚══════╝╚═╝╚═╝  ╚═══╝

  Graph Instance Runner v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
