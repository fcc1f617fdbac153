//! # Skein CLI Module
//!
//! This module implements the CLI interface for Skein.
//!
//! ## Available Commands
//!
//! - `run` - Run a snapshot through a headless bootstrap
//! - `convert` - Convert a snapshot between JSON and the binary envelope
//! - `info` - Inspect a snapshot file

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use skein_core::SkeinError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Skein - Graph Instance Runner
///
/// Loads graph snapshots, runs them through the headless instance
/// lifecycle, and writes the settled result back out.
#[derive(Parser, Debug)]
#[command(name = "skein")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Snapshot file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapshotFormat {
    /// Plain JSON snapshot
    Json,
    /// Binary envelope (magic + version header over JSON)
    Envelope,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a snapshot through a headless bootstrap and capture the result
    Run {
        /// Path to the input snapshot (JSON or envelope, sniffed)
        #[arg(short, long)]
        file: PathBuf,

        /// Layout to run over the loaded elements
        #[arg(short, long, default_value = "grid")]
        layout: String,

        /// Output file path; prints to stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output encoding
        #[arg(short = 't', long, value_enum, default_value = "json")]
        format: SnapshotFormat,
    },

    /// Convert a snapshot between JSON and the binary envelope
    Convert {
        /// Path to the input snapshot (JSON or envelope, sniffed)
        #[arg(short, long)]
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output encoding; inferred from the input when absent (the
        /// opposite of what was read)
        #[arg(short = 't', long, value_enum)]
        format: Option<SnapshotFormat>,
    },

    /// Inspect a snapshot file
    Info {
        /// Path to the snapshot (JSON or envelope, sniffed)
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SkeinError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Run {
            file,
            layout,
            output,
            format,
        } => cmd_run(&file, &layout, output.as_deref(), format).await,
        Commands::Convert {
            file,
            output,
            format,
        } => cmd_convert(&file, &output, format),
        Commands::Info { file } => cmd_info(&file, json_mode),
    }
}
