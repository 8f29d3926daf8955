//! Command-line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Recurrent - feed a large text file to a language model, one chunk at a time.
#[derive(Debug, Parser)]
#[command(name = "recurrent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (.json, .yaml, .yml or .toml)
    pub config: PathBuf,

    /// Log debug details (overridden by RUST_LOG)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log warnings and errors only (overridden by RUST_LOG)
    #[arg(short, long)]
    pub quiet: bool,

    /// Report format on stdout
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// How the run report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary line
    Text,
    /// The output document as JSON
    Json,
}

impl Cli {
    /// Log level used when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
