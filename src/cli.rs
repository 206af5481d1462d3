use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::Severity;
use crate::io::output;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

impl From<OutputFormat> for output::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => output::OutputFormat::Terminal,
            OutputFormat::Json => output::OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityLevel {
    Warning,
    Error,
}

impl From<SeverityLevel> for Severity {
    fn from(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Warning => Severity::Warning,
            SeverityLevel::Error => Severity::Error,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "resultguard")]
#[command(about = "Flags unchecked value access on Result-like wrapper types", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a Rust file or directory tree for unguarded value accesses
    Check {
        /// Path to check
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to resultguard.toml at the root)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Member name of the success flag
        #[arg(long)]
        success_flag: Option<String>,

        /// Member name of the failure flag
        #[arg(long)]
        failure_flag: Option<String>,

        /// Member name of the value accessor
        #[arg(long)]
        value_accessor: Option<String>,

        /// Only consider accesses whose receiver contains this substring
        #[arg(long)]
        receiver_contains: Option<String>,

        /// Severity attached to findings
        #[arg(long, value_enum)]
        severity: Option<SeverityLevel>,
    },
}
