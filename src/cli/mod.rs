//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for pii-guard using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Configuration file used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "pii-guard.toml";

/// pii-guard - PII detection and redaction
#[derive(Parser, Debug)]
#[command(name = "pii-guard")]
#[command(version, about, long_about = None)]
#[command(author = "pii-guard Contributors")]
pub struct Cli {
    /// Path to configuration file [default: pii-guard.toml, if present]
    #[arg(short, long, env = "PII_GUARD_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PII_GUARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a CSV, JSON or text file and write a redacted copy
    Scan(commands::scan::ScanArgs),

    /// Scan a single string and print the redacted text
    Text(commands::text::TextArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
