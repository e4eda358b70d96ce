//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::cli::DEFAULT_CONFIG_PATH;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing pii-guard configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Add [[rules.whitelist]] / [[rules.regex]] entries for your own identifiers");
                println!("  3. For an external analyzer, set kind = \"http\" and PII_GUARD_ANALYZER_API_KEY");
                println!("  4. Validate configuration: pii-guard validate-config");
                println!("  5. Run a scan: pii-guard scan data.csv --output redacted.csv");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Sample configuration with every option and its default
    fn sample_config() -> &'static str {
        r#"# pii-guard Configuration File
#
# Every setting below shows its default. Any value can be taken from the
# environment with ${VAR_NAME}, and overridden with PII_GUARD_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Builtin Recognizer
# ============================================================================
[analyzer]
# "patterns": in-process pattern library
# "http": external Presidio-compatible analyzer service
kind = "patterns"

# Optional: custom pattern library (TOML); the embedded library is used if unset
# pattern_library = "patterns/pii_patterns.toml"

# Analyzer service settings (kind = "http")
# endpoint = "http://localhost:5002"
# api_key = "${PII_GUARD_ANALYZER_API_KEY}"
language = "en"
timeout_seconds = 30
max_retries = 2
retry_delay_ms = 200

# ============================================================================
# Anonymization
# ============================================================================
[anonymization]
# Detect and report without changing text
dry_run = false

# Score given to custom rule matches
rule_score = 0.9

# Findings scored below this are discarded before merging
score_threshold = 0.0

# Which source wins when two findings cover the same span
source_priority = ["custom_whitelist", "custom_regex", "builtin"]

# Per-recognizer time budget for one segment
segment_timeout_ms = 5000

# Segments processed at once
max_concurrency = 8

[anonymization.audit]
# Audit log of findings with SHA-256 hashed values (never plaintext)
enabled = false
log_path = "./audit/pii-guard.log"
json_format = true

# ============================================================================
# Custom Rules
# ============================================================================
# Exact-match literals
# [[rules.whitelist]]
# entity_type = "SCHOOL_ID"
# values = ["223j1ao5g", "school123"]
# case_sensitive = false

# Regular expressions
# [[rules.regex]]
# entity_type = "EMPLOYEE_ID"
# pattern = 'EMP-\d{4}'

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files with rotation (daily, hourly, never)
local_enabled = false
local_path = "./logs"
local_rotation = "daily"

# Console logs as JSON
console_json = false
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_str;

    #[test]
    fn test_sample_config_is_valid() {
        let config = load_config_str(InitArgs::sample_config()).unwrap();
        assert!(config.rules.is_empty());
        assert_eq!(config.anonymization.segment_timeout_ms, 5000);
    }

    #[tokio::test]
    async fn test_init_writes_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("pii-guard.toml");
        let args = InitArgs {
            output: output.to_str().unwrap().to_string(),
            force: false,
        };

        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        assert!(output.exists());
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);

        let forced = InitArgs {
            force: true,
            ..args
        };
        assert_eq!(forced.execute().await.unwrap(), EXIT_OK);
    }
}
