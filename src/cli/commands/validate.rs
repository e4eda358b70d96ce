//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the pii-guard configuration file, including compiling its custom rules.

use super::{build_engine, load_configuration, register_rules, EXIT_CONFIG, EXIT_OK};
use crate::cli::DEFAULT_CONFIG_PATH;
use crate::config::AnalyzerKind;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        let shown_path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);
        tracing::info!(config_path = %shown_path, "Validating configuration");

        println!("🔍 Validating configuration file: {shown_path}");
        println!();

        // Loading validates every section
        let config = match load_configuration(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        // Rules and the pattern library only fail once compiled
        let engine = match build_engine(&config) {
            Ok(engine) => engine,
            Err(e) => {
                println!("❌ Recognizer setup failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        let mut session = engine.session();
        let rules = register_rules(&mut session, &config.rules, &[], &[]);
        engine.shutdown().await?;

        if let Err(e) = rules {
            println!("❌ Rule validation failed");
            println!("   Error: {e}");
            println!();
            return Ok(EXIT_CONFIG);
        }

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        match config.analyzer.kind {
            AnalyzerKind::Patterns => println!(
                "  Analyzer: patterns ({})",
                config
                    .analyzer
                    .pattern_library
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "embedded library".to_string())
            ),
            AnalyzerKind::Http => println!(
                "  Analyzer: http ({})",
                config.analyzer.endpoint.as_deref().unwrap_or_default()
            ),
        }
        println!("  Dry Run: {}", config.anonymization.dry_run);
        println!("  Score Threshold: {}", config.anonymization.score_threshold);
        println!(
            "  Source Priority: {:?}",
            config.anonymization.source_priority.order()
        );
        println!(
            "  Segment Timeout: {} ms",
            config.anonymization.segment_timeout_ms
        );
        println!("  Max Concurrency: {}", config.anonymization.max_concurrency);
        println!("  Whitelist Rules: {}", config.rules.whitelist.len());
        println!("  Regex Rules: {}", config.rules.regex.len());
        println!("  Audit Log: {}", config.anonymization.audit.enabled);
        println!();

        Ok(EXIT_OK)
    }
}
