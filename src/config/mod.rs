//! Configuration management for pii-guard.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! pii-guard uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PII_GUARD_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation of every section on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pii_guard::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("pii-guard.toml")?;
//!
//! println!("Analyzer: {:?}", config.analyzer.kind);
//! println!("Dry run: {}", config.anonymization.dry_run);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`AnalyzerConfig`] - Builtin recognizer (pattern library or HTTP analyzer)
//! - [`AnonymizationConfig`](crate::anonymization::AnonymizationConfig) - Merge, timeout and audit settings
//! - [`RulesConfig`] - Whitelist and regex rules registered for every scan
//! - [`LoggingConfig`] - Logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [analyzer]
//! kind = "http"
//! endpoint = "http://localhost:5002"
//! api_key = "${PII_GUARD_ANALYZER_API_KEY}"
//!
//! [anonymization]
//! score_threshold = 0.3
//! segment_timeout_ms = 5000
//!
//! [[rules.whitelist]]
//! entity_type = "SCHOOL_ID"
//! values = ["223j1ao5g", "school123"]
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_str};
pub use schema::{
    AnalyzerConfig, AnalyzerKind, ApplicationConfig, LoggingConfig, PiiGuardConfig,
    RegexRuleConfig, RulesConfig, WhitelistRuleConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
