//! Configuration schema types
//!
//! This module defines the configuration structure for pii-guard. Every
//! section has defaults, so an empty file is a valid configuration.

use crate::anonymization::AnonymizationConfig;
use crate::config::SecretString;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main pii-guard configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PiiGuardConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Builtin recognizer selection
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Detection, merge and substitution settings
    #[serde(default)]
    pub anonymization: AnonymizationConfig,

    /// Custom rules registered for every scan
    #[serde(default)]
    pub rules: RulesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PiiGuardConfig {
    /// Validates the configuration
    ///
    /// Rule patterns are compiled later, when they are registered; only
    /// their shape is checked here.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.analyzer.validate()?;
        self.anonymization.validate()?;
        self.rules.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Which builtin recognizer to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    /// In-process TOML pattern library
    #[default]
    Patterns,
    /// External analyzer service over HTTP
    Http,
}

/// Builtin recognizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Recognizer implementation
    #[serde(default)]
    pub kind: AnalyzerKind,

    /// Pattern library TOML file (embedded library when unset)
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,

    /// Analyzer service base URL (required for `kind = "http"`)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Optional API key sent as a bearer token
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Language code passed to the analyzer service
    #[serde(default = "default_language")]
    pub language: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retries after a transient failure (connection error, timeout, 5xx)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial retry delay in milliseconds, doubled per attempt
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            kind: AnalyzerKind::default(),
            pattern_library: None,
            endpoint: None,
            api_key: None,
            language: default_language(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl AnalyzerConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref path) = self.pattern_library {
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                return Err(format!(
                    "analyzer.pattern_library must be a TOML file: {}",
                    path.display()
                ));
            }
        }

        if self.kind == AnalyzerKind::Http {
            let endpoint = self
                .endpoint
                .as_deref()
                .ok_or("analyzer.endpoint is required when analyzer.kind = 'http'")?;

            let parsed = url::Url::parse(endpoint)
                .map_err(|e| format!("analyzer.endpoint '{endpoint}' is not a valid URL: {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!(
                    "analyzer.endpoint must use http or https, got '{}'",
                    parsed.scheme()
                ));
            }

            if self
                .api_key
                .as_ref()
                .is_some_and(|key| key.expose_secret().is_blank())
            {
                return Err("analyzer.api_key cannot be empty when set".to_string());
            }
        }

        if self.language.trim().is_empty() {
            return Err("analyzer.language cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("analyzer.timeout_seconds must be > 0".to_string());
        }

        Ok(())
    }
}

/// Custom rules declared in configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Exact-match literal rules
    #[serde(default)]
    pub whitelist: Vec<WhitelistRuleConfig>,

    /// Regex rules
    #[serde(default)]
    pub regex: Vec<RegexRuleConfig>,
}

impl RulesConfig {
    fn validate(&self) -> Result<(), String> {
        for (idx, rule) in self.whitelist.iter().enumerate() {
            if rule.entity_type.trim().is_empty() {
                return Err(format!("rules.whitelist[{idx}].entity_type cannot be empty"));
            }
            if rule.values.iter().all(|v| v.trim().is_empty()) {
                return Err(format!(
                    "rules.whitelist[{idx}] ('{}') has no values",
                    rule.entity_type
                ));
            }
        }

        for (idx, rule) in self.regex.iter().enumerate() {
            if rule.entity_type.trim().is_empty() {
                return Err(format!("rules.regex[{idx}].entity_type cannot be empty"));
            }
            if rule.pattern.is_empty() {
                return Err(format!(
                    "rules.regex[{idx}] ('{}') has an empty pattern",
                    rule.entity_type
                ));
            }
        }

        Ok(())
    }

    /// Total number of declared rules
    pub fn len(&self) -> usize {
        self.whitelist.len() + self.regex.len()
    }

    /// Whether no rule is declared
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `[[rules.whitelist]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistRuleConfig {
    /// Custom entity label
    pub entity_type: String,

    /// Literal values to match
    pub values: Vec<String>,

    /// Match case exactly
    #[serde(default)]
    pub case_sensitive: bool,
}

/// `[[rules.regex]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexRuleConfig {
    /// Custom entity label
    pub entity_type: String,

    /// Pattern in Rust `regex` syntax
    pub pattern: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    /// Emit console logs as JSON
    #[serde(default)]
    pub console_json: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            console_json: false,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
