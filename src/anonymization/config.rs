//! Anonymization configuration

use crate::anonymization::detector::rules::DEFAULT_RULE_SCORE;
use crate::anonymization::merger::SourcePriority;
use crate::anonymization::models::FindingSource;
use crate::domain::{PiiGuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Detection, merge and substitution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Dry-run mode (detect and report but don't rewrite text)
    #[serde(default)]
    pub dry_run: bool,

    /// Score assigned to whitelist/regex rule findings
    #[serde(default = "default_rule_score")]
    pub rule_score: f32,

    /// Candidates scoring below this are discarded before merging
    #[serde(default)]
    pub score_threshold: f32,

    /// Tie-break order between recognizer families, highest first
    #[serde(default)]
    pub source_priority: SourcePriority,

    /// Per-recognizer, per-segment timeout
    #[serde(default = "default_segment_timeout_ms")]
    pub segment_timeout_ms: u64,

    /// Maximum number of segments processed at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Audit logging configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            rule_score: default_rule_score(),
            score_threshold: 0.0,
            source_priority: SourcePriority::default(),
            segment_timeout_ms: default_segment_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            audit: AuditConfig::default(),
        }
    }
}

impl AnonymizationConfig {
    /// Per-recognizer timeout as a [`Duration`]
    pub fn segment_timeout(&self) -> Duration {
        Duration::from_millis(self.segment_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=1.0).contains(&self.rule_score) {
            return Err(format!(
                "anonymization.rule_score must be between 0.0 and 1.0, got {}",
                self.rule_score
            ));
        }

        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(format!(
                "anonymization.score_threshold must be between 0.0 and 1.0, got {}",
                self.score_threshold
            ));
        }

        if self.segment_timeout_ms == 0 {
            return Err("anonymization.segment_timeout_ms must be > 0".to_string());
        }

        if self.max_concurrency == 0 {
            return Err("anonymization.max_concurrency must be > 0".to_string());
        }

        self.audit.validate()?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(val) = env_parse("PII_GUARD_ANONYMIZATION_DRY_RUN")? {
            self.dry_run = val;
        }

        if let Some(val) = env_parse("PII_GUARD_ANONYMIZATION_RULE_SCORE")? {
            self.rule_score = val;
        }

        if let Some(val) = env_parse("PII_GUARD_ANONYMIZATION_SCORE_THRESHOLD")? {
            self.score_threshold = val;
        }

        if let Ok(val) = std::env::var("PII_GUARD_ANONYMIZATION_SOURCE_PRIORITY") {
            let order = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_source)
                .collect::<Result<Vec<_>>>()?;
            self.source_priority = SourcePriority::new(order)?;
        }

        if let Some(val) = env_parse("PII_GUARD_ANONYMIZATION_SEGMENT_TIMEOUT_MS")? {
            self.segment_timeout_ms = val;
        }

        if let Some(val) = env_parse("PII_GUARD_ANONYMIZATION_MAX_CONCURRENCY")? {
            self.max_concurrency = val;
        }

        self.audit.apply_env_overrides()?;

        Ok(())
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_audit_json_format")]
    pub json_format: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: default_audit_json_format(),
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("anonymization.audit.log_path cannot be empty".to_string());
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(val) = env_parse("PII_GUARD_ANONYMIZATION_AUDIT_ENABLED")? {
            self.enabled = val;
        }

        if let Ok(val) = std::env::var("PII_GUARD_ANONYMIZATION_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        if let Some(val) = env_parse("PII_GUARD_ANONYMIZATION_AUDIT_JSON_FORMAT")? {
            self.json_format = val;
        }

        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PiiGuardError::Configuration(format!("Invalid {key} value: {val}"))),
        Err(_) => Ok(None),
    }
}

fn parse_source(raw: &str) -> Result<FindingSource> {
    match raw.to_lowercase().as_str() {
        "builtin" => Ok(FindingSource::Builtin),
        "custom_whitelist" => Ok(FindingSource::CustomWhitelist),
        "custom_regex" => Ok(FindingSource::CustomRegex),
        _ => Err(PiiGuardError::Configuration(format!(
            "Invalid source '{raw}' in PII_GUARD_ANONYMIZATION_SOURCE_PRIORITY"
        ))),
    }
}

fn default_rule_score() -> f32 {
    DEFAULT_RULE_SCORE
}

fn default_segment_timeout_ms() -> u64 {
    5000
}

fn default_max_concurrency() -> usize {
    8
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/pii-guard.log")
}

fn default_audit_json_format() -> bool {
    true
}
