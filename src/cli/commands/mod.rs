//! CLI command implementations
//!
//! Commands share configuration loading and engine construction through the
//! helpers in this module.

pub mod init;
pub mod scan;
pub mod text;
pub mod validate;

use crate::adapters::HttpAnalyzer;
use crate::anonymization::detector::regex::PatternRecognizer;
use crate::anonymization::detector::Recognizer;
use crate::anonymization::{AnonymizationEngine, ScanSession};
use crate::cli::DEFAULT_CONFIG_PATH;
use crate::config::{load_config, load_config_str, AnalyzerKind, PiiGuardConfig, RulesConfig};
use crate::domain::{PiiGuardError, Result};
use std::path::Path;
use std::sync::Arc;

/// Exit code: success
pub const EXIT_OK: i32 = 0;
/// Exit code: PII found and `--fail-on-findings` set
pub const EXIT_FINDINGS: i32 = 1;
/// Exit code: configuration or rule error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: some segments failed
pub const EXIT_PARTIAL: i32 = 3;
/// Exit code: fatal error
pub const EXIT_FATAL: i32 = 5;

/// Load the configuration named on the command line
///
/// An explicit path must exist. Without one, `pii-guard.toml` is used when
/// present and defaults (plus `PII_GUARD_*` overrides) otherwise.
pub fn load_configuration(config_path: Option<&str>) -> Result<PiiGuardConfig> {
    match config_path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH),
        None => {
            tracing::debug!("No configuration file, using defaults");
            load_config_str("")
        }
    }
}

/// Build the engine and its builtin recognizer from configuration
pub fn build_engine(config: &PiiGuardConfig) -> Result<AnonymizationEngine> {
    let builtin: Arc<dyn Recognizer> = match config.analyzer.kind {
        AnalyzerKind::Patterns => match config.analyzer.pattern_library {
            Some(ref path) => Arc::new(PatternRecognizer::from_file(path)?),
            None => Arc::new(PatternRecognizer::new()?),
        },
        AnalyzerKind::Http => Arc::new(HttpAnalyzer::new(&config.analyzer)?),
    };

    AnonymizationEngine::new(config.anonymization.clone(), builtin)
}

/// Register the configured rules plus `ENTITY=...` rules from the command line
///
/// Whitelist arguments take comma-separated literals
/// (`SCHOOL_ID=223j1ao5g,school123`); regex arguments take one pattern
/// (`EMPLOYEE_ID=EMP-\d{4}`). Command-line whitelist rules are case-insensitive.
pub fn register_rules(
    session: &mut ScanSession<'_>,
    rules: &RulesConfig,
    cli_whitelist: &[String],
    cli_regex: &[String],
) -> Result<()> {
    for rule in &rules.whitelist {
        session.register_whitelist_rule(&rule.entity_type, &rule.values, rule.case_sensitive)?;
    }
    for rule in &rules.regex {
        session.register_regex_rule(&rule.entity_type, &rule.pattern)?;
    }

    for arg in cli_whitelist {
        let (entity_type, values) = split_rule_arg(arg)?;
        session.register_whitelist_rule(entity_type, values.split(','), false)?;
    }
    for arg in cli_regex {
        let (entity_type, pattern) = split_rule_arg(arg)?;
        session.register_regex_rule(entity_type, pattern)?;
    }

    Ok(())
}

fn split_rule_arg(arg: &str) -> Result<(&str, &str)> {
    arg.split_once('=')
        .filter(|(entity, value)| !entity.trim().is_empty() && !value.is_empty())
        .map(|(entity, value)| (entity.trim(), value))
        .ok_or_else(|| {
            PiiGuardError::InvalidRule(format!("expected ENTITY=VALUE, got '{arg}'"))
        })
}

/// Exit code for an error raised before any segment was processed
pub fn exit_code_for(error: &PiiGuardError) -> i32 {
    match error {
        PiiGuardError::Configuration(_) | PiiGuardError::InvalidRule(_) => EXIT_CONFIG,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::AnonymizationConfig;
    use crate::config::{RegexRuleConfig, WhitelistRuleConfig};

    #[test]
    fn test_split_rule_arg() {
        assert_eq!(
            split_rule_arg("SCHOOL_ID=a,b").unwrap(),
            ("SCHOOL_ID", "a,b")
        );
        assert_eq!(
            split_rule_arg(r"EMP=EMP-\d{4}=x").unwrap(),
            ("EMP", r"EMP-\d{4}=x")
        );
        assert!(split_rule_arg("SCHOOL_ID").is_err());
        assert!(split_rule_arg("=value").is_err());
        assert!(split_rule_arg("SCHOOL_ID=").is_err());
    }

    #[test]
    fn test_register_rules() {
        let engine = AnonymizationEngine::with_default_patterns(AnonymizationConfig::default())
            .unwrap();
        let mut session = engine.session();
        let rules = RulesConfig {
            whitelist: vec![WhitelistRuleConfig {
                entity_type: "SCHOOL_ID".to_string(),
                values: vec!["223j1ao5g".to_string()],
                case_sensitive: false,
            }],
            regex: vec![RegexRuleConfig {
                entity_type: "EMPLOYEE_ID".to_string(),
                pattern: r"EMP-\d{4}".to_string(),
            }],
        };

        register_rules(
            &mut session,
            &rules,
            &["BADGE=b-1,b-2".to_string()],
            &[r"TICKET=T\d+".to_string()],
        )
        .unwrap();
        assert_eq!(session.registry().len(), 4);
    }

    #[test]
    fn test_register_rules_rejects_bad_regex() {
        let engine = AnonymizationEngine::with_default_patterns(AnonymizationConfig::default())
            .unwrap();
        let mut session = engine.session();
        let err = register_rules(
            &mut session,
            &RulesConfig::default(),
            &[],
            &["TICKET=(".to_string()],
        )
        .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_CONFIG);
    }

    #[test]
    fn test_build_engine_http_requires_endpoint() {
        let mut config = PiiGuardConfig::default();
        config.analyzer.kind = AnalyzerKind::Http;
        assert!(build_engine(&config).is_err());

        config.analyzer.endpoint = Some("http://localhost:5002".to_string());
        let engine = build_engine(&config).unwrap();
        assert_eq!(engine.builtin_name(), "http_analyzer");
    }
}
