//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AnalyzerKind, PiiGuardConfig};
use super::secret_string;
use crate::domain::errors::PiiGuardError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PiiGuardConfig
/// 4. Applies environment variable overrides (PII_GUARD_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use pii_guard::config::loader::load_config;
///
/// let config = load_config("pii-guard.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PiiGuardConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PiiGuardError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PiiGuardError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    load_config_str(&contents)
}

/// Loads configuration from TOML text
///
/// Same steps as [`load_config`] minus the file read.
pub fn load_config_str(contents: &str) -> Result<PiiGuardConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PiiGuardConfig = toml::from_str(&contents)
        .map_err(|e| PiiGuardError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PiiGuardError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| PiiGuardError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PiiGuardError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the PII_GUARD_* prefix
///
/// Variables follow the pattern PII_GUARD_<SECTION>_<KEY>, for example
/// PII_GUARD_ANALYZER_ENDPOINT or PII_GUARD_ANONYMIZATION_DRY_RUN.
fn apply_env_overrides(config: &mut PiiGuardConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("PII_GUARD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Analyzer overrides
    if let Ok(val) = std::env::var("PII_GUARD_ANALYZER_KIND") {
        config.analyzer.kind = match val.to_lowercase().as_str() {
            "patterns" => AnalyzerKind::Patterns,
            "http" => AnalyzerKind::Http,
            _ => {
                return Err(PiiGuardError::Configuration(format!(
                    "Invalid PII_GUARD_ANALYZER_KIND value: {val}"
                )))
            }
        };
    }
    if let Ok(val) = std::env::var("PII_GUARD_ANALYZER_PATTERN_LIBRARY") {
        config.analyzer.pattern_library = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("PII_GUARD_ANALYZER_ENDPOINT") {
        config.analyzer.endpoint = Some(val);
    }
    if let Ok(val) = std::env::var("PII_GUARD_ANALYZER_API_KEY") {
        config.analyzer.api_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("PII_GUARD_ANALYZER_LANGUAGE") {
        config.analyzer.language = val;
    }
    if let Ok(val) = std::env::var("PII_GUARD_ANALYZER_TIMEOUT_SECONDS") {
        config.analyzer.timeout_seconds = val.parse().map_err(|_| {
            PiiGuardError::Configuration(format!(
                "Invalid PII_GUARD_ANALYZER_TIMEOUT_SECONDS value: {val}"
            ))
        })?;
    }

    // Anonymization overrides
    config.anonymization.apply_env_overrides()?;

    // Logging overrides
    if let Ok(val) = std::env::var("PII_GUARD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("PII_GUARD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("PII_GUARD_LOGGING_CONSOLE_JSON") {
        config.logging.console_json = val.parse().unwrap_or(false);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("PII_GUARD_TEST_SUBST_KEY", "test_value");
        let input = "api_key = \"${PII_GUARD_TEST_SUBST_KEY}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_key = \"test_value\"\n");
        std::env::remove_var("PII_GUARD_TEST_SUBST_KEY");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("PII_GUARD_TEST_MISSING_VAR");
        let input = "api_key = \"${PII_GUARD_TEST_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("PII_GUARD_TEST_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# api_key = \"${PII_GUARD_TEST_COMMENTED}\"";
        assert_eq!(substitute_env_vars(input).unwrap(), format!("{input}\n"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(PiiGuardError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        std::env::set_var("PII_GUARD_TEST_ANALYZER_KEY", "k-123");
        let toml_content = r#"
[application]
log_level = "info"

[analyzer]
kind = "http"
endpoint = "http://localhost:5002"
api_key = "${PII_GUARD_TEST_ANALYZER_KEY}"

[anonymization]
segment_timeout_ms = 2000

[anonymization.audit]
enabled = false

[[rules.whitelist]]
entity_type = "SCHOOL_ID"
values = ["223j1ao5g", "school123"]
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        std::env::remove_var("PII_GUARD_TEST_ANALYZER_KEY");

        assert_eq!(config.analyzer.kind, AnalyzerKind::Http);
        assert_eq!(
            config
                .analyzer
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().as_ref().to_string()),
            Some("k-123".to_string())
        );
        assert_eq!(config.anonymization.segment_timeout_ms, 2000);
        assert_eq!(config.rules.whitelist[0].values.len(), 2);
    }

    #[test]
    fn test_load_config_invalid() {
        let result = load_config_str("[application]\nlog_level = \"loud\"\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_config_str("").unwrap();
        assert_eq!(config.analyzer.kind, AnalyzerKind::Patterns);
        assert_eq!(config.anonymization.max_concurrency, 8);
    }
}
