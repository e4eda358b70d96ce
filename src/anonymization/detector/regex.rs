//! Regex-based builtin recognizer

use super::{patterns::PatternRegistry, Recognizer};
use crate::anonymization::models::{Finding, FindingSource};
use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// In-process builtin recognizer backed by a TOML pattern library
pub struct PatternRecognizer {
    pattern_registry: Arc<PatternRegistry>,
    min_confidence: f32,
}

impl PatternRecognizer {
    /// Create a new recognizer with the embedded default patterns
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self::with_registry(registry))
    }

    /// Create a recognizer from a pattern library file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let registry = PatternRegistry::from_file(path)?;
        Ok(Self::with_registry(registry))
    }

    /// Create a new recognizer with a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            pattern_registry: Arc::new(registry),
            min_confidence: 0.0,
        }
    }

    /// Skip patterns whose confidence is below `threshold`
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    /// Run every pattern over `text`
    ///
    /// Findings come out grouped by pattern, not sorted; overlaps between
    /// patterns are left for the merger.
    pub fn detect(&self, text: &str) -> Vec<Finding> {
        let mut findings = Vec::new();

        for pattern in self.pattern_registry.all_patterns() {
            if pattern.confidence < self.min_confidence {
                continue;
            }

            for matched in pattern.regex.find_iter(text) {
                if matched.is_empty() {
                    continue;
                }
                if let Some(validator) = pattern.validator {
                    if !validator.is_valid(matched.as_str()) {
                        tracing::trace!(
                            entity_type = %pattern.entity_type,
                            start = matched.start(),
                            "Candidate failed validator"
                        );
                        continue;
                    }
                }

                match Finding::new(
                    pattern.entity_type.clone(),
                    matched.start(),
                    matched.end(),
                    pattern.confidence,
                    FindingSource::Builtin,
                ) {
                    Ok(finding) => findings.push(finding),
                    Err(e) => tracing::debug!(error = %e, "Discarding pattern match"),
                }
            }
        }

        findings
    }
}

#[async_trait]
impl Recognizer for PatternRecognizer {
    fn name(&self) -> &str {
        "patterns"
    }

    async fn analyze(&self, text: &str) -> Result<Vec<Finding>> {
        Ok(self.detect(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> PatternRecognizer {
        PatternRecognizer::new().unwrap()
    }

    #[test]
    fn test_detect_email() {
        let findings = recognizer().detect("John,john.doe@company.com,223j1ao5g");

        assert_eq!(findings.len(), 1);
        let email = &findings[0];
        assert_eq!(email.entity_type().as_str(), "EMAIL_ADDRESS");
        assert_eq!(email.span(), 5..25);
        assert!((email.score() - 0.98).abs() < f32::EPSILON);
        assert_eq!(email.source(), FindingSource::Builtin);
    }

    #[test]
    fn test_detect_phone() {
        let findings = recognizer().detect("Call (555) 123-4567");
        assert!(findings
            .iter()
            .any(|f| f.entity_type().as_str() == "PHONE_NUMBER"));
    }

    #[test]
    fn test_credit_card_requires_luhn() {
        let valid = recognizer().detect("card 4111 1111 1111 1111 on file");
        assert!(valid
            .iter()
            .any(|f| f.entity_type().as_str() == "CREDIT_CARD"));

        let invalid = recognizer().detect("card 4111 1111 1111 1112 on file");
        assert!(!invalid
            .iter()
            .any(|f| f.entity_type().as_str() == "CREDIT_CARD"));
    }

    #[test]
    fn test_ssn_detected() {
        let findings = recognizer().detect("SSN: 123-45-6789");
        assert!(findings.iter().any(|f| f.entity_type().as_str() == "US_SSN"));
    }

    #[test]
    fn test_placeholders_are_not_classified() {
        let findings = recognizer().detect("John,<EMAIL_ADDRESS>,<SCHOOL_ID>");
        assert!(findings.is_empty());
    }

    #[test]
    fn test_no_pii() {
        assert!(recognizer().detect("Hello world, nothing here.").is_empty());
    }

    #[test]
    fn test_min_confidence_filters_patterns() {
        let findings = recognizer()
            .with_min_confidence(0.99)
            .detect("mail john.doe@company.com");
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_via_trait() {
        let recognizer: Arc<dyn Recognizer> = Arc::new(recognizer());
        let findings = recognizer.analyze("ping 192.168.1.10").await.unwrap();
        assert!(findings
            .iter()
            .any(|f| f.entity_type().as_str() == "IP_ADDRESS"));
        assert_eq!(recognizer.name(), "patterns");
    }
}
