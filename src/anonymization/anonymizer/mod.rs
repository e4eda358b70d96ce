//! Anonymizer
//!
//! Applies a merged finding set to segment text. Each span is replaced by a
//! token chosen by a [`ReplacementStrategy`]; substitution runs from the
//! highest start offset down so offsets still pending stay valid.

pub mod redaction;

pub use redaction::PlaceholderStrategy;

use crate::anonymization::models::{Finding, FindingRecord};
use crate::domain::{PiiGuardError, Result};

/// Chooses the replacement token for a finding
pub trait ReplacementStrategy: Send + Sync {
    /// Token substituted for `finding`
    fn replacement(&self, finding: &Finding) -> String;
}

/// Redacted text plus one audit record per applied finding
#[derive(Debug, Clone)]
pub struct Redaction {
    /// Text after substitution (unchanged in dry-run mode)
    pub text: String,
    /// Audit records in left-to-right order
    pub records: Vec<FindingRecord>,
}

/// Substitutes findings in text
pub struct Anonymizer {
    strategy: Box<dyn ReplacementStrategy>,
    dry_run: bool,
}

impl Anonymizer {
    /// Create an anonymizer using `<ENTITY_TYPE>` placeholders
    pub fn new() -> Self {
        Self::with_strategy(Box::new(PlaceholderStrategy))
    }

    /// Create an anonymizer with a custom replacement strategy
    pub fn with_strategy(strategy: Box<dyn ReplacementStrategy>) -> Self {
        Self {
            strategy,
            dry_run: false,
        }
    }

    /// Report findings without rewriting the text
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether text is left unchanged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Apply `findings` to `text`
    ///
    /// `findings` must be sorted by start offset and pairwise non-overlapping,
    /// as produced by the merger.
    ///
    /// # Errors
    ///
    /// Returns [`PiiGuardError::InvariantViolation`] if two findings overlap,
    /// are out of order, or a span does not fit `text`. Nothing is
    /// substituted in that case.
    pub fn anonymize(&self, text: &str, findings: Vec<Finding>) -> Result<Redaction> {
        for pair in findings.windows(2) {
            if pair[1].start() < pair[0].end() {
                return Err(PiiGuardError::InvariantViolation(format!(
                    "findings [{}, {}) {} and [{}, {}) {} overlap or are out of order",
                    pair[0].start(),
                    pair[0].end(),
                    pair[0].entity_type(),
                    pair[1].start(),
                    pair[1].end(),
                    pair[1].entity_type()
                )));
            }
        }

        let mut records = Vec::with_capacity(findings.len());
        for finding in findings {
            let matched_text = finding
                .check_bounds(text)
                .ok()
                .and_then(|_| finding.matched(text))
                .ok_or_else(|| {
                    PiiGuardError::InvariantViolation(format!(
                        "finding [{}, {}) {} does not fit text of length {}",
                        finding.start(),
                        finding.end(),
                        finding.entity_type(),
                        text.len()
                    ))
                })?
                .to_string();
            let placeholder = self.strategy.replacement(&finding);

            records.push(FindingRecord {
                finding,
                matched_text,
                placeholder,
            });
        }

        let mut redacted = text.to_string();
        if !self.dry_run {
            for record in records.iter().rev() {
                redacted.replace_range(record.finding.span(), &record.placeholder);
            }
        }

        Ok(Redaction {
            text: redacted,
            records,
        })
    }
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new()
    }
}
