//! Anonymized result data model

use super::{Finding, Origin};
use crate::domain::EntityType;
use serde::Serialize;
use std::collections::BTreeMap;

/// Audit record for one applied finding
///
/// Keeps the offsets and score computed before substitution; they index the
/// original segment text, not the redacted text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingRecord {
    /// The accepted finding
    #[serde(flatten)]
    pub finding: Finding,
    /// Text the finding covered in the original segment
    pub matched_text: String,
    /// Token that replaced it
    pub placeholder: String,
}

/// Terminal artifact for one segment
#[derive(Debug, Clone, Serialize)]
pub struct AnonymizedResult {
    /// Where the segment came from
    pub origin: Origin,
    /// Redacted text (original text in dry-run mode)
    pub text: String,
    /// Accepted findings in left-to-right order
    pub findings: Vec<FindingRecord>,
    /// Recoverable problems, e.g. a recognizer timing out
    pub warnings: Vec<String>,
    /// Wall time spent on this segment
    pub processing_time_ms: u64,
}

impl AnonymizedResult {
    /// Get total number of findings
    pub fn total_findings(&self) -> usize {
        self.findings.len()
    }

    /// Check if any PII was found
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    /// A partial result is missing output from at least one recognizer
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Findings per entity type
    pub fn counts_by_entity(&self) -> BTreeMap<EntityType, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.findings {
            *counts
                .entry(record.finding.entity_type().clone())
                .or_insert(0) += 1;
        }
        counts
    }
}
