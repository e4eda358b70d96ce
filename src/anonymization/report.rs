//! Run reporting
//!
//! A [`ScanReport`] summarizes one run: how many segments were scanned, what
//! was found, and which segments came back partial or failed. It never
//! contains matched text.

use crate::anonymization::models::{AnonymizedResult, Origin};
use crate::domain::{PiiGuardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Summary of one scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Unique run identifier
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Whether text was left unchanged
    pub dry_run: bool,

    /// Segments submitted to the run
    pub total_segments: usize,

    /// Total findings applied
    pub total_findings: usize,

    /// Findings by entity type
    pub findings_by_entity: BTreeMap<String, usize>,

    /// Findings by recognizer family
    pub findings_by_source: BTreeMap<String, usize>,

    /// Segments missing output from at least one recognizer
    pub partial_segments: Vec<SegmentIssue>,

    /// Segments that produced no result
    pub failed_segments: Vec<SegmentIssue>,

    /// Processing statistics
    pub stats: ProcessingStats,
}

/// A segment that needs attention
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentIssue {
    /// Segment locator
    pub origin: String,
    /// What went wrong
    pub message: String,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Average processing time per completed segment (ms)
    pub avg_processing_time_ms: u64,

    /// Sum of per-segment processing times (ms)
    pub total_processing_time_ms: u64,

    /// Wall time of the whole run (ms)
    pub wall_time_ms: u64,

    /// Segments with PII detected
    pub segments_with_pii: usize,

    /// Segments without PII
    pub segments_without_pii: usize,
}

impl ScanReport {
    /// Create a new empty report
    pub fn new(run_id: Uuid, dry_run: bool) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            dry_run,
            total_segments: 0,
            total_findings: 0,
            findings_by_entity: BTreeMap::new(),
            findings_by_source: BTreeMap::new(),
            partial_segments: Vec::new(),
            failed_segments: Vec::new(),
            stats: ProcessingStats::default(),
        }
    }

    /// Add a completed segment
    pub fn add_result(&mut self, result: &AnonymizedResult) {
        self.total_segments += 1;
        self.stats.total_processing_time_ms += result.processing_time_ms;

        if result.has_findings() {
            self.stats.segments_with_pii += 1;
            self.total_findings += result.total_findings();

            for record in &result.findings {
                *self
                    .findings_by_entity
                    .entry(record.finding.entity_type().to_string())
                    .or_insert(0) += 1;
                *self
                    .findings_by_source
                    .entry(record.finding.source().to_string())
                    .or_insert(0) += 1;
            }
        } else {
            self.stats.segments_without_pii += 1;
        }

        for warning in &result.warnings {
            self.partial_segments.push(SegmentIssue {
                origin: result.origin.to_string(),
                message: warning.clone(),
            });
        }

        let completed = self.stats.segments_with_pii + self.stats.segments_without_pii;
        if completed > 0 {
            self.stats.avg_processing_time_ms =
                self.stats.total_processing_time_ms / completed as u64;
        }
    }

    /// Add a segment that failed
    pub fn add_failure(&mut self, origin: &Origin, error: &PiiGuardError) {
        self.total_segments += 1;
        self.failed_segments.push(SegmentIssue {
            origin: origin.to_string(),
            message: error.to_string(),
        });
    }

    /// Record the run's wall time
    pub fn finish(&mut self, wall_time_ms: u64) {
        self.stats.wall_time_ms = wall_time_ms;
    }

    /// Whether any segment failed
    pub fn has_failures(&self) -> bool {
        !self.failed_segments.is_empty()
    }

    /// Whether any segment is partial
    pub fn has_partial_segments(&self) -> bool {
        !self.partial_segments.is_empty()
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        let title = if self.dry_run {
            "                  PII SCAN REPORT (DRY RUN)                    "
        } else {
            "                        PII SCAN REPORT                        "
        };

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str(title);
        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  Run ID:                 {}\n", self.run_id));
        output.push_str(&format!(
            "  Segments Scanned:       {}\n",
            self.total_segments
        ));
        output.push_str(&format!(
            "  Segments with PII:      {}\n",
            self.stats.segments_with_pii
        ));
        output.push_str(&format!(
            "  Segments without PII:   {}\n",
            self.stats.segments_without_pii
        ));
        output.push_str(&format!(
            "  Total Findings:         {}\n",
            self.total_findings
        ));
        output.push_str(&format!(
            "  Avg Processing Time:    {} ms\n",
            self.stats.avg_processing_time_ms
        ));
        output.push_str(&format!(
            "  Wall Time:              {} ms\n",
            self.stats.wall_time_ms
        ));
        output.push('\n');

        if !self.findings_by_entity.is_empty() {
            output.push_str("🔍 FINDINGS BY ENTITY TYPE\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            let mut entities: Vec<_> = self.findings_by_entity.iter().collect();
            entities.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            for (entity, count) in entities {
                output.push_str(&format!("  {entity:30} {count:>5}\n"));
            }
            output.push('\n');

            output.push_str("🧭 FINDINGS BY SOURCE\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for (source, count) in &self.findings_by_source {
                output.push_str(&format!("  {source:30} {count:>5}\n"));
            }
            output.push('\n');
        }

        if !self.partial_segments.is_empty() {
            output.push_str("⚠️  PARTIAL SEGMENTS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for issue in &self.partial_segments {
                output.push_str(&format!("  • {}: {}\n", issue.origin, issue.message));
            }
            output.push('\n');
        }

        if !self.failed_segments.is_empty() {
            output.push_str("❌ FAILED SEGMENTS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for issue in &self.failed_segments {
                output.push_str(&format!("  • {}: {}\n", issue.origin, issue.message));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write report to file as JSON
    pub fn write_to_file(&self, path: &std::path::Path) -> Result<()> {
        let json = self.format_json()?;
        std::fs::write(path, json).map_err(|e| {
            PiiGuardError::Export(format!("Failed to write report {}: {e}", path.display()))
        })
    }
}
