//! Audit logger for anonymization runs

use crate::anonymization::models::{AnonymizedResult, FindingRecord};
use crate::domain::{PiiGuardError, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

/// Audit log entry, one per segment
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    run_id: String,
    origin: String,
    findings_count: usize,
    dry_run: bool,
    partial: bool,
    processing_time_ms: u64,
    findings: Vec<AuditFinding>,
}

/// Audit finding entry (with hashed PII)
#[derive(Debug, Serialize)]
struct AuditFinding {
    entity_type: String,
    source: String,
    start: usize,
    end: usize,
    score: f32,
    /// SHA-256 hash of matched text (never log plaintext PII)
    value_hash: String,
}

/// Audit logger for anonymization runs
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PiiGuardError::Io(format!(
                        "Failed to create audit log directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Append one entry per result
    pub fn log_results(&self, run_id: Uuid, dry_run: bool, results: &[AnonymizedResult]) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                PiiGuardError::Io(format!(
                    "Failed to open audit log {}: {e}",
                    self.log_path.display()
                ))
            })?;

        for result in results {
            let entry = AuditLogEntry {
                timestamp: Utc::now().to_rfc3339(),
                run_id: run_id.to_string(),
                origin: result.origin.to_string(),
                findings_count: result.findings.len(),
                dry_run,
                partial: result.is_partial(),
                processing_time_ms: result.processing_time_ms,
                findings: result
                    .findings
                    .iter()
                    .map(|r| self.create_audit_finding(r))
                    .collect(),
            };

            self.write_entry(&mut file, &entry)?;
        }

        Ok(())
    }

    fn create_audit_finding(&self, record: &FindingRecord) -> AuditFinding {
        AuditFinding {
            entity_type: record.finding.entity_type().to_string(),
            source: record.finding.source().to_string(),
            start: record.finding.start(),
            end: record.finding.end(),
            score: record.finding.score(),
            value_hash: self.hash_pii_value(&record.matched_text),
        }
    }

    /// Hash a PII value using SHA-256
    fn hash_pii_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        format!("{result:x}")
    }

    fn write_entry(&self, file: &mut std::fs::File, entry: &AuditLogEntry) -> Result<()> {
        if self.json_format {
            let json_line = serde_json::to_string(entry)?;
            writeln!(file, "{json_line}")?;
        } else {
            writeln!(
                file,
                "[{}] Run: {} | Origin: {} | Findings: {} | Dry run: {} | Time: {}ms",
                entry.timestamp,
                entry.run_id,
                entry.origin,
                entry.findings_count,
                entry.dry_run,
                entry.processing_time_ms
            )?;
        }

        Ok(())
    }
}
