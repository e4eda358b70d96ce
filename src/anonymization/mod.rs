//! Detection, merge and anonymization pipeline
//!
//! This module finds PII in normalized text segments and produces redacted
//! copies with stable placeholder tokens.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! - **Normalizer**: maps tables and documents to flat text segments
//! - **Detection**: builtin recognizer (pattern library or external analyzer)
//!   plus caller-defined whitelist/regex rules
//! - **Merger**: reconciles overlapping candidates by position, source
//!   priority and score
//! - **Anonymizer**: substitutes `<ENTITY_TYPE>` placeholders
//! - **Audit**: structured logging with hashed PII values
//!
//! # Usage
//!
//! ```rust,ignore
//! use pii_guard::anonymization::{AnonymizationConfig, AnonymizationEngine};
//!
//! let engine = AnonymizationEngine::with_default_patterns(AnonymizationConfig::default())?;
//! let mut session = engine.session();
//! session.register_regex_rule("EMPLOYEE_ID", r"EMP-\d{4}")?;
//! let results = session.process(segments).await?;
//! ```

pub mod anonymizer;
pub mod audit;
pub mod config;
pub mod detector;
pub mod engine;
pub mod export;
pub mod merger;
pub mod models;
pub mod normalizer;
pub mod report;

// Re-export main types
pub use config::AnonymizationConfig;
pub use engine::{AnonymizationEngine, ScanOutcome, ScanSession, SegmentFailure};
pub use export::{redact_table, ExportFormat, FindingsTable};
pub use merger::{FindingMerger, SourcePriority};
pub use models::{AnonymizedResult, Finding, FindingRecord, FindingSource, NormalizedSegment, Origin};
pub use normalizer::{SegmentNormalizer, Table};
pub use report::ScanReport;
