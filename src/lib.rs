// pii-guard - PII detection and redaction
// Copyright (c) 2025 pii-guard Contributors
// Licensed under the MIT License

//! # pii-guard - PII detection and redaction
//!
//! pii-guard finds personally identifiable information in tabular data and
//! documents and replaces each finding with a type placeholder such as
//! `<EMAIL_ADDRESS>`.
//!
//! ## Overview
//!
//! Every piece of input is flattened into segments and each segment runs
//! through the same pipeline:
//!
//! - **Normalize** CSV cells, JSON records and paged text into segments
//! - **Recognize** candidates with a builtin recognizer (pattern library or
//!   an external analyzer service) plus caller-defined whitelist and regex rules
//! - **Merge** overlapping candidates into one non-overlapping set
//! - **Anonymize** right to left so offsets stay valid, keeping an audit record
//!   of every replaced span
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`anonymization`] - Normalizer, recognizers, merger, anonymizer, engine
//! - [`adapters`] - External integrations (analyzer service, file loaders)
//! - [`domain`] - Error types and entity labels
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pii_guard::anonymization::{AnonymizationConfig, AnonymizationEngine, SegmentNormalizer, Table};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = AnonymizationEngine::with_default_patterns(AnonymizationConfig::default())?;
//!
//!     let mut session = engine.session();
//!     session.register_whitelist_rule("SCHOOL_ID", ["223j1ao5g", "school123"], false)?;
//!
//!     let table = Table::new(
//!         vec!["raw".to_string()],
//!         vec![vec!["John,john.doe@company.com,223j1ao5g".to_string()]],
//!     );
//!     let segments = SegmentNormalizer.normalize_table(&table);
//!
//!     let results = session.process(segments).await?;
//!     assert_eq!(results[0].text, "John,<EMAIL_ADDRESS>,<SCHOOL_ID>");
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::PiiGuardError`]. Within a run, a
//! recognizer timing out or failing only makes that segment partial (see
//! [`anonymization::AnonymizedResult::warnings`]); an invariant violation
//! fails that segment alone.
//!
//! ## Logging
//!
//! pii-guard uses structured logging with the `tracing` crate. Log fields
//! carry entity types, offsets and counts, never matched text:
//!
//! ```rust,no_run
//! tracing::info!(segments = 12, findings = 3, "Scan complete");
//! ```

pub mod adapters;
pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
