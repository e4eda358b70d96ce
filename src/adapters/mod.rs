//! External system integrations for pii-guard.
//!
//! - [`analyzer`] - client for an external NLP analyzer service
//! - [`ingest`] - CSV, JSON, text and paged-text loaders
//!
//! Adapters isolate third-party types (HTTP client, CSV reader) from the
//! anonymization core, which only sees [`Recognizer`](crate::anonymization::detector::Recognizer)
//! implementations and [`Table`](crate::anonymization::Table)s.

pub mod analyzer;
pub mod ingest;

pub use analyzer::HttpAnalyzer;
