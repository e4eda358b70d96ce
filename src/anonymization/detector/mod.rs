//! PII detection module
//!
//! Provides the recognizer capability interface and its implementations:
//!
//! - [`regex::PatternRecognizer`] — builtin recognizer backed by a TOML pattern library
//! - [`rules::RuleSet`] — caller-defined whitelist/regex rules (a frozen [`rules::RuleRegistry`])
//! - [`crate::adapters::analyzer::HttpAnalyzer`] — external NLP analyzer service
//! - [`set::RecognizerSet`] — fans one segment out to all of the above

pub mod patterns;
pub mod regex;
pub mod rules;
pub mod set;

use crate::anonymization::models::Finding;
use crate::domain::Result;
use async_trait::async_trait;

/// Capability shared by every recognizer: given text, return candidate findings
///
/// Implementations must be independent of each other; the merger reconciles
/// whatever they return. Offsets are byte offsets into `text`.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Short name used in logs and warnings
    fn name(&self) -> &str;

    /// Detect candidate findings in `text`
    async fn analyze(&self, text: &str) -> Result<Vec<Finding>>;

    /// Release resources held by a long-lived recognizer
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
