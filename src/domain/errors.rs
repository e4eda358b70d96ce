//! Domain error types
//!
//! This module defines the error hierarchy for pii-guard. Errors are grouped by
//! how far they propagate:
//!
//! - Registration errors ([`PiiGuardError::InvalidRule`]) are reported to the
//!   caller immediately and no run is started.
//! - Recognizer errors ([`PiiGuardError::RecognizerTimeout`],
//!   [`PiiGuardError::Analyzer`]) are recovered per segment as partial results.
//! - [`PiiGuardError::InvariantViolation`] is fatal for one segment only.
//!
//! There is no "unsupported entity" error: entity types are free-form labels.

use thiserror::Error;

/// Main pii-guard error type
#[derive(Debug, Error)]
pub enum PiiGuardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed custom rule at registration time
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// A recognizer did not answer within the per-segment timeout
    #[error("Recognizer '{recognizer}' timed out after {timeout_ms}ms")]
    RecognizerTimeout {
        /// Name of the recognizer that timed out
        recognizer: String,
        /// Timeout that elapsed, in milliseconds
        timeout_ms: u64,
    },

    /// External analyzer failures
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),

    /// Overlapping or out-of-bounds findings reached the anonymizer
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A finding could not be constructed (bad span or score)
    #[error("Invalid finding: {0}")]
    InvalidFinding(String),

    /// Input loading errors
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Report or artifact export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl PiiGuardError {
    /// Whether the error only degrades a segment to a partial result
    ///
    /// Recognizer timeouts and analyzer failures leave the segment with zero
    /// findings from the failing recognizer; everything else is fatal for the
    /// segment (or the whole operation, outside of a run).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RecognizerTimeout { .. } | Self::Analyzer(_))
    }
}

/// External analyzer errors
///
/// Errors that occur when talking to an NLP analyzer service.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Failed to connect to the analyzer service
    #[error("Failed to connect to analyzer: {0}")]
    ConnectionFailed(String),

    /// Response could not be decoded
    #[error("Invalid response from analyzer: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Transport-level timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl From<std::io::Error> for PiiGuardError {
    fn from(err: std::io::Error) -> Self {
        PiiGuardError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PiiGuardError {
    fn from(err: serde_json::Error) -> Self {
        PiiGuardError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PiiGuardError {
    fn from(err: toml::de::Error) -> Self {
        PiiGuardError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for PiiGuardError {
    fn from(err: csv::Error) -> Self {
        PiiGuardError::Ingest(format!("CSV error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PiiGuardError::InvalidRule("entity type cannot be blank".to_string());
        assert_eq!(err.to_string(), "Invalid rule: entity type cannot be blank");

        let err = PiiGuardError::RecognizerTimeout {
            recognizer: "patterns".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "Recognizer 'patterns' timed out after 250ms"
        );
    }

    #[test]
    fn test_analyzer_error_conversion() {
        let err: PiiGuardError = AnalyzerError::ConnectionFailed("refused".to_string()).into();
        assert!(matches!(err, PiiGuardError::Analyzer(_)));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(PiiGuardError::RecognizerTimeout {
            recognizer: "x".to_string(),
            timeout_ms: 1
        }
        .is_recoverable());
        assert!(PiiGuardError::Analyzer(AnalyzerError::Timeout("slow".to_string())).is_recoverable());
        assert!(!PiiGuardError::InvariantViolation("overlap".to_string()).is_recoverable());
        assert!(!PiiGuardError::InvalidRule("bad".to_string()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: PiiGuardError = io_err.into();
        assert!(matches!(err, PiiGuardError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: PiiGuardError = toml_err.into();
        assert!(matches!(err, PiiGuardError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = PiiGuardError::Export("disk full".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
