//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - human-readable or JSON console output on stderr
//! - optional JSON file logging with rotation
//! - level from CLI, environment or configuration (`RUST_LOG` wins)
//!
//! Log fields carry entity types, offsets, counts and origins. Matched text
//! is never logged.
//!
//! # Example
//!
//! ```no_run
//! use pii_guard::logging::init_logging;
//! use pii_guard::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(segments = 12, "Scan started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a scan run
///
/// # Example
///
/// ```no_run
/// use pii_guard::log_scan_start;
///
/// let run_id = uuid::Uuid::new_v4();
/// log_scan_start!(run_id, 42);
/// ```
#[macro_export]
macro_rules! log_scan_start {
    ($run_id:expr, $segments:expr) => {
        tracing::info!(
            run_id = %$run_id,
            segments = $segments,
            "Starting scan"
        );
    };
}

/// Log the completion of a scan run
///
/// # Example
///
/// ```no_run
/// use pii_guard::log_scan_complete;
/// use std::time::Duration;
///
/// let run_id = uuid::Uuid::new_v4();
/// log_scan_complete!(run_id, 40, 2, Duration::from_millis(120));
/// ```
#[macro_export]
macro_rules! log_scan_complete {
    ($run_id:expr, $completed:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            run_id = %$run_id,
            completed = $completed,
            failed = $failed,
            duration_ms = $duration.as_millis() as u64,
            "Scan complete"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use pii_guard::log_error_with_context;
/// use pii_guard::domain::PiiGuardError;
///
/// let error = PiiGuardError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use pii_guard::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
