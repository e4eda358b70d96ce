//! Result type alias for pii-guard

use super::errors::PiiGuardError;

/// Result type alias for pii-guard operations
///
/// # Examples
///
/// ```
/// use pii_guard::domain::result::Result;
/// use pii_guard::domain::errors::PiiGuardError;
///
/// fn failing_function() -> Result<()> {
///     Err(PiiGuardError::InvalidRule("empty whitelist".to_string()))
/// }
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, PiiGuardError>;
