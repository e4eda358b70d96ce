//! Domain types for pii-guard.
//!
//! The domain layer provides:
//! - **Entity labels** ([`EntityType`]) — free-form, validated newtype
//! - **Error types** ([`PiiGuardError`], [`AnalyzerError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, PiiGuardError>`]:
//!
//! ```rust
//! use pii_guard::domain::{EntityType, PiiGuardError, Result};
//!
//! fn label(raw: &str) -> Result<EntityType> {
//!     EntityType::new(raw).map_err(PiiGuardError::InvalidRule)
//! }
//! assert!(label("SCHOOL_ID").is_ok());
//! ```

pub mod entity;
pub mod errors;
pub mod result;

pub use entity::EntityType;
pub use errors::{AnalyzerError, PiiGuardError};
pub use result::Result;
