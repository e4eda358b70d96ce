//! Entity type labels
//!
//! Entity types are free-form labels: the builtin recognizer emits well-known
//! names such as `EMAIL_ADDRESS`, and callers may register any custom label
//! (`SCHOOL_ID`, `EMPLOYEE_NUMBER`, ...). There is deliberately no closed enum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known labels emitted by the builtin recognizers
pub mod builtin {
    /// Person names
    pub const PERSON: &str = "PERSON";
    /// Email addresses
    pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
    /// Telephone numbers
    pub const PHONE_NUMBER: &str = "PHONE_NUMBER";
    /// US Social Security Numbers
    pub const US_SSN: &str = "US_SSN";
    /// Payment card numbers
    pub const CREDIT_CARD: &str = "CREDIT_CARD";
    /// IPv4 addresses
    pub const IP_ADDRESS: &str = "IP_ADDRESS";
    /// Web URLs
    pub const URL: &str = "URL";
    /// US passport numbers
    pub const US_PASSPORT: &str = "US_PASSPORT";
    /// International bank account numbers
    pub const IBAN_CODE: &str = "IBAN_CODE";
}

/// Entity type newtype wrapper
///
/// Wraps a non-blank label. Surrounding whitespace is trimmed on construction.
///
/// # Examples
///
/// ```
/// use pii_guard::domain::EntityType;
///
/// let entity = EntityType::new(" SCHOOL_ID ").unwrap();
/// assert_eq!(entity.as_str(), "SCHOOL_ID");
/// assert_eq!(entity.placeholder(), "<SCHOOL_ID>");
///
/// assert!(EntityType::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityType(String);

impl EntityType {
    /// Creates a new entity type, rejecting empty or blank labels
    pub fn new(label: impl Into<String>) -> Result<Self, String> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err("Entity type cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the label as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder token used when redacting a span of this type
    ///
    /// The label is upper-cased and everything except ASCII alphanumerics and
    /// `_` is stripped. A label that strips down to nothing becomes `<PII>`.
    pub fn placeholder(&self) -> String {
        let name: String = self
            .0
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if name.is_empty() {
            "<PII>".to_string()
        } else {
            format!("<{name}>")
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.0
    }
}

impl AsRef<str> for EntityType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
