//! Secure handling of the analyzer API key
//!
//! Credentials are wrapped in [`secrecy::Secret`], which zeroizes memory on
//! drop and redacts `Debug` output. Reading the value requires an explicit
//! `expose_secret()` call at the point of use (the HTTP request header).
//!
//! Secrets deserialize from plain strings but are never serialized.
//!
//! ```rust
//! use pii_guard::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let key = secret_string("analyzer-key".to_string());
//! assert_eq!(key.expose_secret().as_ref(), "analyzer-key");
//! assert!(!format!("{key:?}").contains("analyzer-key"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret};
use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

/// String newtype that can live inside a [`Secret`]
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    /// Whether the value is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// Secret string used for credentials
pub type SecretString = Secret<SecretValue>;

/// Wrap a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
