//! Redaction-aware wrapper for decrypted values.

use serde::{Serialize, Serializer};
use std::fmt;

/// Marker rendered in place of any secret, independent of its length.
pub const REDACTION_MARKER: &str = "**********";

/// A decrypted scalar.
///
/// `Debug`, `Display` and `Serialize` all produce [`REDACTION_MARKER`].
/// The plaintext is only reachable through [`SecretValue::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    /// Borrow the plaintext for functional use (e.g. handing a password to a client).
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the plaintext.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTION_MARKER)
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTION_MARKER)
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTION_MARKER)
    }
}
