//! Non-fatal conditions reported during resolution.
//!
//! Resolution runs before the configured logger exists, so each diagnostic is
//! emitted to whatever `tracing` subscriber is active at the time (the binary
//! scopes a stderr subscriber around resolution) and also collected for the
//! caller.

use std::fmt;
use std::path::PathBuf;
use tracing::warn;

/// A non-fatal resolution event.
///
/// Rendered values go through the redacted formatter and never contain plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A later included document replaced a key set by an earlier one.
    IncludeOverwrite {
        key: String,
        previous: PathBuf,
        source: PathBuf,
    },
    /// The primary document replaced a key set by an included document.
    PrimaryOverride {
        key: String,
        previous: PathBuf,
        previous_value: String,
    },
    /// An included document whose top level is not a mapping was skipped.
    SkippedNonMapping {
        index: usize,
        source: PathBuf,
        kind: &'static str,
    },
    /// The runtime context replaced a user-defined key of the same name.
    ContextOverwritten { key: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::IncludeOverwrite {
                key,
                previous,
                source,
            } => write!(
                f,
                "Key '{}' from {} overwritten by {}",
                key,
                previous.display(),
                source.display()
            ),
            Diagnostic::PrimaryOverride {
                key,
                previous,
                previous_value,
            } => write!(
                f,
                "Primary config overwriting key '{}' (previous value from {}: {})",
                key,
                previous.display(),
                previous_value
            ),
            Diagnostic::SkippedNonMapping {
                index,
                source,
                kind,
            } => write!(
                f,
                "Skipping non-mapping include at index {} ({}): {}",
                index,
                source.display(),
                kind
            ),
            Diagnostic::ContextOverwritten { key } => write!(
                f,
                "Reserved key '{}' defined in config was replaced by runtime context",
                key
            ),
        }
    }
}

/// Collects diagnostics, emitting each as a warning as it is recorded.
#[derive(Debug, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.0.push(diagnostic);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}
