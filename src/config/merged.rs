//! The final, read-only configuration snapshot.

use super::diagnostics::Diagnostic;
use super::value::{ConfigValue, Mapping};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// One merged configuration.
///
/// Immutable once built: consumers get shared references only.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    values: Mapping,
    sources: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl MergedConfig {
    pub(crate) fn new(values: Mapping, sources: Vec<PathBuf>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            values,
            sources,
            diagnostics,
        }
    }

    /// Top-level value for `key`.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Value at a dotted path, e.g. `"logging.log_level"`.
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.values.get(head)?;
        match rest {
            Some(rest) => value.get_path(rest),
            None => Some(value),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// All top-level entries, in merge order.
    pub fn values(&self) -> &Mapping {
        &self.values
    }

    /// Contributing documents, lowest precedence first; the primary is last.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// The primary document's path.
    pub fn primary_source(&self) -> Option<&Path> {
        self.sources.last().map(|p| p.as_path())
    }

    /// Non-fatal conditions recorded while resolving.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Set a reserved key, returning the value it replaced.
    pub(crate) fn insert_reserved(&mut self, key: &str, value: ConfigValue) -> Option<ConfigValue> {
        self.values.insert(key.to_string(), value)
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl Serialize for MergedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
