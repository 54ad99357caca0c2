//! Document loading.
//!
//! Loading happens in two passes:
//! 1. [`parse_document`] reads and parses YAML, keeping tag annotations, and
//!    extracts the `includes` list. It never touches the key store.
//! 2. [`RawDocument::resolve`] runs the tag pass, decrypting `!encrypted` scalars.
//!
//! [`DocumentLoader`] runs both, so every [`ConfigDocument`] it produces already
//! holds secrets in place of ciphertext.

use super::value::{ConfigValue, Mapping};
use crate::error::{ConfigError, Result};
use crate::secrets::{Decryptor, contains_tags, resolve_tags};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reserved top-level key listing included documents.
pub const INCLUDES_KEY: &str = "includes";

/// A parsed document whose tags are not yet resolved.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Canonical path of the source file.
    pub path: PathBuf,
    /// Parsed tree, tags preserved.
    pub root: Value,
    /// Include references, resolved against this document's directory.
    pub includes: Vec<PathBuf>,
}

impl RawDocument {
    /// Run the tag pass, producing a fully resolved document.
    pub fn resolve(self, decryptor: &dyn Decryptor) -> Result<ConfigDocument> {
        if contains_tags(&self.root) {
            debug!(path = %self.path.display(), "Resolving tagged values");
        }
        let root = resolve_tags(self.root, &self.path, decryptor)?;
        Ok(ConfigDocument {
            path: self.path,
            root,
            includes: self.includes,
        })
    }
}

/// One loaded configuration source.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    root: ConfigValue,
    includes: Vec<PathBuf>,
}

impl ConfigDocument {
    /// Canonical path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The document's top-level value (normally a mapping).
    pub fn root(&self) -> &ConfigValue {
        &self.root
    }

    /// The top-level mapping, if the document is one.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        self.root.as_mapping()
    }

    /// Declared include references, in declaration order.
    pub fn includes(&self) -> &[PathBuf] {
        &self.includes
    }
}

/// Parse a document without resolving tags.
///
/// Any well-formed YAML loads, including a non-mapping top level (which has no
/// includes). An empty file parses as `null`.
pub fn parse_document(path: &Path) -> Result<RawDocument> {
    if !path.is_file() {
        return Err(ConfigError::not_found(path));
    }
    let canonical = std::fs::canonicalize(path).map_err(|_| ConfigError::not_found(path))?;

    let content = std::fs::read_to_string(&canonical)
        .map_err(|e| ConfigError::parse(&canonical, format!("failed to read: {}", e)))?;

    let root = if content.trim().is_empty() {
        Value::Null
    } else {
        serde_yaml::from_str::<Value>(&content)
            .map_err(|e| ConfigError::parse(&canonical, e.to_string()))?
    };

    // Includes follow the path as referenced, not a symlink's target.
    let includes = extract_includes(&root, path)?;
    debug!(path = %canonical.display(), includes = includes.len(), "Parsed config document");

    Ok(RawDocument {
        path: canonical,
        root,
        includes,
    })
}

/// Read the `includes` list of a parsed tree.
///
/// Missing or `null` yields an empty list. Entries are resolved relative to
/// the directory containing `doc_path`.
pub fn extract_includes(root: &Value, doc_path: &Path) -> Result<Vec<PathBuf>> {
    let Value::Mapping(map) = root else {
        return Ok(Vec::new());
    };

    let entries = match map.get(INCLUDES_KEY) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(entries)) => entries,
        Some(other) => {
            return Err(ConfigError::parse(
                doc_path,
                format!(
                    "'{}' must be a sequence of paths, got {}",
                    INCLUDES_KEY,
                    yaml_kind(other)
                ),
            ));
        }
    };

    let base_dir = doc_path.parent().unwrap_or_else(|| Path::new("."));
    entries
        .iter()
        .map(|entry| match entry {
            Value::String(s) => Ok(base_dir.join(s)),
            other => Err(ConfigError::parse(
                doc_path,
                format!(
                    "'{}' entries must be path strings, got {}",
                    INCLUDES_KEY,
                    yaml_kind(other)
                ),
            )),
        })
        .collect()
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Something that can produce a resolved document for a path.
pub trait DocumentSource {
    fn load(&self, path: &Path) -> Result<ConfigDocument>;
}

/// Loads documents from disk, decrypting tagged values.
pub struct DocumentLoader<'a> {
    decryptor: &'a dyn Decryptor,
}

impl<'a> DocumentLoader<'a> {
    pub fn new(decryptor: &'a dyn Decryptor) -> Self {
        Self { decryptor }
    }
}

impl DocumentSource for DocumentLoader<'_> {
    fn load(&self, path: &Path) -> Result<ConfigDocument> {
        parse_document(path)?.resolve(self.decryptor)
    }
}
