//! Include graph traversal.
//!
//! Starting from the primary document, every transitively included document is
//! loaded exactly once, in first-discovery breadth-first order. That order is
//! the precedence tie-breaker for the merge.

use super::loader::{ConfigDocument, DocumentSource};
use crate::error::{ConfigError, Result};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The primary document plus everything reachable from it through includes.
#[derive(Debug)]
pub struct ConfigGraph {
    primary: ConfigDocument,
    included: Vec<ConfigDocument>,
    visited: HashSet<PathBuf>,
}

impl ConfigGraph {
    /// Load the primary document and traverse its includes.
    pub fn resolve(primary_path: &Path, source: &dyn DocumentSource) -> Result<Self> {
        let primary = source.load(primary_path)?;
        Self::from_primary(primary, source)
    }

    /// Traverse the includes of an already loaded primary document.
    ///
    /// References are consumed from the front of a FIFO queue and discoveries
    /// appended to the back. A reference whose canonical path was already
    /// visited (including the primary itself) is discarded, so cycles terminate.
    /// Documents are loaded through the reference as written, so a symlinked
    /// document resolves its own includes next to the link.
    /// Any load failure aborts the whole traversal.
    pub fn from_primary(primary: ConfigDocument, source: &dyn DocumentSource) -> Result<Self> {
        let mut visited = HashSet::new();
        visited.insert(primary.path().to_path_buf());

        let mut pending: VecDeque<PathBuf> = primary.includes().iter().cloned().collect();
        let mut included = Vec::new();

        while let Some(reference) = pending.pop_front() {
            let resolved = std::fs::canonicalize(&reference)
                .map_err(|_| ConfigError::not_found(&reference))?;
            if visited.contains(&resolved) {
                debug!(path = %resolved.display(), "Skipping already visited include");
                continue;
            }

            let document = source.load(&reference)?;
            debug!(
                path = %resolved.display(),
                includes = document.includes().len(),
                "Loaded included config"
            );
            pending.extend(document.includes().iter().cloned());
            visited.insert(resolved);
            included.push(document);
        }

        Ok(Self {
            primary,
            included,
            visited,
        })
    }

    pub fn primary(&self) -> &ConfigDocument {
        &self.primary
    }

    /// Included documents in visitation order.
    pub fn included(&self) -> &[ConfigDocument] {
        &self.included
    }

    /// Paths of included documents in visitation order.
    pub fn visit_order(&self) -> Vec<&Path> {
        self.included.iter().map(|doc| doc.path()).collect()
    }

    /// Whether a canonical path was loaded as part of this graph.
    pub fn contains(&self, path: &Path) -> bool {
        self.visited.contains(path)
    }

    /// Number of documents in the graph, primary included.
    pub fn document_count(&self) -> usize {
        self.included.len() + 1
    }
}
