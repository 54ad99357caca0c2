//! End-to-end resolution: include graph, merge, validation, context.

use super::context::{RuntimeContext, inject_context};
use super::graph::ConfigGraph;
use super::loader::DocumentLoader;
use super::merge::merge_documents;
use super::merged::MergedConfig;
use super::value::Mapping;
use crate::error::Result;
use crate::logging::LoggingSettings;
use crate::secrets::{Cipher, Decryptor, FileKeyStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Resolves a primary document into a [`MergedConfig`].
pub struct ConfigResolver<'a> {
    decryptor: &'a dyn Decryptor,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(decryptor: &'a dyn Decryptor) -> Self {
        Self { decryptor }
    }

    /// Load the include graph and merge it. No validation, no runtime context.
    pub fn load_tree(&self, primary_path: &Path) -> Result<MergedConfig> {
        let loader = DocumentLoader::new(self.decryptor);
        let graph = ConfigGraph::resolve(primary_path, &loader)?;
        debug!(
            primary = %graph.primary().path().display(),
            documents = graph.document_count(),
            "Resolved include graph"
        );

        let outcome = merge_documents(graph.primary(), graph.included())?;

        let sources: Vec<PathBuf> = graph
            .visit_order()
            .into_iter()
            .chain(std::iter::once(graph.primary().path()))
            .map(Path::to_path_buf)
            .collect();

        Ok(MergedConfig::new(outcome.values, sources, outcome.diagnostics))
    }

    /// Full resolution: merge, validate the `logging` section, inject runtime context.
    pub fn resolve(&self, primary_path: &Path, args: Mapping) -> Result<MergedConfig> {
        let merged = self.load_tree(primary_path)?;
        LoggingSettings::from_config(&merged)?;

        let config = inject_context(merged, &RuntimeContext::capture(args));
        info!(
            keys = config.values().len(),
            sources = config.sources().len(),
            diagnostics = config.diagnostics().len(),
            "Configuration resolved"
        );
        Ok(config)
    }
}

/// Resolve with the default key store (`CONFIG_GRAPH_KEY_FILE` or the user config dir).
pub fn resolve(primary_path: &Path, args: Mapping) -> Result<MergedConfig> {
    let cipher = Cipher::new(FileKeyStore::discover());
    ConfigResolver::new(&cipher).resolve(primary_path, args)
}
