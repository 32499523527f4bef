//! Registry for all boundary data sources.

use crate::aggregator::LoadStrategy;
use crate::model::{SourceId, SourceMeta};
use crate::ports::LoadError;

/// A selectable data source: its metadata and how to load it.
#[derive(Debug, Clone)]
pub struct SourcePlugin {
    /// Static metadata describing the source.
    pub meta: SourceMeta,
    /// Strategy the aggregator runs for this source.
    pub strategy: LoadStrategy,
}

/// Registry that resolves plugins by source identifier.
///
/// Registration order is kept so frontends list sources predictably.
pub struct SourceRegistry {
    plugins: Vec<SourcePlugin>,
}

impl SourceRegistry {
    /// Build a registry from the provided plugin list.
    ///
    /// A later plugin with an already registered id replaces the earlier one.
    #[must_use]
    pub fn new(plugins: Vec<SourcePlugin>) -> Self {
        let mut registered: Vec<SourcePlugin> = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            match registered
                .iter_mut()
                .find(|existing| existing.meta.id == plugin.meta.id)
            {
                Some(existing) => *existing = plugin,
                None => registered.push(plugin),
            }
        }
        Self {
            plugins: registered,
        }
    }

    /// Return metadata for all registered sources.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceMeta> {
        self.plugins
            .iter()
            .map(|plugin| plugin.meta.clone())
            .collect()
    }

    /// Look up a plugin for the given source.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnsupportedSource`] when no plugin is registered.
    pub fn plugin(&self, source: &SourceId) -> Result<&SourcePlugin, LoadError> {
        self.plugins
            .iter()
            .find(|plugin| &plugin.meta.id == source)
            .ok_or_else(|| LoadError::UnsupportedSource(source.clone()))
    }
}
