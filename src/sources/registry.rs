//! Registry of the bibliographic sources.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Source, SourceError};

bitflags::bitflags! {
    /// Capabilities that a source can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const DOI_LOOKUP = 1 << 1;
        const ID_LOOKUP = 1 << 2;
        const CITATIONS = 1 << 3;
        const AUTHOR_SEARCH = 1 << 4;
    }
}

/// Registry for the available sources, keyed by [`Source::id`]
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any previous one with the same id
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.id().to_string(), source);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, source: Arc<dyn Source>) -> Self {
        self.register(source);
        self
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Source>> {
        self.sources.get(id)
    }

    /// Get a source by ID, returning an error if not found
    pub fn get_required(&self, id: &str) -> Result<&Arc<dyn Source>, SourceError> {
        self.get(id)
            .ok_or_else(|| SourceError::Config(format!("Source '{}' is not registered", id)))
    }

    /// Get all source IDs, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sources.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    #[test]
    fn test_registry_basic() {
        let registry = SourceRegistry::new()
            .with(Arc::new(MockSource::new("pubmed")))
            .with(Arc::new(MockSource::new("arxiv")));

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.ids(), vec!["arxiv", "pubmed"]);
    }

    #[test]
    fn test_get_source() {
        let registry = SourceRegistry::new().with(Arc::new(MockSource::new("crossref")));

        assert_eq!(registry.get("crossref").map(|s| s.id()), Some("crossref"));
        assert!(registry.get("nonexistent").is_none());
        assert!(matches!(
            registry.get_required("nonexistent"),
            Err(SourceError::Config(_))
        ));
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(MockSource::new("arxiv")));
        registry.register(Arc::new(MockSource::new("arxiv")));
        assert_eq!(registry.len(), 1);
    }
}
