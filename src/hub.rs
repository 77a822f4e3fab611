//! Wiring of every adapter and the aggregation components.

use std::sync::Arc;

use crate::aggregate::{Fanout, Resolver};
use crate::config::Config;
use crate::sources::{
    ArxivSource, CrossRefSource, PubMedSource, RedditSource, SemanticScholarSource, SourceError,
    SourceRegistry,
};

/// Every provider adapter built from one [`Config`].
///
/// The adapters are shared: the registry used by the resolver and the fan-out
/// holds the same instances, so the Semantic Scholar rate limiter is one gate
/// for every path into that provider.
#[derive(Debug, Clone)]
pub struct ResearchHub {
    pub pubmed: Arc<PubMedSource>,
    pub semantic: Arc<SemanticScholarSource>,
    pub arxiv: Arc<ArxivSource>,
    pub crossref: Arc<CrossRefSource>,
    pub reddit: Arc<RedditSource>,
    registry: SourceRegistry,
}

impl ResearchHub {
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let pubmed = Arc::new(PubMedSource::new(config)?);
        let semantic = Arc::new(SemanticScholarSource::new(config)?);
        let arxiv = Arc::new(ArxivSource::new(config)?);
        let crossref = Arc::new(CrossRefSource::new(config)?);
        let reddit = Arc::new(RedditSource::new(config)?);

        let registry = SourceRegistry::new()
            .with(pubmed.clone())
            .with(semantic.clone())
            .with(arxiv.clone())
            .with(crossref.clone());

        tracing::debug!(sources = ?registry.ids(), "research hub initialized");

        Ok(Self {
            pubmed,
            semantic,
            arxiv,
            crossref,
            reddit,
            registry,
        })
    }

    /// The bibliographic sources, keyed by id
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(self.registry.clone())
    }

    pub fn fanout(&self) -> Fanout {
        Fanout::new(self.registry.clone())
    }
}
