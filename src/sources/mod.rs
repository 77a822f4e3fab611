//! Provider adapters behind a common trait.
//!
//! The four bibliographic providers implement [`Source`] and are collected in a
//! [`SourceRegistry`], which is what the resolver and the fan-out dispatch
//! through. Reddit returns discussion threads rather than papers, so
//! [`RedditSource`] stands on its own and is only reachable through its own
//! tools.
//!
//! Provider-specific operations that have no place in the shared trait
//! (PubMed summaries, Semantic Scholar citation graphs, CrossRef journal
//! listings) are inherent methods on the concrete adapters.

mod arxiv;
mod crossref;
pub mod mock;
mod pubmed;
mod reddit;
mod registry;
mod semantic;

pub use arxiv::ArxivSource;
pub use crossref::CrossRefSource;
pub use mock::MockSource;
pub use pubmed::{FetchFormat, PubMedSearchResult, PubMedSource, PubMedSummary};
pub use reddit::{RedditComments, RedditSource};
pub use registry::{SourceCapabilities, SourceRegistry};
pub use semantic::SemanticScholarSource;

use crate::models::{Record, SearchQuery};
use async_trait::async_trait;

/// Interface shared by the bibliographic providers.
///
/// Only `id`, `name` and `search` are required; lookups default to
/// [`SourceError::NotImplemented`].
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier, also the key used by the fan-out ("pubmed", "arxiv", ...)
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Whether this source supports lookup by DOI
    fn supports_doi_lookup(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::DOI_LOOKUP)
    }

    /// Whether this source supports lookup by its own identifier
    fn supports_id_lookup(&self) -> bool {
        self.capabilities().contains(SourceCapabilities::ID_LOOKUP)
    }

    /// Search for records matching the query
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError>;

    /// Get a record by its DOI
    async fn get_by_doi(&self, _doi: &str) -> Result<Record, SourceError> {
        Err(SourceError::NotImplemented)
    }

    /// Get a record by its provider identifier (PMID, arXiv id, S2 paper id)
    async fn get_by_id(&self, _id: &str) -> Result<Record, SourceError> {
        Err(SourceError::NotImplemented)
    }
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,

    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed or unexpected response body
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Identifier not found (HTTP 404 or an empty lookup)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success status from the provider
    #[error("API error: {0}")]
    Api(String),

    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The source could not be constructed from the configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_capabilities() {
        let caps = SourceCapabilities::SEARCH | SourceCapabilities::DOI_LOOKUP;

        assert!(caps.contains(SourceCapabilities::SEARCH));
        assert!(caps.contains(SourceCapabilities::DOI_LOOKUP));
        assert!(!caps.contains(SourceCapabilities::CITATIONS));
    }

    #[test]
    fn test_error_messages() {
        let err = SourceError::Api("CrossRef API returned status: 500".to_string());
        assert_eq!(err.to_string(), "API error: CrossRef API returned status: 500");

        let err: SourceError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
