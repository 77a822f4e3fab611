//! Identifier resolution across providers.

use serde::Serialize;

use crate::models::{classify, IdType, Record};
use crate::sources::{SourceError, SourceRegistry};

/// Outcome of [`Resolver::resolve`]. Serialized untagged, so a single record
/// appears with its fields at the top level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolution {
    /// DOI found on CrossRef and on Semantic Scholar
    Merged {
        source: String,
        crossref: Record,
        semantic_scholar: Record,
    },
    Single(Record),
    Failed {
        error: String,
        identifier: String,
        id_type: String,
    },
}

impl Resolution {
    pub fn is_error(&self) -> bool {
        matches!(self, Resolution::Failed { .. })
    }
}

/// Routes an identifier to the provider that owns it
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: SourceRegistry,
}

impl Resolver {
    pub fn new(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `identifier`, classifying it when `id_type` is not given.
    ///
    /// Never fails: any error, including an unknown `id_type`, comes back as
    /// [`Resolution::Failed`].
    pub async fn resolve(&self, identifier: &str, id_type: Option<&str>) -> Resolution {
        let identifier = identifier.trim();

        let kind = match id_type {
            Some(raw) => match raw.parse::<IdType>() {
                Ok(kind) => kind,
                Err(e) => {
                    return Resolution::Failed {
                        error: e.to_string(),
                        identifier: identifier.to_string(),
                        id_type: raw.to_string(),
                    }
                }
            },
            None => classify(identifier),
        };

        match self.resolve_as(identifier, kind).await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::debug!(identifier, id_type = %kind, error = %e, "resolution failed");
                Resolution::Failed {
                    error: e.to_string(),
                    identifier: identifier.to_string(),
                    id_type: kind.to_string(),
                }
            }
        }
    }

    /// Dispatch an identifier of a known kind, propagating errors
    pub async fn resolve_as(&self, identifier: &str, kind: IdType) -> Result<Resolution, SourceError> {
        match kind {
            IdType::Doi => self.resolve_doi(identifier).await,
            IdType::Pmid => self.lookup("pubmed", identifier).await,
            IdType::Arxiv => self.lookup("arxiv", identifier).await,
            IdType::ProviderNative => self.lookup("semantic_scholar", identifier).await,
        }
    }

    async fn lookup(&self, source_id: &str, identifier: &str) -> Result<Resolution, SourceError> {
        let source = self.registry.get_required(source_id)?;
        if !source.supports_id_lookup() {
            return Err(SourceError::NotImplemented);
        }
        Ok(Resolution::Single(source.get_by_id(identifier).await?))
    }

    /// CrossRef is authoritative; Semantic Scholar is a soft-fail join: when it
    /// cannot provide the DOI the CrossRef record is returned on its own.
    async fn resolve_doi(&self, doi: &str) -> Result<Resolution, SourceError> {
        let primary = self.registry.get_required("crossref")?;
        if !primary.supports_doi_lookup() {
            return Err(SourceError::NotImplemented);
        }
        let crossref = primary.get_by_doi(doi).await?;

        let secondary = match self.registry.get_required("semantic_scholar") {
            Ok(source) if source.supports_doi_lookup() => source.get_by_doi(doi).await,
            Ok(_) => Err(SourceError::NotImplemented),
            Err(e) => Err(e),
        };

        match secondary {
            Ok(semantic_scholar) => Ok(Resolution::Merged {
                source: "crossref+semantic_scholar".to_string(),
                crossref,
                semantic_scholar,
            }),
            Err(e) => {
                tracing::debug!(doi, error = %e, "Semantic Scholar join skipped");
                Ok(Resolution::Single(crossref))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::sources::mock::make_record;
    use crate::sources::MockSource;
    use std::sync::Arc;

    const DOI: &str = "10.1038/s41586-020-2649-2";

    fn crossref() -> MockSource {
        MockSource::new("crossref").with_doi(DOI, make_record(SourceType::CrossRef, DOI, "NumPy"))
    }

    fn semantic() -> MockSource {
        MockSource::new("semantic_scholar")
            .with_doi(DOI, make_record(SourceType::SemanticScholar, "s2id", "NumPy (S2)"))
            .with_id("s2id", make_record(SourceType::SemanticScholar, "s2id", "By id"))
    }

    fn resolver(sources: Vec<MockSource>) -> Resolver {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(Arc::new(source));
        }
        Resolver::new(registry)
    }

    #[tokio::test]
    async fn test_doi_merges_both_providers() {
        let resolution = resolver(vec![crossref(), semantic()]).resolve(DOI, None).await;

        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["source"], "crossref+semantic_scholar");
        assert_eq!(json["crossref"]["title"], "NumPy");
        assert_eq!(json["semantic_scholar"]["title"], "NumPy (S2)");
    }

    #[tokio::test]
    async fn test_doi_secondary_failure_falls_back_to_crossref() {
        let failing = semantic().failing("Semantic Scholar API returned status: 429 Too Many Requests");
        let resolution = resolver(vec![crossref(), failing]).resolve(DOI, None).await;

        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["source"], "crossref");
        assert_eq!(json["title"], "NumPy");
        assert!(json.get("semantic_scholar").is_none());
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_doi_primary_failure_is_structured() {
        let resolution = resolver(vec![MockSource::new("crossref"), semantic()])
            .resolve("10.1000/unknown", None)
            .await;

        match resolution {
            Resolution::Failed { error, identifier, id_type } => {
                assert!(error.contains("10.1000/unknown"));
                assert_eq!(identifier, "10.1000/unknown");
                assert_eq!(id_type, "doi");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pmid_not_found() {
        let pubmed = MockSource::new("pubmed");
        let resolution = resolver(vec![pubmed]).resolve("34535245", None).await;

        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["id_type"], "pmid");
        assert_eq!(json["identifier"], "34535245");
        assert!(json["error"].as_str().unwrap().starts_with("Not found"));
    }

    #[tokio::test]
    async fn test_arxiv_and_native_routing() {
        let arxiv = MockSource::new("arxiv")
            .with_id("2301.12345", make_record(SourceType::Arxiv, "2301.12345v1", "Paper"));
        let resolver = resolver(vec![arxiv, semantic()]);

        match resolver.resolve(" 2301.12345 ", None).await {
            Resolution::Single(record) => assert_eq!(record.source, SourceType::Arxiv),
            other => panic!("expected arXiv record, got {:?}", other),
        }
        match resolver.resolve("s2id", None).await {
            Resolution::Single(record) => assert_eq!(record.title, "By id"),
            other => panic!("expected S2 record, got {:?}", other),
        }
        assert!(resolver.resolve("0000.00000", None).await.is_error());
    }

    #[tokio::test]
    async fn test_explicit_id_type_overrides_classifier() {
        let resolver = resolver(vec![semantic()]);
        // looks like a PMID, but the caller says it is an S2 id
        let resolution = resolver.resolve("1234567", Some("s2")).await;
        assert_eq!(serde_json::to_value(&resolution).unwrap()["id_type"], "provider-native");

        let resolution = resolver.resolve("s2id", Some("provider-native")).await;
        assert!(!resolution.is_error());
    }

    #[tokio::test]
    async fn test_unknown_id_type() {
        let resolution = resolver(vec![]).resolve("abc", Some("isbn")).await;
        match resolution {
            Resolution::Failed { error, id_type, .. } => {
                assert!(error.contains("isbn"));
                assert_eq!(id_type, "isbn");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookups_respect_capabilities() {
        use crate::sources::SourceCapabilities;

        let search_only = Arc::new(
            MockSource::new("semantic_scholar")
                .with_doi(DOI, make_record(SourceType::SemanticScholar, "s2id", "NumPy (S2)"))
                .with_capabilities(SourceCapabilities::SEARCH),
        );
        let registry = SourceRegistry::new()
            .with(Arc::new(crossref()))
            .with(search_only.clone());
        let resolver = Resolver::new(registry);

        // the join is skipped without a request
        match resolver.resolve(DOI, None).await {
            Resolution::Single(record) => assert_eq!(record.title, "NumPy"),
            other => panic!("expected CrossRef record, got {:?}", other),
        }
        assert!(resolver.resolve("s2id", None).await.is_error());
        assert_eq!(search_only.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_provider_is_structured() {
        let resolution = resolver(vec![]).resolve("34535245", None).await;
        assert!(resolution.is_error());
    }
}
