//! Same query against several providers, with failures isolated per provider.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{Record, SearchQuery};
use crate::sources::{Source, SourceRegistry};

/// Providers queried when the caller names none. Reddit is only reachable
/// through its own tools.
pub const DEFAULT_DATABASES: [&str; 4] = ["pubmed", "semantic_scholar", "arxiv", "crossref"];

/// Per-provider outcome of a fan-out.
///
/// Serializes as a flat map: `<name>` for a record list, `<name>_error` for
/// the error message. Each requested provider has exactly one of the two.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanoutResult {
    entries: BTreeMap<String, Result<Vec<Record>, String>>,
}

impl FanoutResult {
    pub fn get(&self, database: &str) -> Option<&Result<Vec<Record>, String>> {
        self.entries.get(database)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<Vec<Record>, String>)> {
        self.entries.iter().map(|(name, result)| (name.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the providers that failed
    pub fn failed(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, result)| result.is_err())
            .map(|(name, _)| name)
            .collect()
    }
}

impl Serialize for FanoutResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, result) in &self.entries {
            match result {
                Ok(records) => map.serialize_entry(name, records)?,
                Err(message) => map.serialize_entry(&format!("{}_error", name), message)?,
            }
        }
        map.end()
    }
}

/// Runs one search against many providers concurrently
#[derive(Debug, Clone)]
pub struct Fanout {
    registry: SourceRegistry,
}

impl Fanout {
    pub fn new(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    /// Search `databases` (or [`DEFAULT_DATABASES`]) for `query`, at most
    /// `max_per_db` records each. Repeated names are queried once and names
    /// with no registered provider come back as errors.
    pub async fn search(
        &self,
        query: &str,
        databases: Option<&[String]>,
        max_per_db: usize,
    ) -> FanoutResult {
        let mut names: Vec<String> = match databases {
            Some(requested) if !requested.is_empty() => {
                requested.iter().map(|name| name.trim().to_string()).collect()
            }
            _ => DEFAULT_DATABASES.iter().map(|name| name.to_string()).collect(),
        };
        let mut seen = std::collections::HashSet::new();
        names.retain(|name| seen.insert(name.clone()));

        let search = SearchQuery::new(query).max_results(max_per_db);
        tracing::debug!(query, databases = ?names, "fan-out search");

        let outcomes = join_all(names.into_iter().map(|name| {
            let source = self.registry.get(&name).cloned();
            let search = &search;
            async move {
                let outcome = match source {
                    Some(source) => Self::run(source, search).await,
                    None => Err(format!("Unknown database: {}", name)),
                };
                (name, outcome)
            }
        }))
        .await;

        FanoutResult {
            entries: outcomes.into_iter().collect(),
        }
    }

    async fn run(source: Arc<dyn Source>, query: &SearchQuery) -> Result<Vec<Record>, String> {
        source.search(query).await.map_err(|e| {
            tracing::debug!(database = source.id(), error = %e, "fan-out provider failed");
            e.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceType;
    use crate::sources::mock::make_record;
    use crate::sources::MockSource;

    fn registry(failing: Option<&str>) -> (SourceRegistry, Vec<Arc<MockSource>>) {
        let kinds = [
            ("pubmed", SourceType::PubMed),
            ("semantic_scholar", SourceType::SemanticScholar),
            ("arxiv", SourceType::Arxiv),
            ("crossref", SourceType::CrossRef),
        ];
        let mut registry = SourceRegistry::new();
        let mut mocks = Vec::new();
        for (id, kind) in kinds {
            let mut mock = MockSource::new(id).with_results(vec![
                make_record(kind, "1", "First"),
                make_record(kind, "2", "Second"),
            ]);
            if failing == Some(id) {
                mock = mock.failing("Semantic Scholar API returned status: 500 Internal Server Error");
            }
            let mock = Arc::new(mock);
            registry.register(mock.clone());
            mocks.push(mock);
        }
        (registry, mocks)
    }

    #[tokio::test]
    async fn test_one_provider_failing_leaves_the_rest() {
        let (registry, mocks) = registry(Some("semantic_scholar"));
        let result = Fanout::new(registry).search("crispr", None, 10).await;

        assert_eq!(result.len(), 4);
        assert_eq!(result.failed(), vec!["semantic_scholar"]);
        assert!(mocks.iter().all(|m| m.calls() == 1));

        let json = serde_json::to_value(&result).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 4);
        for name in ["pubmed", "arxiv", "crossref"] {
            assert_eq!(object[name].as_array().unwrap().len(), 2);
            assert!(!object.contains_key(&format!("{}_error", name)));
        }
        assert!(!object.contains_key("semantic_scholar"));
        assert!(object["semantic_scholar_error"]
            .as_str()
            .unwrap()
            .contains("500"));
    }

    #[tokio::test]
    async fn test_limit_and_selection() {
        let (registry, mocks) = registry(None);
        let databases = vec!["arxiv".to_string(), "arxiv".to_string(), "crossref".to_string()];
        let result = Fanout::new(registry).search("q", Some(&databases), 1).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("arxiv").unwrap().as_ref().unwrap().len(), 1);
        assert!(result.get("pubmed").is_none());
        // arxiv is the third registered mock
        assert_eq!(mocks[2].calls(), 1);
        assert_eq!(mocks[0].calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_results_are_not_errors() {
        let registry = SourceRegistry::new().with(Arc::new(MockSource::new("pubmed")));
        let databases = vec!["pubmed".to_string()];
        let result = Fanout::new(registry).search("nothing", Some(&databases), 10).await;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({"pubmed": []}));
    }

    #[tokio::test]
    async fn test_unknown_database() {
        let (registry, _) = registry(None);
        let databases = vec!["reddit".to_string(), "pubmed".to_string()];
        let result = Fanout::new(registry).search("q", Some(&databases), 10).await;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["reddit_error"], "Unknown database: reddit");
        assert!(json["pubmed"].is_array());
    }
}
