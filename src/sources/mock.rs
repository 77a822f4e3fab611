//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::{Record, RecordBuilder, SearchQuery, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};

/// A mock source that returns predefined responses.
///
/// Search returns the configured records (truncated to `max_results`), lookups
/// return the record registered under the DOI or id, and a configured failure
/// turns every call into an `Api` error.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    capabilities: SourceCapabilities,
    search_results: Mutex<Vec<Record>>,
    by_doi: Mutex<HashMap<String, Record>>,
    by_id: Mutex<HashMap<String, Record>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockSource {
    /// Create a mock registered under `id`.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            capabilities: SourceCapabilities::SEARCH
                | SourceCapabilities::DOI_LOOKUP
                | SourceCapabilities::ID_LOOKUP,
            search_results: Mutex::new(Vec::new()),
            by_doi: Mutex::new(HashMap::new()),
            by_id: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_capabilities(mut self, capabilities: SourceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Records returned by `search`
    pub fn with_results(self, records: Vec<Record>) -> Self {
        self.set_search_response(records);
        self
    }

    /// Record returned by `get_by_doi(doi)`
    pub fn with_doi(self, doi: &str, record: Record) -> Self {
        lock(&self.by_doi).insert(doi.to_string(), record);
        self
    }

    /// Record returned by `get_by_id(id)`
    pub fn with_id(self, id: &str, record: Record) -> Self {
        lock(&self.by_id).insert(id.to_string(), record);
        self
    }

    /// Make every call fail with `SourceError::Api(message)`
    pub fn failing(self, message: &str) -> Self {
        self.set_failure(Some(message.to_string()));
        self
    }

    /// Set the search response to return.
    pub fn set_search_response(&self, records: Vec<Record>) {
        *lock(&self.search_results) = records;
    }

    pub fn set_failure(&self, message: Option<String>) {
        *lock(&self.failure) = message;
    }

    /// Number of calls made to this source
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.failure).as_ref() {
            Some(message) => Err(SourceError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        self.capabilities
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        self.record_call()?;
        let results = lock(&self.search_results);
        Ok(results.iter().take(query.max_results).cloned().collect())
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Record, SourceError> {
        self.record_call()?;
        lock(&self.by_doi)
            .get(doi)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("DOI {}", doi)))
    }

    async fn get_by_id(&self, id: &str) -> Result<Record, SourceError> {
        self.record_call()?;
        lock(&self.by_id)
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("ID {}", id)))
    }
}

/// Helper function to create a record for testing.
pub fn make_record(source: SourceType, native_id: &str, title: &str) -> Record {
    RecordBuilder::new(source, title)
        .native_id(native_id)
        .url(format!("http://example.com/{}", native_id))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_search_respects_limit() {
        let mock = MockSource::new("arxiv").with_results(vec![
            make_record(SourceType::Arxiv, "1", "One"),
            make_record(SourceType::Arxiv, "2", "Two"),
            make_record(SourceType::Arxiv, "3", "Three"),
        ]);

        let results = mock
            .search(&SearchQuery::new("anything").max_results(2))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "One");
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_and_lookup() {
        let mock = MockSource::new("crossref")
            .with_doi("10.1/x", make_record(SourceType::CrossRef, "10.1/x", "X"));

        assert_eq!(mock.get_by_doi("10.1/x").await.unwrap().title, "X");
        assert!(matches!(
            mock.get_by_doi("10.1/y").await,
            Err(SourceError::NotFound(_))
        ));

        mock.set_failure(Some("boom".to_string()));
        assert!(matches!(mock.get_by_doi("10.1/x").await, Err(SourceError::Api(m)) if m == "boom"));
        assert_eq!(mock.calls(), 3);
    }
}
