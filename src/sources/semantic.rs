//! Semantic Scholar research source implementation.
//!
//! Every request, whatever the endpoint, first passes through the shared
//! [`RateLimiter`] held by the source.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{Record, RecordBuilder, SearchQuery, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{HttpClient, RateLimiter};

const PROVIDER: &str = "Semantic Scholar";

/// Fields requested for search results and paper details
const PAPER_FIELDS: &str = "paperId,title,abstract,year,authors,venue,journal,citationCount,\
influentialCitationCount,openAccessPdf,externalIds,url,publicationDate,fieldsOfStudy";

const CITATION_FIELDS: &str = "paperId,title,year,authors,venue,citationCount,url";

const AUTHOR_FIELDS: &str = "authorId,name,affiliations,paperCount,citationCount,hIndex,url";

const AUTHOR_PAPER_FIELDS: &str = "paperId,title,year,venue,citationCount,url";

/// The Graph API caps `limit` at 100
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<i64>,
    authors: Option<Vec<S2Author>>,
    venue: Option<String>,
    journal: Option<S2Journal>,
    citation_count: Option<u64>,
    influential_citation_count: Option<u64>,
    open_access_pdf: Option<S2Pdf>,
    external_ids: Option<HashMap<String, Value>>,
    url: Option<String>,
    publication_date: Option<String>,
    fields_of_study: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Journal {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Pdf {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// Escape a caller-supplied id for use as a path segment. `:` and `/` stay
/// literal so `DOI:10.x/y` keeps the form the Graph API documents.
fn path_id(id: &str) -> String {
    urlencoding::encode(id)
        .replace("%3A", ":")
        .replace("%2F", "/")
}

fn external_id(ids: &HashMap<String, Value>, key: &str) -> String {
    match ids.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Semantic Scholar research source
///
/// Uses the Semantic Scholar Graph API, throttled to one call per configured
/// interval (1 request/second by default).
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl SemanticScholarSource {
    /// Create a Semantic Scholar source from the configuration
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let limiter = RateLimiter::new(config.rate_limits.semantic_scholar_interval());
        Ok(Self::with_client(
            HttpClient::new(&config.http)?,
            &config.endpoints.semantic_scholar,
            config.api_keys.semantic_scholar.clone(),
            Arc::new(limiter),
        ))
    }

    /// Create with a custom HTTP client, endpoint and rate limiter
    pub fn with_client(
        client: HttpClient,
        base_url: &str,
        api_key: Option<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            limiter,
        }
    }

    /// The limiter guarding every call of this source
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Throttle, then GET `path` with `params` and decode the JSON body
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, SourceError> {
        self.limiter.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "Semantic Scholar request");
        let mut request = self.client.get(&url).query(params);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        self.client.send_json(request, PROVIDER).await
    }

    /// Normalize a Graph API paper. The derived venue (`venue`, else the
    /// journal name) lands in the shared [`Record::venue`] field rather than
    /// a provider-specific `venue_info` key, so every source shares one shape.
    fn to_record(paper: S2Paper) -> Record {
        let authors = paper
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .collect();

        let venue = paper
            .venue
            .filter(|v| !v.is_empty())
            .or_else(|| paper.journal.and_then(|j| j.name))
            .unwrap_or_default();

        let ids = paper.external_ids.unwrap_or_default();
        let paper_id = paper.paper_id.unwrap_or_default();
        let url = paper
            .url
            .unwrap_or_else(|| format!("https://www.semanticscholar.org/paper/{}", paper_id));

        RecordBuilder::new(SourceType::SemanticScholar, paper.title.unwrap_or_default())
            .authors(authors)
            .year(paper.year.map(|y| y.to_string()).unwrap_or_default())
            .published_date(paper.publication_date.unwrap_or_default())
            .venue(venue)
            .abstract_text(paper.abstract_text.unwrap_or_default())
            .doi(external_id(&ids, "DOI"))
            .pmid(external_id(&ids, "PubMed"))
            .arxiv_id(external_id(&ids, "ArXiv"))
            .native_id(paper_id)
            .url(url)
            .pdf_url(paper.open_access_pdf.and_then(|p| p.url))
            .citation_metrics(
                paper.citation_count.unwrap_or(0),
                paper.influential_citation_count,
            )
            .keywords(paper.fields_of_study.unwrap_or_default())
            .build()
    }

    /// `semantic_scholar_search`. `min_citations` is applied to the returned
    /// page; a missing citation count counts as 0.
    pub async fn search_papers(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let mut params = vec![
            ("query", query.query.clone()),
            ("limit", query.max_results.min(MAX_LIMIT).to_string()),
            ("fields", PAPER_FIELDS.to_string()),
        ];
        if let Some(year) = &query.year {
            params.push(("year", year.clone()));
        }
        if !query.fields_of_study.is_empty() {
            params.push(("fieldsOfStudy", query.fields_of_study.join(",")));
        }

        let page: S2Page<S2Paper> = self.get("/paper/search", &params).await?;
        let min_citations = query.min_citations.unwrap_or(0);

        Ok(page
            .data
            .into_iter()
            .filter(|p| p.citation_count.unwrap_or(0) >= min_citations)
            .map(Self::to_record)
            .collect())
    }

    /// `semantic_scholar_paper_details`: any id the Graph API accepts
    /// (`paperId`, `DOI:...`, `ARXIV:...`, `PMID:...`, `CorpusId:...`)
    pub async fn paper_details(&self, paper_id: &str) -> Result<Record, SourceError> {
        let params = [("fields", PAPER_FIELDS.to_string())];
        let paper: S2Paper = self.get(&format!("/paper/{}", path_id(paper_id)), &params).await?;
        Ok(Self::to_record(paper))
    }

    async fn raw_list(
        &self,
        path: &str,
        fields: &str,
        limit: usize,
        extra: Option<(&'static str, String)>,
    ) -> Result<Vec<Value>, SourceError> {
        let mut params = vec![
            ("limit", limit.min(MAX_LIMIT).to_string()),
            ("fields", fields.to_string()),
        ];
        params.extend(extra);
        let page: S2Page<Value> = self.get(path, &params).await?;
        Ok(page.data)
    }

    /// Papers citing `paper_id`, as returned by the API (`{citingPaper: {...}}`)
    pub async fn citations(&self, paper_id: &str, limit: usize) -> Result<Vec<Value>, SourceError> {
        self.raw_list(&format!("/paper/{}/citations", path_id(paper_id)), CITATION_FIELDS, limit, None)
            .await
    }

    /// Papers referenced by `paper_id` (`{citedPaper: {...}}`)
    pub async fn references(&self, paper_id: &str, limit: usize) -> Result<Vec<Value>, SourceError> {
        self.raw_list(&format!("/paper/{}/references", path_id(paper_id)), CITATION_FIELDS, limit, None)
            .await
    }

    pub async fn author_search(&self, name: &str, limit: usize) -> Result<Vec<Value>, SourceError> {
        self.raw_list(
            "/author/search",
            AUTHOR_FIELDS,
            limit,
            Some(("query", name.to_string())),
        )
        .await
    }

    pub async fn author_papers(&self, author_id: &str, limit: usize) -> Result<Vec<Value>, SourceError> {
        self.raw_list(
            &format!("/author/{}/papers", path_id(author_id)),
            AUTHOR_PAPER_FIELDS,
            limit,
            None,
        )
        .await
    }
}

#[async_trait]
impl Source for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic_scholar"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::DOI_LOOKUP
            | SourceCapabilities::ID_LOOKUP
            | SourceCapabilities::CITATIONS
            | SourceCapabilities::AUTHOR_SEARCH
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        self.search_papers(query).await
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Record, SourceError> {
        self.paper_details(&format!("DOI:{}", doi)).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Record, SourceError> {
        self.paper_details(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::utils::ManualClock;
    use mockito::Matcher;
    use std::time::Duration;

    const PAPER_JSON: &str = r#"{
        "paperId": "649def34f8be52c8b66281af98ae884c09aef38b",
        "title": "Construction of the Literature Graph in Semantic Scholar",
        "abstract": "We describe a deployed scalable system.",
        "year": 2018,
        "authors": [
            {"authorId": "1", "name": "Waleed Ammar"},
            {"authorId": "2", "name": "Dirk Groeneveld"},
            {"authorId": "3", "name": "Chandra Bhagavatula"},
            {"authorId": "4", "name": "Iz Beltagy"}
        ],
        "venue": "",
        "journal": {"name": "NAACL"},
        "citationCount": 453,
        "influentialCitationCount": 41,
        "openAccessPdf": {"url": "https://www.aclweb.org/anthology/N18-3011.pdf", "status": "HYBRID"},
        "externalIds": {"DOI": "10.18653/V1/N18-3011", "ArXiv": "1805.02262", "CorpusId": 19170988},
        "url": "https://www.semanticscholar.org/paper/649def34f8be52c8b66281af98ae884c09aef38b",
        "publicationDate": "2018-05-01",
        "fieldsOfStudy": ["Computer Science"]
    }"#;

    fn source_for(server: &mockito::Server, clock: Arc<ManualClock>) -> SemanticScholarSource {
        SemanticScholarSource::with_client(
            HttpClient::new(&HttpConfig::default()).unwrap(),
            &server.url(),
            Some("test-key".to_string()),
            Arc::new(RateLimiter::with_clock(Duration::from_secs(1), clock)),
        )
    }

    #[test]
    fn test_to_record_enrichment() {
        let paper: S2Paper = serde_json::from_str(PAPER_JSON).unwrap();
        let record = SemanticScholarSource::to_record(paper);

        assert_eq!(record.source, SourceType::SemanticScholar);
        assert_eq!(record.identifiers.native_id, "649def34f8be52c8b66281af98ae884c09aef38b");
        assert_eq!(record.identifiers.doi, "10.18653/V1/N18-3011");
        assert_eq!(record.identifiers.arxiv, "1805.02262");
        assert_eq!(record.identifiers.pmid, "");
        // empty venue falls back to the journal name
        assert_eq!(record.venue, "NAACL");
        assert_eq!(record.year, "2018");
        assert_eq!(
            record.author_list,
            "Waleed Ammar, Dirk Groeneveld, Chandra Bhagavatula et al."
        );
        assert!(record.has_pdf);
        let metrics = record.citation_metrics.unwrap();
        assert_eq!(metrics.total, 453);
        assert_eq!(metrics.influential, Some(41));
        assert_eq!(record.keywords, vec!["Computer Science"]);
    }

    #[test]
    fn test_to_record_sparse() {
        let paper: S2Paper = serde_json::from_str(r#"{"paperId": "abc", "title": "T", "authors": null}"#).unwrap();
        let record = SemanticScholarSource::to_record(paper);
        assert!(record.authors.is_empty());
        assert_eq!(record.year, "");
        assert!(!record.has_pdf);
        assert_eq!(record.citation_metrics.unwrap().total, 0);
        assert_eq!(record.url, "https://www.semanticscholar.org/paper/abc");
    }

    #[tokio::test]
    async fn test_search_min_citations_and_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            r#"{{"total": 3, "offset": 0, "data": [{}, {{"paperId": "low", "title": "Low", "citationCount": 3}}, {{"paperId": "none", "title": "No count"}}]}}"#,
            PAPER_JSON
        );
        let mock = server
            .mock("GET", Matcher::Regex(r"^/paper/search".into()))
            .match_header("x-api-key", "test-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "literature graph".into()),
                Matcher::UrlEncoded("year".into(), "2015-2020".into()),
                Matcher::UrlEncoded("fieldsOfStudy".into(), "Computer Science,Medicine".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(2)
            .create_async()
            .await;

        let clock = Arc::new(ManualClock::new());
        let source = source_for(&server, clock.clone());
        let query = SearchQuery::new("literature graph")
            .max_results(20)
            .year("2015-2020")
            .min_citations(10)
            .fields_of_study(vec!["Computer Science".into(), "Medicine".into()]);

        let records = source.search(&query).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Construction of the Literature Graph in Semantic Scholar");

        // without the filter, missing counts are kept
        let unfiltered = SearchQuery { min_citations: None, ..query };
        assert_eq!(source.search(&unfiltered).await.unwrap().len(), 3);

        // the second call had to wait a full interval
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1)]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_doi_lookup_path() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/paper/DOI:10\.18653/V1/N18-3011".into()))
            .with_header("content-type", "application/json")
            .with_body(PAPER_JSON)
            .create_async()
            .await;

        let source = source_for(&server, Arc::new(ManualClock::new()));
        let record = source.get_by_doi("10.18653/V1/N18-3011").await.unwrap();
        assert_eq!(record.identifiers.doi, "10.18653/V1/N18-3011");
    }

    #[tokio::test]
    async fn test_ids_are_escaped_in_path() {
        let mut server = mockito::Server::new_async().await;
        let full = server
            .mock("GET", Matcher::Regex(r"^/paper/DOI:10\.1002/abc%231$".into()))
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(r#"{"paperId": "full", "title": "Full id"}"#)
            .create_async()
            .await;
        let query_like = server
            .mock("GET", Matcher::Regex(r"^/paper/ACL:P19-1%3Fx/references$".into()))
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let source = source_for(&server, Arc::new(ManualClock::new()));
        let record = source.get_by_doi("10.1002/abc#1").await.unwrap();
        assert_eq!(record.title, "Full id");
        assert!(source.references("ACL:P19-1?x", 5).await.unwrap().is_empty());

        full.assert_async().await;
        query_like.assert_async().await;
    }

    #[test]
    fn test_path_id() {
        assert_eq!(path_id("DOI:10.1038/nature12373"), "DOI:10.1038/nature12373");
        assert_eq!(path_id("abc#1 2"), "abc%231%202");
        assert_eq!(path_id("50%"), "50%25");
    }

    #[tokio::test]
    async fn test_citations_are_raw() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/paper/abc/citations".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"offset": 0, "data": [{"citingPaper": {"paperId": "x", "title": "Citing"}}]}"#)
            .create_async()
            .await;

        let source = source_for(&server, Arc::new(ManualClock::new()));
        let citations = source.citations("abc", 20).await.unwrap();
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0]["citingPaper"]["title"], "Citing");
    }

    #[tokio::test]
    async fn test_author_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let _search = server
            .mock("GET", Matcher::Regex(r"^/author/search".into()))
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "Geoffrey Hinton".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(r#"{"total": 1, "data": [{"authorId": "1695689", "name": "Geoffrey E. Hinton", "hIndex": 150}]}"#)
            .create_async()
            .await;
        let _papers = server
            .mock("GET", Matcher::Regex(r"^/author/1695689/papers".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"paperId": "p1", "title": "Deep learning"}, {"paperId": "p2", "title": "Dropout"}]}"#)
            .create_async()
            .await;

        let clock = Arc::new(ManualClock::new());
        let source = source_for(&server, clock.clone());

        let authors = source.author_search("Geoffrey Hinton", 10).await.unwrap();
        assert_eq!(authors[0]["hIndex"], 150);

        let papers = source.author_papers("1695689", 20).await.unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[1]["title"], "Dropout");

        assert_eq!(clock.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/paper/missing".into()))
            .with_status(404)
            .create_async()
            .await;

        let source = source_for(&server, Arc::new(ManualClock::new()));
        assert!(matches!(
            source.get_by_id("missing").await,
            Err(SourceError::NotFound(_))
        ));
    }
}
