//! PubMed research source implementation using E-utilities API.
//!
//! Searching is two-step: `esearch` (JSON) returns PMIDs, `efetch` (XML)
//! returns the article records for at most 10 PMIDs per request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::config::Config;
use crate::models::{Record, RecordBuilder, SearchQuery, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{author_list, truncate_chars, HttpClient, XmlElement};

/// Maximum PMIDs per efetch request
const FETCH_BATCH: usize = 10;

/// Characters of abstract kept in a summary
const SNIPPET_CHARS: usize = 200;

const PROVIDER: &str = "PubMed";

/// Output of `pubmed_search`: bare PMIDs or enriched records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PubMedSearchResult {
    Ids(Vec<String>),
    Articles(Vec<Record>),
}

/// Condensed view of one article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubMedSummary {
    pub pmid: String,
    pub title: String,
    /// Display author list ("A, B, C et al.")
    pub authors: String,
    /// "Journal (Year)"
    pub journal: String,
    pub abstract_snippet: String,
}

/// efetch detail level. Both produce the same record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFormat {
    #[default]
    Abstract,
    Full,
}

impl std::str::FromStr for FetchFormat {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abstract" => Ok(FetchFormat::Abstract),
            "full" => Ok(FetchFormat::Full),
            other => Err(SourceError::InvalidRequest(format!(
                "Unknown format '{}': expected 'abstract' or 'full'",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// PubMed research source
///
/// Uses NCBI E-utilities API for searching and fetching PubMed records.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl PubMedSource {
    /// Create a PubMed source from the configuration
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        Ok(Self::with_client(
            HttpClient::new(&config.http)?,
            &config.endpoints.pubmed,
            config.api_keys.ncbi.clone(),
        ))
    }

    /// Create with a custom HTTP client and endpoint
    pub fn with_client(client: HttpClient, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn common_params(&self, retmode: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", "pubmed".to_string()), ("retmode", retmode.to_string())];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Run esearch and return the PMIDs in relevance order
    pub async fn search_ids(&self, query: &str, max_results: usize) -> Result<Vec<String>, SourceError> {
        let mut params = self.common_params("json");
        params.push(("term", query.to_string()));
        params.push(("retmax", max_results.to_string()));

        let url = format!("{}/esearch.fcgi", self.base_url);
        tracing::debug!(query, max_results, "PubMed esearch");
        let response: ESearchResponse = self
            .client
            .send_json(self.client.get(&url).query(&params), PROVIDER)
            .await?;

        Ok(response.esearchresult.idlist)
    }

    /// Fetch one efetch batch; records come back in response order
    async fn fetch_batch(&self, pmids: &[String]) -> Result<Vec<Record>, SourceError> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = self.common_params("xml");
        params.push(("id", pmids.join(",")));

        let url = format!("{}/efetch.fcgi", self.base_url);
        tracing::debug!(count = pmids.len(), "PubMed efetch");
        let xml = self
            .client
            .send_text(self.client.get(&url).query(&params), PROVIDER)
            .await?;

        Self::parse_articles(&xml)
    }

    /// Fetch article details for the first 10 PMIDs, keyed by PMID.
    /// PMIDs absent from the response are absent from the map.
    pub async fn fetch(
        &self,
        pmids: &[String],
        _format: FetchFormat,
    ) -> Result<BTreeMap<String, Record>, SourceError> {
        let batch = &pmids[..pmids.len().min(FETCH_BATCH)];
        let records = self.fetch_batch(batch).await?;

        Ok(records
            .into_iter()
            .map(|r| (r.identifiers.pmid.clone(), r))
            .collect())
    }

    /// Search and enrich every PMID, in batches of 10, preserving esearch
    /// order. PMIDs missing from the detail responses are dropped.
    pub async fn search_records(&self, query: &str, max_results: usize) -> Result<Vec<Record>, SourceError> {
        let pmids = self.search_ids(query, max_results).await?;
        self.enrich(&pmids).await
    }

    async fn enrich(&self, pmids: &[String]) -> Result<Vec<Record>, SourceError> {
        let mut by_pmid: BTreeMap<String, Record> = BTreeMap::new();
        for batch in pmids.chunks(FETCH_BATCH) {
            for record in self.fetch_batch(batch).await? {
                by_pmid.insert(record.identifiers.pmid.clone(), record);
            }
        }

        Ok(pmids.iter().filter_map(|pmid| by_pmid.remove(pmid)).collect())
    }

    /// `pubmed_search`: PMIDs only, or enriched records when `return_details`
    pub async fn search_tool(
        &self,
        query: &str,
        max_results: usize,
        return_details: bool,
    ) -> Result<PubMedSearchResult, SourceError> {
        let pmids = self.search_ids(query, max_results).await?;
        if !return_details || pmids.is_empty() {
            return Ok(PubMedSearchResult::Ids(pmids));
        }
        Ok(PubMedSearchResult::Articles(self.enrich(&pmids).await?))
    }

    /// Condensed records for the first 10 PMIDs, in request order
    pub async fn summary(&self, pmids: &[String]) -> Result<Vec<PubMedSummary>, SourceError> {
        let mut records = self.fetch(pmids, FetchFormat::Abstract).await?;
        let mut seen = HashSet::new();

        Ok(pmids
            .iter()
            .take(FETCH_BATCH)
            .filter(|pmid| seen.insert(pmid.as_str()))
            .filter_map(|pmid| records.remove(pmid))
            .map(|record| Self::summarize(&record))
            .collect())
    }

    fn summarize(record: &Record) -> PubMedSummary {
        PubMedSummary {
            pmid: record.identifiers.pmid.clone(),
            title: record.title.clone(),
            authors: author_list(&record.authors),
            journal: format!("{} ({})", record.venue, record.year),
            abstract_snippet: truncate_chars(&record.r#abstract, SNIPPET_CHARS),
        }
    }

    /// Parse an efetch `PubmedArticleSet`. Every field is optional; articles
    /// without a PMID are skipped.
    pub fn parse_articles(xml: &str) -> Result<Vec<Record>, SourceError> {
        let root = XmlElement::parse(xml)?;
        let articles = if root.name == "PubmedArticle" {
            vec![&root]
        } else {
            root.descendants("PubmedArticle")
        };

        Ok(articles.into_iter().filter_map(Self::parse_article).collect())
    }

    fn parse_article(article: &XmlElement) -> Option<Record> {
        let pmid = article.descendants("PMID").first().map(|e| e.text())?;
        if pmid.is_empty() {
            return None;
        }

        let text_of = |path: &[&str]| article.find(path).map(|e| e.text()).unwrap_or_default();

        let title = article
            .descendants("ArticleTitle")
            .first()
            .map(|e| e.text())
            .unwrap_or_default();

        let authors = article
            .find_all(&["AuthorList", "Author"])
            .into_iter()
            .filter_map(|author| {
                let fore = author.child("ForeName").map(|e| e.text()).unwrap_or_default();
                let last = author.child("LastName").map(|e| e.text()).unwrap_or_default();
                (!fore.is_empty() && !last.is_empty()).then(|| format!("{} {}", fore, last))
            })
            .collect();

        let pub_date = article.find(&["JournalIssue", "PubDate"]);
        let date_part = |name: &str| {
            pub_date
                .and_then(|d| d.child(name))
                .map(|e| e.text())
                .unwrap_or_default()
        };
        let year = date_part("Year");
        let published_date = [year.clone(), date_part("Month"), date_part("Day")]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let doi = article
            .find_all(&["PubmedData", "ArticleIdList", "ArticleId"])
            .into_iter()
            .find(|id| id.attr("IdType") == Some("doi"))
            .map(|id| id.text())
            .unwrap_or_default();

        let keywords = article
            .descendants("Keyword")
            .into_iter()
            .map(|k| k.text())
            .filter(|k| !k.is_empty())
            .collect();

        Some(
            RecordBuilder::new(SourceType::PubMed, title)
                .authors(authors)
                .year(year)
                .published_date(published_date)
                .venue(text_of(&["Journal", "Title"]))
                .abstract_text(text_of(&["Abstract", "AbstractText"]))
                .doi(doi)
                .pmid(pmid.clone())
                .native_id(pmid.clone())
                .url(format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid))
                .keywords(keywords)
                .build(),
        )
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::ID_LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        self.search_records(&query.query, query.max_results).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Record, SourceError> {
        let mut records = self.fetch(&[id.to_string()], FetchFormat::Abstract).await?;
        records
            .remove(id)
            .ok_or_else(|| SourceError::NotFound(format!("PMID {} not found", id)))
    }
}
