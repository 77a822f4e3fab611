//! arXiv research source implementation.
//!
//! The export API answers with an Atom feed; `arxiv:`-prefixed elements carry
//! the DOI, journal reference and primary category.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::config::Config;
use crate::models::{Record, RecordBuilder, SearchQuery, SortBy, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{collapse_whitespace, HttpClient};

const PROVIDER: &str = "arXiv";

/// Entry id prefix the API uses to report a rejected query
const ERROR_ID: &str = "arxiv.org/api/errors";

static VERSION_SUFFIX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "arxiv:journal_ref", alias = "journal_ref")]
    journal_ref: Option<String>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Versioned id from an entry id URL ("http://arxiv.org/abs/1706.03762v7")
fn versioned_id(entry_id: &str) -> String {
    let id = entry_id.trim();
    match id.find("/abs/") {
        Some(pos) => id[pos + 5..].to_string(),
        None => id.to_string(),
    }
}

/// Drop a trailing "vN" version suffix
fn strip_version(id: &str) -> String {
    let re = VERSION_SUFFIX.get_or_init(|| Regex::new(r"v\d+$").expect("static regex"));
    re.replace(id, "").into_owned()
}

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
}

impl ArxivSource {
    /// Create an arXiv source from the configuration
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        Ok(Self::with_client(
            HttpClient::new(&config.http)?,
            &config.endpoints.arxiv,
        ))
    }

    /// Create with a custom HTTP client and endpoint
    pub fn with_client(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `arxiv_search`: `query` uses arXiv query syntax (`ti:`, `au:`, `cat:`, `id:`...)
    pub async fn search_feed(
        &self,
        query: &str,
        max_results: usize,
        sort_by: SortBy,
    ) -> Result<Vec<Record>, SourceError> {
        let params = [
            ("search_query", query.to_string()),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", sort_by.as_param().to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let url = format!("{}/query", self.base_url);
        tracing::debug!(query, max_results, sort_by = sort_by.as_param(), "arXiv query");
        let xml = self
            .client
            .send_text(self.client.get(&url).query(&params), PROVIDER)
            .await?;

        Self::parse_feed(&xml)
    }

    /// `arxiv_paper`: single-paper lookup through an `id:` search
    pub async fn paper(&self, arxiv_id: &str) -> Result<Record, SourceError> {
        self.search_feed(&format!("id:{}", arxiv_id), 1, SortBy::Relevance)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound(format!("arXiv paper {} not found", arxiv_id)))
    }

    /// Parse an Atom feed into records, one per `<entry>`. A rejected query
    /// comes back as a single entry under the `/api/errors` id.
    pub fn parse_feed(xml: &str) -> Result<Vec<Record>, SourceError> {
        let feed: AtomFeed = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse arXiv feed: {}", e)))?;

        if let Some(error) = feed.entries.iter().find(|e| e.id.contains(ERROR_ID)) {
            return Err(SourceError::Api(format!(
                "arXiv rejected the query: {}",
                collapse_whitespace(&error.summary)
            )));
        }

        Ok(feed.entries.into_iter().map(Self::parse_entry).collect())
    }

    fn parse_entry(entry: AtomEntry) -> Record {
        let native_id = versioned_id(&entry.id);
        let arxiv_id = strip_version(&native_id);

        let (year, published_date) = match DateTime::parse_from_rfc3339(entry.published.trim()) {
            Ok(dt) => {
                let dt = dt.with_timezone(&Utc);
                (dt.format("%Y").to_string(), dt.format("%Y-%m-%d").to_string())
            }
            Err(_) => (String::new(), String::new()),
        };

        let pdf_url = entry
            .links
            .iter()
            .find(|l| l.link_type.as_deref() == Some("application/pdf"))
            .and_then(|l| l.href.clone());
        let url = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .and_then(|l| l.href.clone())
            .unwrap_or_else(|| entry.id.trim().to_string());

        let authors = entry
            .authors
            .iter()
            .map(|a| collapse_whitespace(&a.name))
            .collect();

        let categories = entry
            .categories
            .iter()
            .filter_map(|c| c.term.clone())
            .filter(|t| !t.is_empty())
            .collect();

        RecordBuilder::new(SourceType::Arxiv, collapse_whitespace(&entry.title))
            .authors(authors)
            .year(year)
            .published_date(published_date)
            .venue(entry.journal_ref.as_deref().map(collapse_whitespace).unwrap_or_default())
            .abstract_text(collapse_whitespace(&entry.summary))
            .doi(entry.doi.as_deref().map(str::trim).unwrap_or_default())
            .arxiv_id(arxiv_id)
            .native_id(native_id)
            .url(url)
            .pdf_url(pdf_url)
            .keywords(categories)
            .build()
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::ID_LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        let sort_by = query.sort_by.unwrap_or(SortBy::Relevance);
        self.search_feed(&query.query, query.max_results, sort_by).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Record, SourceError> {
        self.paper(id).await
    }
}
