//! CrossRef research source implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::models::{JournalWorks, Record, RecordBuilder, SearchQuery, SourceType, WorksPage};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{strip_markup, HttpClient};

const PROVIDER: &str = "CrossRef";

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CRResponse<T> {
    message: T,
}

#[derive(Debug, Deserialize)]
struct CRList {
    #[serde(rename = "total-results", default)]
    total_results: u64,
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
struct CRItem {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "DOI", default)]
    doi: String,
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(default)]
    author: Vec<CRAuthor>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    issued: Option<CRDate>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "is-referenced-by-count")]
    referenced_by_count: Option<u64>,
    #[serde(default)]
    link: Vec<CRLink>,
    #[serde(default)]
    subject: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
    /// Organisational authors only have a name
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
struct CRLink {
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}

impl CRAuthor {
    fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.given.as_deref(), self.family.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.name.clone().filter(|n| !n.is_empty())
        } else {
            Some(parts.join(" "))
        }
    }
}

/// (year, date) from CrossRef `date-parts`; the date is as precise as the parts allow
fn issued_date(date: Option<&CRDate>) -> (String, String) {
    let parts: Vec<i64> = date
        .and_then(|d| d.date_parts.first())
        .map(|p| p.iter().map_while(|v| *v).collect())
        .unwrap_or_default();

    match parts.as_slice() {
        [y, m, d, ..] => {
            let date = u32::try_from(*m)
                .ok()
                .zip(u32::try_from(*d).ok())
                .and_then(|(m, d)| NaiveDate::from_ymd_opt(*y as i32, m, d))
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| y.to_string());
            (y.to_string(), date)
        }
        [y, m] => (y.to_string(), format!("{}-{:02}", y, m)),
        [y] => (y.to_string(), y.to_string()),
        [] => (String::new(), String::new()),
    }
}

/// CrossRef research source
///
/// Uses CrossRef REST API for DOI metadata lookup and search.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
}

impl CrossRefSource {
    /// Create a CrossRef source. A configured `crossref_mailto` is added to
    /// the User-Agent, which routes requests to the polite pool.
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let user_agent = match &config.http.crossref_mailto {
            Some(mailto) => format!("{} (mailto:{})", config.http.user_agent, mailto),
            None => config.http.user_agent.clone(),
        };
        let client = HttpClient::with_user_agent(&user_agent, config.http.timeout())?;
        Ok(Self::with_client(client, &config.endpoints.crossref))
    }

    /// Create with a custom HTTP client and endpoint
    pub fn with_client(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Serialize a filter mapping as CrossRef's `key:value,key:value`
    fn filter_param(filters: &BTreeMap<String, String>) -> Option<String> {
        if filters.is_empty() {
            return None;
        }
        Some(
            filters
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join(","),
        )
    }

    fn to_record(item: CRItem) -> Record {
        let authors = item.author.iter().filter_map(CRAuthor::display_name).collect();
        let (year, published_date) = issued_date(item.issued.as_ref());

        let pdf_url = item
            .link
            .iter()
            .find(|l| l.content_type.as_deref() == Some("application/pdf"))
            .map(|l| l.url.clone());

        let url = item
            .url
            .clone()
            .unwrap_or_else(|| format!("https://doi.org/{}", item.doi));

        let mut builder = RecordBuilder::new(
            SourceType::CrossRef,
            item.title.first().cloned().unwrap_or_default(),
        )
        .authors(authors)
        .year(year)
        .published_date(published_date)
        .venue(item.container_title.first().cloned().unwrap_or_default())
        .abstract_text(item.abstract_text.as_deref().map(strip_markup).unwrap_or_default())
        .doi(item.doi.clone())
        .native_id(item.doi)
        .url(url)
        .pdf_url(pdf_url)
        .keywords(item.subject);

        if let Some(count) = item.referenced_by_count {
            builder = builder.citation_metrics(count, None);
        }
        builder.build()
    }

    /// `crossref_works_search`
    pub async fn works(&self, query: &SearchQuery) -> Result<WorksPage, SourceError> {
        let mut params = vec![
            ("query", query.query.clone()),
            ("rows", query.max_results.to_string()),
        ];
        if let Some(filter) = Self::filter_param(&query.filters) {
            params.push(("filter", filter));
        }

        let url = format!("{}/works", self.base_url);
        tracing::debug!(query = %query.query, rows = query.max_results, "CrossRef works search");
        let response: CRResponse<CRList> = self
            .client
            .send_json(self.client.get(&url).query(&params), PROVIDER)
            .await?;

        Ok(WorksPage {
            total_results: response.message.total_results,
            items: response.message.items.into_iter().map(Self::to_record).collect(),
        })
    }

    /// `crossref_doi_lookup`
    pub async fn work(&self, doi: &str) -> Result<Record, SourceError> {
        let url = format!("{}/works/{}", self.base_url, urlencoding::encode(doi));
        tracing::debug!(doi, "CrossRef DOI lookup");
        let response: CRResponse<CRItem> = self
            .client
            .send_json(self.client.get(&url), PROVIDER)
            .await?;

        Ok(Self::to_record(response.message))
    }

    /// `crossref_journal_works`: the journal title comes from the first work's
    /// container title
    pub async fn journal_works(&self, issn: &str, rows: usize) -> Result<JournalWorks, SourceError> {
        let url = format!("{}/journals/{}/works", self.base_url, urlencoding::encode(issn));
        tracing::debug!(issn, rows, "CrossRef journal works");
        let response: CRResponse<CRList> = self
            .client
            .send_json(self.client.get(&url).query(&[("rows", rows.to_string())]), PROVIDER)
            .await?;

        let items: Vec<Record> = response.message.items.into_iter().map(Self::to_record).collect();
        Ok(JournalWorks {
            journal_title: items.first().map(|r| r.venue.clone()).unwrap_or_default(),
            total_results: response.message.total_results,
            items,
        })
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::DOI_LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        Ok(self.works(query).await?.items)
    }

    async fn get_by_doi(&self, doi: &str) -> Result<Record, SourceError> {
        self.work(doi).await
    }
}
