//! Tool handlers, one per callable operation.
//!
//! Arguments are deserialized into typed input structs carrying the tool
//! defaults; results are serialized back to JSON. Errors cross the tool
//! boundary as strings.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::tools::ToolHandler;
use crate::aggregate::{Fanout, Resolver};
use crate::models::{SearchQuery, SortBy};
use crate::sources::{
    ArxivSource, CrossRefSource, FetchFormat, PubMedSource, RedditSource, SemanticScholarSource,
};

/// Deserialize tool arguments, treating a missing argument object as `{}`
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("Failed to serialize result: {}", e))
}

fn default_20() -> usize {
    20
}

fn default_10() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_new() -> String {
    "new".to_string()
}

// ---- PubMed ----

#[derive(Debug, Deserialize)]
struct PubMedSearchInput {
    query: String,
    #[serde(default = "default_20")]
    max_results: usize,
    #[serde(default = "default_true")]
    return_details: bool,
}

#[derive(Debug)]
pub struct PubMedSearchHandler {
    pub pubmed: Arc<PubMedSource>,
}

#[async_trait::async_trait]
impl ToolHandler for PubMedSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: PubMedSearchInput = parse_args(args)?;
        let result = self
            .pubmed
            .search_tool(&input.query, input.max_results, input.return_details)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&result)
    }
}

#[derive(Debug, Deserialize)]
struct PubMedFetchInput {
    pmids: Vec<String>,
    #[serde(default = "default_format")]
    format: String,
}

fn default_format() -> String {
    "abstract".to_string()
}

#[derive(Debug)]
pub struct PubMedFetchHandler {
    pub pubmed: Arc<PubMedSource>,
}

#[async_trait::async_trait]
impl ToolHandler for PubMedFetchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: PubMedFetchInput = parse_args(args)?;
        let format = input.format.parse::<FetchFormat>().map_err(|e| e.to_string())?;
        let records = self
            .pubmed
            .fetch(&input.pmids, format)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&records)
    }
}

#[derive(Debug, Deserialize)]
struct PmidsInput {
    pmids: Vec<String>,
}

#[derive(Debug)]
pub struct PubMedSummaryHandler {
    pub pubmed: Arc<PubMedSource>,
}

#[async_trait::async_trait]
impl ToolHandler for PubMedSummaryHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: PmidsInput = parse_args(args)?;
        let summaries = self
            .pubmed
            .summary(&input.pmids)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&summaries)
    }
}

// ---- Semantic Scholar ----

#[derive(Debug, Deserialize)]
struct SemanticSearchInput {
    query: String,
    #[serde(default = "default_20")]
    limit: usize,
    year_range: Option<String>,
    min_citations: Option<u64>,
    #[serde(default)]
    fields_of_study: Vec<String>,
}

#[derive(Debug)]
pub struct SemanticSearchHandler {
    pub semantic: Arc<SemanticScholarSource>,
}

#[async_trait::async_trait]
impl ToolHandler for SemanticSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: SemanticSearchInput = parse_args(args)?;

        let mut query = SearchQuery::new(input.query)
            .max_results(input.limit)
            .fields_of_study(input.fields_of_study);
        if let Some(year) = input.year_range {
            query = query.year(year);
        }
        if let Some(min) = input.min_citations {
            query = query.min_citations(min);
        }

        let papers = self
            .semantic
            .search_papers(&query)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&papers)
    }
}

#[derive(Debug, Deserialize)]
struct PaperIdInput {
    paper_id: String,
    #[serde(default = "default_20")]
    limit: usize,
}

#[derive(Debug)]
pub struct SemanticPaperDetailsHandler {
    pub semantic: Arc<SemanticScholarSource>,
}

#[async_trait::async_trait]
impl ToolHandler for SemanticPaperDetailsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: PaperIdInput = parse_args(args)?;
        let paper = self
            .semantic
            .paper_details(&input.paper_id)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&paper)
    }
}

/// Direction of a citation-graph query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationDirection {
    /// Papers citing the given paper
    Citations,
    /// Papers the given paper cites
    References,
}

#[derive(Debug)]
pub struct SemanticCitationsHandler {
    pub semantic: Arc<SemanticScholarSource>,
    pub direction: CitationDirection,
}

#[async_trait::async_trait]
impl ToolHandler for SemanticCitationsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: PaperIdInput = parse_args(args)?;
        let edges = match self.direction {
            CitationDirection::Citations => {
                self.semantic.citations(&input.paper_id, input.limit).await
            }
            CitationDirection::References => {
                self.semantic.references(&input.paper_id, input.limit).await
            }
        }
        .map_err(|e| e.to_string())?;
        Ok(Value::Array(edges))
    }
}

#[derive(Debug, Deserialize)]
struct AuthorSearchInput {
    author_name: String,
    #[serde(default = "default_10")]
    limit: usize,
}

#[derive(Debug)]
pub struct SemanticAuthorSearchHandler {
    pub semantic: Arc<SemanticScholarSource>,
}

#[async_trait::async_trait]
impl ToolHandler for SemanticAuthorSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: AuthorSearchInput = parse_args(args)?;
        let authors = self
            .semantic
            .author_search(&input.author_name, input.limit)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Value::Array(authors))
    }
}

#[derive(Debug, Deserialize)]
struct AuthorPapersInput {
    author_id: String,
    #[serde(default = "default_20")]
    limit: usize,
}

#[derive(Debug)]
pub struct SemanticAuthorPapersHandler {
    pub semantic: Arc<SemanticScholarSource>,
}

#[async_trait::async_trait]
impl ToolHandler for SemanticAuthorPapersHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: AuthorPapersInput = parse_args(args)?;
        let papers = self
            .semantic
            .author_papers(&input.author_id, input.limit)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Value::Array(papers))
    }
}

// ---- Reddit ----

#[derive(Debug, Deserialize)]
struct RedditSearchInput {
    query: String,
    #[serde(default = "default_20")]
    limit: usize,
    #[serde(default = "default_new")]
    sort: String,
    #[serde(default = "default_search_type")]
    search_type: String,
}

fn default_search_type() -> String {
    "link".to_string()
}

#[derive(Debug)]
pub struct RedditSearchHandler {
    pub reddit: Arc<RedditSource>,
}

#[async_trait::async_trait]
impl ToolHandler for RedditSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: RedditSearchInput = parse_args(args)?;
        let posts = self
            .reddit
            .search(&input.query, input.limit, &input.sort, &input.search_type)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Value::Array(posts))
    }
}

#[derive(Debug, Deserialize)]
struct SubredditSearchInput {
    subreddit: String,
    query: String,
    #[serde(default = "default_20")]
    limit: usize,
    #[serde(default = "default_new")]
    sort: String,
}

#[derive(Debug)]
pub struct RedditSubredditSearchHandler {
    pub reddit: Arc<RedditSource>,
}

#[async_trait::async_trait]
impl ToolHandler for RedditSubredditSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: SubredditSearchInput = parse_args(args)?;
        let posts = self
            .reddit
            .subreddit_search(&input.subreddit, &input.query, input.limit, &input.sort)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Value::Array(posts))
    }
}

#[derive(Debug, Deserialize)]
struct RedditCommentsInput {
    submission_id: String,
    #[serde(default = "default_comment_limit")]
    limit: usize,
}

fn default_comment_limit() -> usize {
    50
}

#[derive(Debug)]
pub struct RedditCommentsHandler {
    pub reddit: Arc<RedditSource>,
}

#[async_trait::async_trait]
impl ToolHandler for RedditCommentsHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: RedditCommentsInput = parse_args(args)?;
        let thread = self
            .reddit
            .comments(&input.submission_id, input.limit)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&thread)
    }
}

// ---- arXiv ----

#[derive(Debug, Deserialize)]
struct ArxivSearchInput {
    query: String,
    #[serde(default = "default_20")]
    max_results: usize,
    #[serde(default = "default_sort_by")]
    sort_by: String,
}

fn default_sort_by() -> String {
    "relevance".to_string()
}

#[derive(Debug)]
pub struct ArxivSearchHandler {
    pub arxiv: Arc<ArxivSource>,
}

#[async_trait::async_trait]
impl ToolHandler for ArxivSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: ArxivSearchInput = parse_args(args)?;
        let sort_by = input.sort_by.parse::<SortBy>().map_err(|e| e.to_string())?;
        let papers = self
            .arxiv
            .search_feed(&input.query, input.max_results, sort_by)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&papers)
    }
}

#[derive(Debug, Deserialize)]
struct ArxivPaperInput {
    arxiv_id: String,
}

#[derive(Debug)]
pub struct ArxivPaperHandler {
    pub arxiv: Arc<ArxivSource>,
}

#[async_trait::async_trait]
impl ToolHandler for ArxivPaperHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: ArxivPaperInput = parse_args(args)?;
        let paper = self
            .arxiv
            .paper(input.arxiv_id.trim())
            .await
            .map_err(|e| e.to_string())?;
        to_json(&paper)
    }
}

// ---- CrossRef ----

#[derive(Debug, Deserialize)]
struct CrossRefWorksInput {
    query: String,
    #[serde(default = "default_20")]
    rows: usize,
    #[serde(default)]
    filter_dict: BTreeMap<String, Value>,
}

/// Filter values may arrive as strings, numbers or booleans
fn filter_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Debug)]
pub struct CrossRefWorksHandler {
    pub crossref: Arc<CrossRefSource>,
}

#[async_trait::async_trait]
impl ToolHandler for CrossRefWorksHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: CrossRefWorksInput = parse_args(args)?;

        let mut query = SearchQuery::new(input.query).max_results(input.rows);
        for (key, value) in input.filter_dict {
            query = query.filter(key, filter_value(value));
        }

        let page = self
            .crossref
            .works(&query)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&page)
    }
}

#[derive(Debug, Deserialize)]
struct DoiInput {
    doi: String,
}

#[derive(Debug)]
pub struct CrossRefDoiHandler {
    pub crossref: Arc<CrossRefSource>,
}

#[async_trait::async_trait]
impl ToolHandler for CrossRefDoiHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: DoiInput = parse_args(args)?;
        let work = self
            .crossref
            .work(input.doi.trim())
            .await
            .map_err(|e| e.to_string())?;
        to_json(&work)
    }
}

#[derive(Debug, Deserialize)]
struct JournalWorksInput {
    issn: String,
    #[serde(default = "default_20")]
    rows: usize,
}

#[derive(Debug)]
pub struct CrossRefJournalHandler {
    pub crossref: Arc<CrossRefSource>,
}

#[async_trait::async_trait]
impl ToolHandler for CrossRefJournalHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: JournalWorksInput = parse_args(args)?;
        let works = self
            .crossref
            .journal_works(input.issn.trim(), input.rows)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&works)
    }
}

// ---- Aggregation ----

#[derive(Debug, Deserialize)]
struct MultiSearchInput {
    query: String,
    databases: Option<Vec<String>>,
    #[serde(default = "default_10")]
    max_results_per_db: usize,
}

/// `multi_database_search`. Never fails once the arguments parse; provider
/// failures are entries of the result.
#[derive(Debug)]
pub struct MultiDatabaseSearchHandler {
    pub fanout: Fanout,
}

#[async_trait::async_trait]
impl ToolHandler for MultiDatabaseSearchHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: MultiSearchInput = parse_args(args)?;
        let result = self
            .fanout
            .search(
                &input.query,
                input.databases.as_deref(),
                input.max_results_per_db,
            )
            .await;
        to_json(&result)
    }
}

#[derive(Debug, Deserialize)]
struct IdentifierInput {
    identifier: String,
    id_type: Option<String>,
}

/// `get_paper_by_identifier`. Resolution failures come back as a structured
/// `{error, identifier, id_type}` value, not a tool error.
#[derive(Debug)]
pub struct GetPaperByIdentifierHandler {
    pub resolver: Resolver,
}

#[async_trait::async_trait]
impl ToolHandler for GetPaperByIdentifierHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let input: IdentifierInput = parse_args(args)?;
        let resolution = self
            .resolver
            .resolve(&input.identifier, input.id_type.as_deref())
            .await;
        to_json(&resolution)
    }
}
