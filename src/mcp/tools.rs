//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use super::handlers::*;
use crate::hub::ResearchHub;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "pubmed_search")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

fn schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Registry for all MCP tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a tool registry with every tool backed by the hub's adapters
    pub fn from_hub(hub: &ResearchHub) -> Self {
        let mut registry = Self::default();
        registry.register_pubmed_tools(hub);
        registry.register_semantic_tools(hub);
        registry.register_reddit_tools(hub);
        registry.register_arxiv_tools(hub);
        registry.register_crossref_tools(hub);
        registry.register_aggregate_tools(hub);
        registry
    }

    fn add(
        &mut self,
        name: &str,
        description: &str,
        input_schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) {
        self.register(Tool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            handler,
        });
    }

    fn register_pubmed_tools(&mut self, hub: &ResearchHub) {
        self.add(
            "pubmed_search",
            "Search PubMed. Returns PMIDs, or full article records when return_details is true.",
            schema(
                json!({
                    "query": {"type": "string", "description": "PubMed query (Entrez syntax)"},
                    "max_results": {"type": "integer", "description": "Maximum number of PMIDs", "default": 20},
                    "return_details": {"type": "boolean", "description": "Fetch article details for every PMID", "default": true}
                }),
                &["query"],
            ),
            Arc::new(PubMedSearchHandler {
                pubmed: hub.pubmed.clone(),
            }),
        );

        self.add(
            "pubmed_fetch",
            "Fetch PubMed article records by PMID (first 10 ids), keyed by PMID.",
            schema(
                json!({
                    "pmids": {"type": "array", "items": {"type": "string"}, "description": "PubMed ids"},
                    "format": {"type": "string", "enum": ["abstract", "full"], "default": "abstract"}
                }),
                &["pmids"],
            ),
            Arc::new(PubMedFetchHandler {
                pubmed: hub.pubmed.clone(),
            }),
        );

        self.add(
            "pubmed_summary",
            "Condensed PubMed records (title, authors, journal, 200-character abstract snippet).",
            schema(
                json!({
                    "pmids": {"type": "array", "items": {"type": "string"}, "description": "PubMed ids"}
                }),
                &["pmids"],
            ),
            Arc::new(PubMedSummaryHandler {
                pubmed: hub.pubmed.clone(),
            }),
        );
    }

    fn register_semantic_tools(&mut self, hub: &ResearchHub) {
        self.add(
            "semantic_scholar_search",
            "Search Semantic Scholar papers with optional year, citation and field filters.",
            schema(
                json!({
                    "query": {"type": "string", "description": "Search query"},
                    "limit": {"type": "integer", "description": "Maximum results (at most 100)", "default": 20},
                    "year_range": {"type": "string", "description": "Year filter (e.g., '2020', '2018-2022', '2010-', '-2015')"},
                    "min_citations": {"type": "integer", "description": "Drop papers with fewer citations"},
                    "fields_of_study": {"type": "array", "items": {"type": "string"}, "description": "e.g. ['Medicine', 'Biology']"}
                }),
                &["query"],
            ),
            Arc::new(SemanticSearchHandler {
                semantic: hub.semantic.clone(),
            }),
        );

        self.add(
            "semantic_scholar_paper_details",
            "Get a Semantic Scholar paper by id (paperId, DOI:..., ARXIV:..., PMID:...).",
            schema(
                json!({
                    "paper_id": {"type": "string", "description": "Semantic Scholar paper identifier"}
                }),
                &["paper_id"],
            ),
            Arc::new(SemanticPaperDetailsHandler {
                semantic: hub.semantic.clone(),
            }),
        );

        let graph_schema = schema(
            json!({
                "paper_id": {"type": "string", "description": "Semantic Scholar paper identifier"},
                "limit": {"type": "integer", "description": "Maximum results", "default": 20}
            }),
            &["paper_id"],
        );
        self.add(
            "semantic_scholar_citations",
            "Papers citing the given paper.",
            graph_schema.clone(),
            Arc::new(SemanticCitationsHandler {
                semantic: hub.semantic.clone(),
                direction: CitationDirection::Citations,
            }),
        );
        self.add(
            "semantic_scholar_references",
            "Papers referenced by the given paper.",
            graph_schema,
            Arc::new(SemanticCitationsHandler {
                semantic: hub.semantic.clone(),
                direction: CitationDirection::References,
            }),
        );

        self.add(
            "semantic_scholar_author_search",
            "Search Semantic Scholar authors by name.",
            schema(
                json!({
                    "author_name": {"type": "string", "description": "Author name"},
                    "limit": {"type": "integer", "description": "Maximum results", "default": 10}
                }),
                &["author_name"],
            ),
            Arc::new(SemanticAuthorSearchHandler {
                semantic: hub.semantic.clone(),
            }),
        );

        self.add(
            "semantic_scholar_author_papers",
            "Papers by a Semantic Scholar author.",
            schema(
                json!({
                    "author_id": {"type": "string", "description": "Semantic Scholar author id"},
                    "limit": {"type": "integer", "description": "Maximum results", "default": 20}
                }),
                &["author_id"],
            ),
            Arc::new(SemanticAuthorPapersHandler {
                semantic: hub.semantic.clone(),
            }),
        );
    }

    fn register_reddit_tools(&mut self, hub: &ResearchHub) {
        self.add(
            "reddit_search",
            "Search all of Reddit. Requires Reddit API credentials.",
            schema(
                json!({
                    "query": {"type": "string", "description": "Search query"},
                    "limit": {"type": "integer", "default": 20},
                    "sort": {"type": "string", "enum": ["relevance", "hot", "top", "new", "comments"], "default": "new"},
                    "search_type": {"type": "string", "enum": ["link", "sr", "user"], "default": "link"}
                }),
                &["query"],
            ),
            Arc::new(RedditSearchHandler {
                reddit: hub.reddit.clone(),
            }),
        );

        self.add(
            "reddit_subreddit_search",
            "Search within one subreddit. Requires Reddit API credentials.",
            schema(
                json!({
                    "subreddit": {"type": "string", "description": "Subreddit name without r/"},
                    "query": {"type": "string", "description": "Search query"},
                    "limit": {"type": "integer", "default": 20},
                    "sort": {"type": "string", "enum": ["relevance", "hot", "top", "new", "comments"], "default": "new"}
                }),
                &["subreddit", "query"],
            ),
            Arc::new(RedditSubredditSearchHandler {
                reddit: hub.reddit.clone(),
            }),
        );

        self.add(
            "reddit_comments",
            "A Reddit submission and its comments, flattened parent-first.",
            schema(
                json!({
                    "submission_id": {"type": "string", "description": "Submission id (with or without t3_)"},
                    "limit": {"type": "integer", "default": 50}
                }),
                &["submission_id"],
            ),
            Arc::new(RedditCommentsHandler {
                reddit: hub.reddit.clone(),
            }),
        );
    }

    fn register_arxiv_tools(&mut self, hub: &ResearchHub) {
        self.add(
            "arxiv_search",
            "Search arXiv using its query syntax (ti:, au:, abs:, cat:, all:).",
            schema(
                json!({
                    "query": {"type": "string", "description": "arXiv search query"},
                    "max_results": {"type": "integer", "default": 20},
                    "sort_by": {"type": "string", "enum": ["relevance", "lastUpdatedDate", "submittedDate"], "default": "relevance"}
                }),
                &["query"],
            ),
            Arc::new(ArxivSearchHandler {
                arxiv: hub.arxiv.clone(),
            }),
        );

        self.add(
            "arxiv_paper",
            "Get one arXiv paper by id (e.g., '2301.12345').",
            schema(
                json!({
                    "arxiv_id": {"type": "string", "description": "arXiv identifier"}
                }),
                &["arxiv_id"],
            ),
            Arc::new(ArxivPaperHandler {
                arxiv: hub.arxiv.clone(),
            }),
        );
    }

    fn register_crossref_tools(&mut self, hub: &ResearchHub) {
        self.add(
            "crossref_works_search",
            "Search CrossRef works. Returns {total_results, items}.",
            schema(
                json!({
                    "query": {"type": "string", "description": "Search query"},
                    "rows": {"type": "integer", "default": 20},
                    "filter_dict": {
                        "type": "object",
                        "description": "CrossRef filters, e.g. {\"from-pub-date\": \"2020\", \"type\": \"journal-article\"}",
                        "additionalProperties": {"type": ["string", "number", "boolean"]}
                    }
                }),
                &["query"],
            ),
            Arc::new(CrossRefWorksHandler {
                crossref: hub.crossref.clone(),
            }),
        );

        self.add(
            "crossref_doi_lookup",
            "Get CrossRef metadata for a DOI.",
            schema(
                json!({
                    "doi": {"type": "string", "description": "DOI (e.g., '10.1038/s41586-020-2649-2')"}
                }),
                &["doi"],
            ),
            Arc::new(CrossRefDoiHandler {
                crossref: hub.crossref.clone(),
            }),
        );

        self.add(
            "crossref_journal_works",
            "Works published in a journal. Returns {journal_title, total_results, items}.",
            schema(
                json!({
                    "issn": {"type": "string", "description": "Journal ISSN"},
                    "rows": {"type": "integer", "default": 20}
                }),
                &["issn"],
            ),
            Arc::new(CrossRefJournalHandler {
                crossref: hub.crossref.clone(),
            }),
        );
    }

    fn register_aggregate_tools(&mut self, hub: &ResearchHub) {
        self.add(
            "multi_database_search",
            "Run one query against several databases. A failing database appears as '<name>_error' without affecting the others.",
            schema(
                json!({
                    "query": {"type": "string", "description": "Search query"},
                    "databases": {
                        "type": "array",
                        "items": {"type": "string", "enum": ["pubmed", "semantic_scholar", "arxiv", "crossref"]},
                        "description": "Databases to query (default: all four)"
                    },
                    "max_results_per_db": {"type": "integer", "default": 10}
                }),
                &["query"],
            ),
            Arc::new(MultiDatabaseSearchHandler {
                fanout: hub.fanout(),
            }),
        );

        self.add(
            "get_paper_by_identifier",
            "Resolve a DOI, PMID, arXiv id or Semantic Scholar id. The type is detected when id_type is omitted.",
            schema(
                json!({
                    "identifier": {"type": "string", "description": "Paper identifier"},
                    "id_type": {"type": "string", "enum": ["doi", "pmid", "arxiv", "provider-native"]}
                }),
                &["identifier"],
            ),
            Arc::new(GetPaperByIdentifierHandler {
                resolver: hub.resolver(),
            }),
        );
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tracing::debug!(tool = name, "executing tool");
        tool.handler.execute(args).await
    }
}
