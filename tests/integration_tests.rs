//! Integration tests for Research Hub
//!
//! Every provider is served by one local mockito server; the tools are driven
//! through the public registry exactly as an MCP client would call them.

use mockito::{Matcher, Server, ServerGuard};
use research_hub::config::Config;
use research_hub::mcp::ToolRegistry;
use research_hub::ResearchHub;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const DOI: &str = "10.1038/s41586-020-2649-2";

fn config_for(server: &ServerGuard) -> Config {
    let base = server.url();
    let mut config = Config::default();
    config.endpoints.pubmed = format!("{}/pubmed", base);
    config.endpoints.semantic_scholar = format!("{}/s2", base);
    config.endpoints.arxiv = format!("{}/arxiv", base);
    config.endpoints.crossref = format!("{}/crossref", base);
    config.endpoints.reddit_auth = format!("{}/reddit-auth", base);
    config.endpoints.reddit_api = format!("{}/reddit", base);
    config.api_keys.ncbi = None;
    config.api_keys.semantic_scholar = None;
    config.api_keys.reddit_client_id = None;
    config.api_keys.reddit_client_secret = None;
    config
}

fn tools_for(server: &ServerGuard) -> ToolRegistry {
    let hub = ResearchHub::from_config(&config_for(server)).unwrap();
    ToolRegistry::from_hub(&hub)
}

fn crossref_work() -> String {
    json!({
        "status": "ok",
        "message-type": "work",
        "message": {
            "DOI": DOI,
            "URL": "https://doi.org/10.1038/s41586-020-2649-2",
            "title": ["Array programming with NumPy"],
            "author": [
                {"given": "Charles R.", "family": "Harris"},
                {"given": "K. Jarrod", "family": "Millman"}
            ],
            "container-title": ["Nature"],
            "issued": {"date-parts": [[2020, 9, 16]]},
            "is-referenced-by-count": 9000
        }
    })
    .to_string()
}

fn s2_paper() -> String {
    json!({
        "paperId": "0d4c4f9fa3e8cf5a5e0e4f2c9a0fe1f8ad1b2c3d",
        "title": "Array programming with NumPy",
        "year": 2020,
        "authors": [{"name": "Charles R. Harris"}],
        "venue": "Nature",
        "citationCount": 9100,
        "influentialCitationCount": 400,
        "externalIds": {"DOI": DOI, "PubMed": "32939066"}
    })
    .to_string()
}

#[tokio::test]
async fn test_identifier_resolution_merges_crossref_and_semantic_scholar() {
    let mut server = Server::new_async().await;
    let crossref = server
        .mock("GET", Matcher::Regex(r"^/crossref/works/10\.1038".into()))
        .with_header("content-type", "application/json")
        .with_body(crossref_work())
        .create_async()
        .await;
    let s2 = server
        .mock("GET", Matcher::Regex(r"^/s2/paper/DOI:10\.1038".into()))
        .with_header("content-type", "application/json")
        .with_body(s2_paper())
        .create_async()
        .await;

    let result = tools_for(&server)
        .execute("get_paper_by_identifier", json!({"identifier": DOI}))
        .await
        .unwrap();

    assert_eq!(result["source"], "crossref+semantic_scholar");
    assert_eq!(result["crossref"]["title"], "Array programming with NumPy");
    assert_eq!(result["crossref"]["year"], "2020");
    assert_eq!(result["semantic_scholar"]["citation_metrics"]["influential"], 400);
    crossref.assert_async().await;
    s2.assert_async().await;
}

#[tokio::test]
async fn test_identifier_resolution_soft_fails_semantic_scholar() {
    let mut server = Server::new_async().await;
    let _crossref = server
        .mock("GET", Matcher::Regex(r"^/crossref/works/".into()))
        .with_header("content-type", "application/json")
        .with_body(crossref_work())
        .create_async()
        .await;
    let _s2 = server
        .mock("GET", Matcher::Regex(r"^/s2/paper/".into()))
        .with_status(404)
        .create_async()
        .await;

    let result = tools_for(&server)
        .execute("get_paper_by_identifier", json!({"identifier": DOI}))
        .await
        .unwrap();

    assert_eq!(result["source"], "crossref");
    assert_eq!(result["title"], "Array programming with NumPy");
    assert_eq!(result["authors"], json!(["Charles R. Harris", "K. Jarrod Millman"]));
    assert!(result.get("semantic_scholar").is_none());
    assert!(result.get("error").is_none());
}

#[tokio::test]
async fn test_identifier_resolution_reports_missing_arxiv_paper() {
    let mut server = Server::new_async().await;
    let _arxiv = server
        .mock("GET", Matcher::Regex(r"^/arxiv/query".into()))
        .match_query(Matcher::UrlEncoded("search_query".into(), "id:2301.99999".into()))
        .with_body(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#)
        .create_async()
        .await;

    let result = tools_for(&server)
        .execute("get_paper_by_identifier", json!({"identifier": "2301.99999"}))
        .await
        .unwrap();

    assert_eq!(result["id_type"], "arxiv");
    assert_eq!(result["identifier"], "2301.99999");
    assert!(result["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_multi_database_search_isolates_failures() {
    let mut server = Server::new_async().await;
    let _pubmed = server
        .mock("GET", Matcher::Regex(r"^/pubmed/esearch\.fcgi".into()))
        .with_status(500)
        .create_async()
        .await;
    let _s2 = server
        .mock("GET", Matcher::Regex(r"^/s2/paper/search".into()))
        .with_header("content-type", "application/json")
        .with_body(json!({"total": 1, "data": [serde_json::from_str::<Value>(&s2_paper()).unwrap()]}).to_string())
        .create_async()
        .await;
    let _arxiv = server
        .mock("GET", Matcher::Regex(r"^/arxiv/query".into()))
        .with_body(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#)
        .create_async()
        .await;
    let _crossref = server
        .mock("GET", Matcher::Regex(r"^/crossref/works".into()))
        .match_query(Matcher::UrlEncoded("rows".into(), "3".into()))
        .with_header("content-type", "application/json")
        .with_body(json!({"message": {"total-results": 0, "items": []}}).to_string())
        .create_async()
        .await;

    let result = tools_for(&server)
        .execute(
            "multi_database_search",
            json!({"query": "numpy", "max_results_per_db": 3}),
        )
        .await
        .unwrap();

    let object = result.as_object().unwrap();
    assert_eq!(object.len(), 4);
    assert!(object["pubmed_error"].as_str().unwrap().contains("500"));
    assert!(!object.contains_key("pubmed"));
    assert_eq!(object["semantic_scholar"].as_array().unwrap().len(), 1);
    assert_eq!(object["arxiv"], json!([]));
    assert_eq!(object["crossref"], json!([]));
}

#[tokio::test]
async fn test_semantic_scholar_calls_are_spaced() {
    let mut server = Server::new_async().await;
    let s2 = server
        .mock("GET", Matcher::Regex(r"^/s2/paper/".into()))
        .with_header("content-type", "application/json")
        .with_body(s2_paper())
        .expect(2)
        .create_async()
        .await;

    let tools = tools_for(&server);
    let started = Instant::now();
    for _ in 0..2 {
        tools
            .execute("semantic_scholar_paper_details", json!({"paper_id": "abc"}))
            .await
            .unwrap();
    }

    assert!(started.elapsed() >= Duration::from_millis(950));
    s2.assert_async().await;
}

#[tokio::test]
async fn test_pubmed_summary_snippets() {
    let long_abstract = "word ".repeat(100);
    let xml = format!(
        r#"<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">111</PMID>
      <Article>
        <Journal><JournalIssue><PubDate><Year>2021</Year></PubDate></JournalIssue><Title>Cell</Title></Journal>
        <ArticleTitle>Long one</ArticleTitle>
        <Abstract><AbstractText>{}</AbstractText></Abstract>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">222</PMID>
      <Article>
        <ArticleTitle>No abstract</ArticleTitle>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#,
        long_abstract
    );

    let mut server = Server::new_async().await;
    let _efetch = server
        .mock("GET", Matcher::Regex(r"^/pubmed/efetch\.fcgi".into()))
        .match_query(Matcher::UrlEncoded("id".into(), "222,111".into()))
        .with_body(xml)
        .create_async()
        .await;

    let result = tools_for(&server)
        .execute("pubmed_summary", json!({"pmids": ["222", "111"]}))
        .await
        .unwrap();

    let summaries = result.as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["pmid"], "222");
    assert_eq!(summaries[0]["abstract_snippet"], "");
    assert_eq!(summaries[1]["journal"], "Cell (2021)");
    let snippet = summaries[1]["abstract_snippet"].as_str().unwrap();
    assert!(snippet.ends_with("..."));
    assert!(snippet.chars().count() <= 203);
}

#[tokio::test]
async fn test_reddit_requires_credentials() {
    let server = Server::new_async().await;
    let err = tools_for(&server)
        .execute("reddit_search", json!({"query": "crispr"}))
        .await
        .unwrap_err();
    assert!(err.starts_with("Authentication error"));
}

#[tokio::test]
async fn test_crossref_works_search_with_filters() {
    let mut server = Server::new_async().await;
    let works = server
        .mock("GET", Matcher::Regex(r"^/crossref/works".into()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query".into(), "numpy".into()),
            Matcher::UrlEncoded("rows".into(), "20".into()),
            Matcher::UrlEncoded(
                "filter".into(),
                "from-pub-date:2020,type:journal-article".into(),
            ),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            json!({"message": {"total-results": 1, "items": [
                {"DOI": DOI, "title": ["Array programming with NumPy"], "container-title": ["Nature"]}
            ]}})
            .to_string(),
        )
        .create_async()
        .await;

    let result = tools_for(&server)
        .execute(
            "crossref_works_search",
            json!({"query": "numpy", "filter_dict": {"type": "journal-article", "from-pub-date": 2020}}),
        )
        .await
        .unwrap();

    assert_eq!(result["total_results"], 1);
    assert_eq!(result["items"][0]["venue"], "Nature");
    works.assert_async().await;
}
