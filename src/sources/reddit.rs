//! Reddit search over the OAuth API.
//!
//! Reddit results are discussion threads, not bibliographic records, so this
//! adapter does not implement [`Source`](crate::sources::Source) and returns
//! the provider's own submission and comment objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::sources::SourceError;
use crate::utils::HttpClient;

const PROVIDER: &str = "Reddit";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// `reddit_comments` output: the submission and its flattened comment tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedditComments {
    pub submission: Value,
    pub comments: Vec<Value>,
}

/// Reddit source using app-only (client credentials) OAuth
#[derive(Debug, Clone)]
pub struct RedditSource {
    client: HttpClient,
    auth_url: String,
    api_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl RedditSource {
    /// Create a Reddit source from the configuration. Missing credentials
    /// are only reported when a call is made.
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        Ok(Self::with_client(
            HttpClient::new(&config.http)?,
            &config.endpoints.reddit_auth,
            &config.endpoints.reddit_api,
            config.api_keys.reddit_client_id.clone(),
            config.api_keys.reddit_client_secret.clone(),
        ))
    }

    /// Create with a custom HTTP client and endpoints
    pub fn with_client(
        client: HttpClient,
        auth_url: &str,
        api_url: &str,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            client,
            auth_url: auth_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        }
    }

    /// Mint a bearer token. Tokens are not cached: every call mints a new one.
    async fn token(&self) -> Result<String, SourceError> {
        let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) else {
            return Err(SourceError::Auth(
                "Reddit credentials are not configured (REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET)"
                    .to_string(),
            ));
        };

        let url = format!("{}/api/v1/access_token", self.auth_url);
        let request = self
            .client
            .post(&url)
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials")]);

        let token: TokenResponse = self
            .client
            .send_json(request, PROVIDER)
            .await
            .map_err(|e| match e {
                SourceError::Api(msg) => SourceError::Auth(msg),
                other => other,
            })?;
        Ok(token.access_token)
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, SourceError> {
        let token = self.token().await?;
        let url = format!("{}{}", self.api_url, path);
        tracing::debug!(%url, "Reddit request");
        self.client
            .send_json(self.client.get(&url).bearer_auth(token).query(params), PROVIDER)
            .await
    }

    /// `data` of every child of a Listing
    fn listing_children(listing: &Value) -> Vec<Value> {
        listing["data"]["children"]
            .as_array()
            .map(|children| children.iter().map(|c| c["data"].clone()).collect())
            .unwrap_or_default()
    }

    /// `reddit_search` across all of Reddit
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        sort: &str,
        search_type: &str,
    ) -> Result<Vec<Value>, SourceError> {
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("sort", sort.to_string()),
            ("type", search_type.to_string()),
        ];
        let listing = self.get_json("/search", &params).await?;
        Ok(Self::listing_children(&listing))
    }

    /// `reddit_subreddit_search`, restricted to one subreddit
    pub async fn subreddit_search(
        &self,
        subreddit: &str,
        query: &str,
        limit: usize,
        sort: &str,
    ) -> Result<Vec<Value>, SourceError> {
        let subreddit = subreddit.trim_start_matches("r/");
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("sort", sort.to_string()),
            ("restrict_sr", "true".to_string()),
        ];
        let path = format!("/r/{}/search", urlencoding::encode(subreddit));
        let listing = self.get_json(&path, &params).await?;
        Ok(Self::listing_children(&listing))
    }

    /// `reddit_comments`: the submission plus its comments in pre-order
    pub async fn comments(&self, submission_id: &str, limit: usize) -> Result<RedditComments, SourceError> {
        let id = submission_id.trim_start_matches("t3_");
        let path = format!("/comments/{}", urlencoding::encode(id));
        let response = self.get_json(&path, &[("limit", limit.to_string())]).await?;

        let listings = response
            .as_array()
            .ok_or_else(|| SourceError::Parse("Expected a pair of listings from Reddit".to_string()))?;

        let submission = listings
            .first()
            .map(Self::listing_children)
            .and_then(|children| children.into_iter().next())
            .ok_or_else(|| SourceError::NotFound(format!("Reddit submission {}", id)))?;

        let comments = listings.get(1).map(Self::flatten_comments).unwrap_or_default();

        Ok(RedditComments {
            submission,
            comments,
        })
    }

    /// Flatten a comment Listing depth-first, parents before their replies.
    /// Only `t1` (comment) nodes are kept; `more` stubs are skipped and each
    /// comment loses its nested `replies`.
    pub fn flatten_comments(listing: &Value) -> Vec<Value> {
        let mut flat = Vec::new();
        let mut stack = children_rev(listing);

        while let Some(node) = stack.pop() {
            if node["kind"] != "t1" {
                continue;
            }

            // `replies` is "" for leaves and a Listing otherwise
            let replies = &node["data"]["replies"];
            if replies.is_object() {
                stack.extend(children_rev(replies));
            }

            let data = match node["data"].as_object() {
                Some(fields) => Value::Object(
                    fields
                        .iter()
                        .filter(|(key, _)| key.as_str() != "replies")
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect(),
                ),
                None => node["data"].clone(),
            };
            flat.push(data);
        }

        flat
    }
}

/// Children of a Listing, last first, ready to be used as a stack
fn children_rev(listing: &Value) -> Vec<&Value> {
    listing["data"]["children"]
        .as_array()
        .map(|c| c.iter().rev().collect())
        .unwrap_or_default()
}
