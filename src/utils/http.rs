//! HTTP client utilities.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client with sensible defaults.
///
/// Every outbound call goes through the same client, so the configured
/// timeout applies uniformly. There is no retry layer.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client from the HTTP section of the configuration
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        Self::with_user_agent(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }

    /// Create a client with a custom user agent and request timeout
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a request and map transport failures and non-2xx statuses to
    /// `SourceError` (404 becomes `NotFound`, anything else `Api`).
    pub async fn send(
        &self,
        request: RequestBuilder,
        provider: &str,
    ) -> Result<Response, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("{} request failed: {}", provider, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::debug!(provider, %status, url = %response.url(), "non-success response");
        if status == StatusCode::NOT_FOUND {
            Err(SourceError::NotFound(format!(
                "{} returned 404 for {}",
                provider,
                response.url().path()
            )))
        } else {
            Err(SourceError::Api(format!(
                "{} API returned status: {}",
                provider, status
            )))
        }
    }

    /// Send and decode a JSON body
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        provider: &str,
    ) -> Result<T, SourceError> {
        let response = self.send(request, provider).await?;
        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse {} JSON: {}", provider, e)))
    }

    /// Send and read the body as text
    pub async fn send_text(
        &self,
        request: RequestBuilder,
        provider: &str,
    ) -> Result<String, SourceError> {
        let response = self.send(request, provider).await?;
        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read {} response: {}", provider, e)))
    }
}
