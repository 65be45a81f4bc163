//! Tavily web search client

use crate::error::{EvError, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// A single web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Snippet chosen by the search engine
    #[serde(default)]
    pub content: String,
    /// Relevance score in `0.0..=1.0`
    #[serde(default)]
    pub score: f64,
    /// Full page text when the engine provides it
    #[serde(default)]
    pub raw_content: Option<String>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, score: f64) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: String::new(),
            score,
            raw_content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// A web search engine
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one query
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Run one query, logging failures and returning no results instead
    async fn search_web(&self, query: &str) -> Vec<SearchResult> {
        match self.search(query).await {
            Ok(results) => {
                debug!(query, results = results.len(), "Search finished");
                results
            }
            Err(e) => {
                warn!(query, "Search failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Tavily search API client
pub struct TavilyClient {
    client: Client,
    api_key: String,
    max_results: usize,
    endpoint: String,
    rate_limiter: SharedRateLimiter,
}

impl TavilyClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `api_key` - Tavily API key
    /// * `max_results` - Results requested per query
    /// * `rate_limit` - Requests per minute
    pub fn new(api_key: impl Into<String>, max_results: usize, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            max_results,
            endpoint: TAVILY_SEARCH_URL.to_string(),
            rate_limiter,
        }
    }

    /// Point the client at another endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn request_body(&self, query: &str) -> serde_json::Value {
        json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
            "search_depth": "advanced",
            "include_answer": true,
            "include_raw_content": true,
            "include_images": false,
        })
    }
}

#[async_trait]
impl SearchBackend for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.request_body(query))
            .send()
            .await
            .map_err(|e| EvError::Api(format!("Tavily request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvError::Api(format!("Tavily API error {status}: {body}")));
        }

        let data: TavilyResponse = response
            .json()
            .await
            .map_err(|e| EvError::Api(format!("Failed to parse Tavily response: {e}")))?;

        Ok(data.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            Err(EvError::Api("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_search_web_swallows_errors() {
        let results = FailingBackend.search_web("EV market 2025").await;
        assert!(results.is_empty());
    }

    #[test]
    fn test_request_body() {
        let client = TavilyClient::new("tv-key", 7, 60);
        let body = client.request_body("battery supply chain");

        assert_eq!(body["query"], "battery supply chain");
        assert_eq!(body["max_results"], 7);
        assert_eq!(body["search_depth"], "advanced");
        assert_eq!(body["include_raw_content"], true);
        assert_eq!(body["include_images"], false);
    }

    #[test]
    fn test_parse_response_with_missing_fields() {
        let data: TavilyResponse = serde_json::from_value(json!({
            "answer": "ignored",
            "results": [
                {"title": "EV sales", "url": "https://www.reuters.com/a", "content": "...", "score": 0.91},
                {"url": "https://example.com/b", "raw_content": "full text"}
            ]
        }))
        .unwrap();

        assert_eq!(data.results.len(), 2);
        assert!((data.results[0].score - 0.91).abs() < f64::EPSILON);
        assert_eq!(data.results[1].title, "");
        assert_eq!(data.results[1].raw_content.as_deref(), Some("full text"));
    }

    #[tokio::test]
    #[ignore] // Requires network access and TAVILY_API_KEY
    async fn test_live_search() {
        let key = std::env::var("TAVILY_API_KEY").unwrap();
        let client = TavilyClient::new(key, 3, 60);
        let results = client.search("global EV sales 2025").await.unwrap();
        assert!(!results.is_empty());
    }
}
