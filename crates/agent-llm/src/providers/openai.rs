//! OpenAI chat completions and embeddings
//!
//! Any server speaking the same API (LM Studio, vLLM, Azure proxies) works
//! through [`OpenAIConfig::with_api_base`].
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> agent_llm::Result<()> {
//! let provider = OpenAIProvider::with_config(OpenAIConfig::new("sk-..."))?;
//! let request = CompletionRequest::new("gpt-4o-mini")
//!     .with_system("You are an EV industry analyst")
//!     .with_user("Which battery makers supply Tesla?");
//! println!("{}", provider.complete(request).await?.content);
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, Embedding, EmbeddingProvider, EmbeddingRequest,
    EmbeddingResponse, FinishReason, LLMError, LLMProvider, Message, Result, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL without a trailing slash
    pub api_base: String,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the chat completions and embeddings endpoints
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "OpenAI API key is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// POST a JSON body and decode the JSON answer
    async fn call<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = wire::ChatRequest::from_request(&request);
        let answer: wire::ChatResponse = self.call("chat/completions", &body).await?;

        let choice = answer
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("no choices returned".to_string()))?;
        let finish_reason = FinishReason::parse(choice.finish_reason.as_deref());
        if finish_reason == FinishReason::ContentFilter {
            warn!("Completion stopped by the content filter");
        }
        let usage = answer.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });
        debug!(?finish_reason, tokens = usage.total(), "Completion received");

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason,
            usage,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    #[instrument(skip_all, fields(model = %request.model, inputs = request.input.len()))]
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        if request.input.is_empty() {
            return Ok(EmbeddingResponse {
                embeddings: Vec::new(),
                model: Some(request.model),
                total_tokens: Some(0),
            });
        }

        let answer: wire::EmbeddingsResponse = self.call("embeddings", &request).await?;
        if answer.data.len() != request.input.len() {
            return Err(LLMError::UnexpectedResponse(format!(
                "asked for {} embeddings, got {}",
                request.input.len(),
                answer.data.len()
            )));
        }

        Ok(EmbeddingResponse {
            embeddings: answer
                .data
                .into_iter()
                .map(|d| Embedding::new(d.embedding, d.index))
                .collect(),
            model: Some(answer.model),
            total_tokens: answer.usage.map(|u| u.total_tokens),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// JSON shapes of the OpenAI endpoints
mod wire {
    use super::{CompletionRequest, Message};
    use serde::{Deserialize, Serialize};
    use std::borrow::Cow;

    #[derive(Serialize)]
    pub struct ChatRequest<'a> {
        pub model: &'a str,
        pub messages: Vec<Cow<'a, Message>>,
        pub max_tokens: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub temperature: Option<f32>,
    }

    impl<'a> ChatRequest<'a> {
        /// The system prompt becomes the leading `system` message
        pub fn from_request(request: &'a CompletionRequest) -> Self {
            let system = request
                .system
                .as_deref()
                .map(|s| Cow::Owned(Message::system(s)));
            Self {
                model: &request.model,
                messages: system
                    .into_iter()
                    .chain(request.messages.iter().map(Cow::Borrowed))
                    .collect(),
                max_tokens: request.max_tokens,
                temperature: request.temperature,
            }
        }
    }

    #[derive(Deserialize)]
    pub struct ChatResponse {
        pub choices: Vec<Choice>,
        pub usage: Option<ChatUsage>,
    }

    #[derive(Deserialize)]
    pub struct Choice {
        pub message: ChoiceMessage,
        pub finish_reason: Option<String>,
    }

    #[derive(Deserialize)]
    pub struct ChoiceMessage {
        pub content: Option<String>,
    }

    #[derive(Deserialize)]
    pub struct ChatUsage {
        pub prompt_tokens: usize,
        pub completion_tokens: usize,
    }

    #[derive(Deserialize)]
    pub struct EmbeddingsResponse {
        pub data: Vec<EmbeddingData>,
        pub model: String,
        pub usage: Option<EmbeddingsUsage>,
    }

    #[derive(Deserialize)]
    pub struct EmbeddingData {
        pub embedding: Vec<f32>,
        pub index: usize,
    }

    #[derive(Deserialize)]
    pub struct EmbeddingsUsage {
        pub total_tokens: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config() {
        let provider = OpenAIProvider::with_config(
            OpenAIConfig::new("sk-test")
                .with_api_base("http://localhost:1234/v1/")
                .with_timeout(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(provider.config().api_base, "http://localhost:1234/v1");
        assert_eq!(provider.config().timeout, Duration::from_secs(30));
        assert_eq!(LLMProvider::name(&provider), "openai");

        assert!(matches!(
            OpenAIProvider::new(" "),
            Err(LLMError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_chat_body() {
        let request = CompletionRequest::new("gpt-4o-mini")
            .with_system("You are an EV analyst")
            .with_user("Compare CATL and BYD")
            .with_temperature(0.0);

        let body = serde_json::to_value(wire::ChatRequest::from_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "You are an EV analyst" },
                    { "role": "user", "content": "Compare CATL and BYD" }
                ],
                "max_tokens": 1024,
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn test_chat_response_shape() {
        let answer: wire::ChatResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": null },
                "finish_reason": "length"
            }]
        }))
        .unwrap();
        assert!(answer.usage.is_none());
        assert!(answer.choices[0].message.content.is_none());
        assert_eq!(
            FinishReason::parse(answer.choices[0].finish_reason.as_deref()),
            FinishReason::Length
        );
    }

    #[test]
    fn test_embedding_body_and_response() {
        let request = EmbeddingRequest::new("text-embedding-3-small", vec!["LFP cells".into()]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "model": "text-embedding-3-small", "input": ["LFP cells"] })
        );

        let answer: wire::EmbeddingsResponse = serde_json::from_value(json!({
            "object": "list",
            "data": [{ "object": "embedding", "embedding": [0.5, -0.5], "index": 0 }],
            "model": "text-embedding-3-small",
            "usage": { "prompt_tokens": 3, "total_tokens": 3 }
        }))
        .unwrap();
        assert_eq!(answer.data[0].embedding, vec![0.5, -0.5]);
        assert_eq!(answer.usage.map(|u| u.total_tokens), Some(3));
    }

    #[tokio::test]
    async fn test_embed_nothing_without_request() {
        let provider = OpenAIProvider::new("sk-test").unwrap();
        let response = provider
            .embed(EmbeddingRequest::new("text-embedding-3-small", Vec::new()))
            .await
            .unwrap();
        assert!(response.embeddings.is_empty());
        assert_eq!(response.total_tokens, Some(0));
    }
}
