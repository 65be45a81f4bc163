//! Thin chat wrapper shared by the agents

use crate::config::EvConfig;
use crate::error::Result;
use agent_llm::{CompletionRequest, LLMProvider};
use std::sync::Arc;
use tracing::{debug, warn};

/// A provider bound to a model and sampling settings
#[derive(Clone)]
pub struct ChatModel {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl ChatModel {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 4096,
        }
    }

    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &EvConfig) -> Self {
        Self {
            provider,
            model: config.llm_model.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn completion, returning the assistant text
    pub async fn invoke(&self, system: Option<&str>, user: &str) -> Result<String> {
        let mut request = CompletionRequest::new(&self.model)
            .with_user(user)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature);
        if let Some(system) = system {
            request = request.with_system(system);
        }

        debug!(
            provider = self.provider.name(),
            model = self.model.as_str(),
            prompt_chars = request.prompt_chars(),
            "Sending completion request"
        );
        let response = self.provider.complete(request).await?;
        if response.is_truncated() {
            warn!(
                max_tokens = self.max_tokens,
                "Completion hit the token limit; answer is cut short"
            );
        }
        Ok(response.content.trim().to_string())
    }
}

impl std::fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModel")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted stand-ins for the external services

    use agent_llm::{
        CompletionRequest, CompletionResponse, Embedding, EmbeddingProvider, EmbeddingRequest,
        EmbeddingResponse, LLMError, LLMProvider,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a queue, then with a fixed default; records every request
    #[derive(Default)]
    pub struct ScriptedLlm {
        replies: Mutex<VecDeque<String>>,
        default_reply: String,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(ToString::to_string).collect()),
                ..Self::default()
            }
        }

        pub fn with_default(mut self, reply: &str) -> Self {
            self.default_reply = reply.to_string();
            self
        }

        /// User text of every request so far
        pub fn prompts(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.messages.iter().map(|m| m.text().to_string()).collect())
                .collect()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedLlm {
        async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default_reply.clone());
            Ok(CompletionResponse::text(reply))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Always fails
    pub struct FailingLlm;

    #[async_trait]
    impl LLMProvider for FailingLlm {
        async fn complete(&self, _request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
            Err(LLMError::from_status(503, "service unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Bag-of-keywords embedding: one dimension per keyword
    pub struct KeywordEmbedder {
        pub keywords: Vec<&'static str>,
        pub calls: Mutex<usize>,
    }

    impl KeywordEmbedder {
        pub fn new(keywords: &[&'static str]) -> Self {
            Self {
                keywords: keywords.to_vec(),
                calls: Mutex::new(0),
            }
        }

        fn vector(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            let mut vector: Vec<f32> = self
                .keywords
                .iter()
                .map(|k| lower.matches(k).count() as f32)
                .collect();
            // Keeps texts without any keyword away from the zero vector
            vector.push(0.1);
            vector
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, request: EmbeddingRequest) -> agent_llm::Result<EmbeddingResponse> {
            *self.calls.lock().unwrap() += 1;
            Ok(EmbeddingResponse {
                embeddings: request
                    .input
                    .iter()
                    .enumerate()
                    .map(|(i, text)| Embedding::new(self.vector(text), i))
                    .collect(),
                model: Some(request.model),
                total_tokens: None,
            })
        }

        fn name(&self) -> &str {
            "keywords"
        }
    }
}
