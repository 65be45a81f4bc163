//! Chat completion request and response

use crate::Message;
use serde::{Deserialize, Serialize};

/// One chat completion call
///
/// The system prompt is kept apart from the turns; providers decide where
/// it goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub max_tokens: usize,
    /// `None` leaves the provider default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub const DEFAULT_MAX_TOKENS: usize = 1024;

    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages: Vec::new(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Append a user turn
    pub fn with_user(self, text: impl Into<String>) -> Self {
        self.with_message(Message::user(text))
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Characters across the system prompt and every turn
    pub fn prompt_chars(&self) -> usize {
        let system = self.system.as_deref().map_or(0, |s| s.chars().count());
        system
            + self
                .messages
                .iter()
                .map(|m| m.text().chars().count())
                .sum::<usize>()
    }
}

/// Why generation ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    #[default]
    Stop,
    /// Cut off at `max_tokens`
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    /// Parse an OpenAI-style `finish_reason`; a missing value counts as a normal stop
    pub fn parse(reason: Option<&str>) -> Self {
        match reason {
            None | Some("stop") => Self::Stop,
            Some("length") => Self::Length,
            Some("content_filter") => Self::ContentFilter,
            Some(_) => Self::Other,
        }
    }
}

/// Tokens billed for a call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Assistant answer to a [`CompletionRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// A finished answer with no usage information
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: FinishReason::Stop,
            usage: TokenUsage::default(),
        }
    }

    /// Whether the answer hit the token limit
    pub fn is_truncated(&self) -> bool {
        self.finish_reason == FinishReason::Length
    }
}
