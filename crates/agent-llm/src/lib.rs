//! LLM access for the EV analysis agents
//!
//! Chat completions go through [`LLMProvider`], embeddings for the retrieval
//! index through [`EmbeddingProvider`]. The OpenAI implementation of both
//! lives in [`providers`] behind the `openai` feature and also works with
//! OpenAI-compatible servers via a custom API base.

pub mod completion;
pub mod embedding;
pub mod error;
pub mod messages;
pub mod provider;

pub use completion::{CompletionRequest, CompletionResponse, FinishReason, TokenUsage};
pub use embedding::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, cosine_similarity,
};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

#[cfg(feature = "openai")]
pub mod providers;
