//! Chat completion provider trait

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A chat completion backend
///
/// Agents hold an `Arc<dyn LLMProvider>`; tests swap in scripted providers.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}
