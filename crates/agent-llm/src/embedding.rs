//! Embedding provider trait and types
//!
//! Embeddings turn text into dense vectors so that related passages can be
//! found by cosine similarity.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request for generating embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model to use for embedding
    pub model: String,
    /// Input texts to embed
    pub input: Vec<String>,
}

impl EmbeddingRequest {
    pub fn new(model: impl Into<String>, input: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input,
        }
    }

    /// Request for a single text
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(model, vec![text.into()])
    }
}

/// A single embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The embedding vector
    pub vector: Vec<f32>,
    /// Index of the input text this embedding corresponds to
    pub index: usize,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, index: usize) -> Self {
        Self { vector, index }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Cosine similarity with another embedding
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.vector, &other.vector)
    }
}

/// Cosine similarity of two vectors
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Response from an embedding request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Embeddings ordered by input index
    pub embeddings: Vec<Embedding>,
    /// Model that produced the vectors
    pub model: Option<String>,
    /// Tokens consumed, when reported
    pub total_tokens: Option<usize>,
}

impl EmbeddingResponse {
    /// Consume the response and return vectors in input order
    pub fn into_vectors(mut self) -> Vec<Vec<f32>> {
        self.embeddings.sort_by_key(|e| e.index);
        self.embeddings.into_iter().map(|e| e.vector).collect()
    }
}

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Get the provider name
    fn name(&self) -> &str;
}
