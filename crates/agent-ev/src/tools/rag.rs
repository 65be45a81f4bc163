//! Retrieval-augmented answering over collected documents

use crate::config::EvConfig;
use crate::error::{EvError, Result};
use crate::llm::ChatModel;
use crate::prompts::{Prompts, RAG_STUFF};
use crate::tools::document_loader::Document;
use agent_llm::{EmbeddingProvider, EmbeddingRequest, cosine_similarity};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VectorEntry {
    document: Document,
    embedding: Vec<f32>,
}

/// In-memory embedding index searched by cosine similarity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorStore {
    /// Embedding model the vectors came from
    model: String,
    entries: Vec<VectorEntry>,
}

impl VectorStore {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            entries: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, document: Document, embedding: Vec<f32>) {
        self.entries.push(VectorEntry {
            document,
            embedding,
        });
    }

    /// The `k` most similar documents, best first; ties keep insertion order
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(&Document, f32)> {
        let mut scored: Vec<(&Document, f32)> = self
            .entries
            .iter()
            .map(|entry| (&entry.document, cosine_similarity(query, &entry.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_vec(self)?).await?;
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Embedding index plus an LLM that answers from the retrieved chunks
pub struct RagTool {
    embedder: Arc<dyn EmbeddingProvider>,
    chat: ChatModel,
    prompts: Prompts,
    embedding_model: String,
    top_k: usize,
    batch_size: usize,
    store: Option<VectorStore>,
}

impl RagTool {
    /// The answering model always runs at temperature 0
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        chat: ChatModel,
        prompts: Prompts,
        config: &EvConfig,
    ) -> Self {
        Self {
            embedder,
            chat: chat.with_temperature(0.0),
            prompts,
            embedding_model: config.embedding_model.clone(),
            top_k: config.rag_top_k,
            batch_size: config.embedding_batch_size.max(1),
            store: None,
        }
    }

    pub fn is_built(&self) -> bool {
        self.store.is_some()
    }

    pub fn vectorstore(&self) -> Option<&VectorStore> {
        self.store.as_ref()
    }

    /// Embed every document and replace the index
    ///
    /// An empty input leaves the tool unbuilt.
    pub async fn build_vectorstore(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            warn!("No documents, vector index not built");
            self.store = None;
            return Ok(());
        }

        info!(documents = documents.len(), "Building vector index");
        let mut store = VectorStore::new(&self.embedding_model);

        for batch in documents.chunks(self.batch_size) {
            let texts = batch.iter().map(|d| d.content.clone()).collect();
            let vectors = self
                .embedder
                .embed(EmbeddingRequest::new(&self.embedding_model, texts))
                .await?
                .into_vectors();

            if vectors.len() != batch.len() {
                return Err(EvError::Api(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            for (document, vector) in batch.iter().zip(vectors) {
                store.add(document.clone(), vector);
            }
        }

        info!(entries = store.len(), "Vector index built");
        self.store = Some(store);
        Ok(())
    }

    /// The `k` chunks closest to `query`; empty when unbuilt
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };

        let vector = self.embed_query(query).await?;
        Ok(store
            .search(&vector, k)
            .into_iter()
            .map(|(doc, _)| doc.clone())
            .collect())
    }

    /// Answer `question` from the top-k chunks
    pub async fn query(&self, question: &str) -> Result<String> {
        if self.store.is_none() {
            return Err(EvError::IndexNotBuilt);
        }

        let chunks = self.similarity_search(question, self.top_k).await?;
        debug!(question, chunks = chunks.len(), "Retrieved context");

        let context = chunks
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = self.prompts.render(
            RAG_STUFF,
            &json!({ "context": context, "question": question }),
        )?;

        self.chat.invoke(None, &prompt).await
    }

    /// Write the index to a JSON file; a no-op when unbuilt
    pub async fn save_vectorstore(&self, path: &Path) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(path).await?;
            info!(path = %path.display(), "Vector index saved");
        }
        Ok(())
    }

    pub async fn load_vectorstore(&mut self, path: &Path) -> Result<()> {
        let store = VectorStore::load(path).await?;
        if store.model() != self.embedding_model {
            warn!(
                stored = store.model(),
                configured = self.embedding_model.as_str(),
                "Vector index was built with a different embedding model"
            );
        }
        info!(path = %path.display(), entries = store.len(), "Vector index loaded");
        self.store = Some(store);
        Ok(())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed(EmbeddingRequest::single(&self.embedding_model, query))
            .await?
            .into_vectors()
            .into_iter()
            .next()
            .ok_or_else(|| EvError::Api("embedding response was empty".to_string()))
    }
}
