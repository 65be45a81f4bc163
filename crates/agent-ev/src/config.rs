//! Configuration for the EV market agents

use crate::error::{EvError, Result};
use agent_prompt::Language;
use agent_utils::Settings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Tunables shared by the agents and their tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvConfig {
    /// Chat model used by every agent
    pub llm_model: String,

    /// Sampling temperature
    pub llm_temperature: f32,

    /// Maximum tokens per LLM answer
    pub llm_max_tokens: usize,

    /// Embedding model for the RAG index
    pub embedding_model: String,

    /// Language of prompts and reports
    pub language: Language,

    /// Results requested per search query
    pub search_max_results: usize,

    /// Search requests allowed per minute
    pub search_rate_per_minute: u32,

    /// Timeout for a single page download
    pub fetch_timeout: Duration,

    /// Accept invalid TLS certificates when fetching pages
    pub accept_invalid_certs: bool,

    /// Pages fetched by the market researcher
    pub max_documents: usize,

    /// Characters of each document shown to the LLM
    pub max_doc_chars: usize,

    /// Token budget for the research context
    pub max_context_tokens: usize,

    /// Chunk size for the RAG splitter (characters)
    pub chunk_size: usize,

    /// Overlap between consecutive chunks (characters)
    pub chunk_overlap: usize,

    /// Chunks retrieved per RAG question
    pub rag_top_k: usize,

    /// Texts per embedding request
    pub embedding_batch_size: usize,

    /// Directory for cached market data
    pub cache_dir: PathBuf,

    /// Freshness window for cached market data
    pub cache_ttl: Duration,

    /// Attempts per market-data fetch
    pub max_retries: u32,

    /// Wait after an empty market-data answer
    pub empty_retry_delay: Duration,

    /// Wait after a failed market-data request
    pub error_retry_delay: Duration,

    /// Days of price history analysed
    pub history_days: i64,

    /// Companies analysed per run
    pub max_companies: usize,

    /// Pages fetched per company
    pub max_urls_per_company: usize,
}

impl Default for EvConfig {
    fn default() -> Self {
        Self {
            llm_model: Settings::DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: 0.0,
            llm_max_tokens: 4096,
            embedding_model: Settings::DEFAULT_EMBEDDING_MODEL.to_string(),
            language: Language::English,
            search_max_results: Settings::DEFAULT_TAVILY_MAX_RESULTS,
            search_rate_per_minute: 60,
            fetch_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
            max_documents: 10,
            max_doc_chars: 3000,
            max_context_tokens: 8000,
            chunk_size: 1000,
            chunk_overlap: 200,
            rag_top_k: 5,
            embedding_batch_size: 64,
            cache_dir: PathBuf::from(Settings::DEFAULT_CACHE_DIR),
            cache_ttl: Duration::from_secs(Settings::DEFAULT_CACHE_HOURS * 3600),
            max_retries: Settings::DEFAULT_MAX_RETRIES,
            empty_retry_delay: Duration::from_secs(1),
            error_retry_delay: Duration::from_secs(2),
            history_days: 90,
            max_companies: 5,
            max_urls_per_company: 10,
        }
    }
}

impl EvConfig {
    /// Create a new configuration builder
    pub fn builder() -> EvConfigBuilder {
        EvConfigBuilder::default()
    }

    /// Derive the configuration from loaded settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::builder()
            .llm_model(settings.llm_model.clone())
            .llm_temperature(settings.llm_temperature)
            .embedding_model(settings.embedding_model.clone())
            .language(Language::from_code(&settings.report_language))
            .search_max_results(settings.tavily_max_results)
            .cache_dir(settings.finance_cache_dir.clone())
            .cache_ttl(Duration::from_secs(settings.finance_cache_hours * 3600))
            .max_retries(settings.finance_max_retries)
            .build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(EvError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(EvError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(EvError::Config(format!(
                "llm_temperature must be within 0.0..=2.0, got {}",
                self.llm_temperature
            )));
        }

        if self.search_max_results == 0 || self.search_rate_per_minute == 0 {
            return Err(EvError::Config(
                "search limits must be greater than 0".to_string(),
            ));
        }

        if self.rag_top_k == 0 || self.embedding_batch_size == 0 {
            return Err(EvError::Config(
                "rag_top_k and embedding_batch_size must be greater than 0".to_string(),
            ));
        }

        if self.max_companies == 0 || self.history_days <= 0 {
            return Err(EvError::Config(
                "max_companies and history_days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for EvConfig
#[derive(Debug, Default)]
pub struct EvConfigBuilder {
    llm_model: Option<String>,
    llm_temperature: Option<f32>,
    llm_max_tokens: Option<usize>,
    embedding_model: Option<String>,
    language: Option<Language>,
    search_max_results: Option<usize>,
    search_rate_per_minute: Option<u32>,
    fetch_timeout: Option<Duration>,
    accept_invalid_certs: Option<bool>,
    max_documents: Option<usize>,
    max_context_tokens: Option<usize>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    rag_top_k: Option<usize>,
    cache_dir: Option<PathBuf>,
    cache_ttl: Option<Duration>,
    max_retries: Option<u32>,
    empty_retry_delay: Option<Duration>,
    error_retry_delay: Option<Duration>,
    history_days: Option<i64>,
    max_companies: Option<usize>,
}

impl EvConfigBuilder {
    /// Set the chat model
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.llm_model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn llm_temperature(mut self, temperature: f32) -> Self {
        self.llm_temperature = Some(temperature);
        self
    }

    /// Set the answer token limit
    pub fn llm_max_tokens(mut self, max_tokens: usize) -> Self {
        self.llm_max_tokens = Some(max_tokens);
        self
    }

    /// Set the embedding model
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    /// Set the report language
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Set results per search query
    pub fn search_max_results(mut self, results: usize) -> Self {
        self.search_max_results = Some(results);
        self
    }

    /// Set the search rate limit
    pub fn search_rate_per_minute(mut self, rate: u32) -> Self {
        self.search_rate_per_minute = Some(rate);
        self
    }

    /// Set the page download timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Accept invalid TLS certificates when fetching pages
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = Some(accept);
        self
    }

    /// Set how many pages the market researcher reads
    pub fn max_documents(mut self, documents: usize) -> Self {
        self.max_documents = Some(documents);
        self
    }

    /// Set the research context budget in tokens
    pub fn max_context_tokens(mut self, tokens: usize) -> Self {
        self.max_context_tokens = Some(tokens);
        self
    }

    /// Set the chunk size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Set the chunk overlap
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = Some(overlap);
        self
    }

    /// Set chunks retrieved per question
    pub fn rag_top_k(mut self, k: usize) -> Self {
        self.rag_top_k = Some(k);
        self
    }

    /// Set the cache directory
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the cache freshness window
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Set attempts per market-data fetch
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set both retry delays
    pub fn retry_delays(mut self, empty: Duration, error: Duration) -> Self {
        self.empty_retry_delay = Some(empty);
        self.error_retry_delay = Some(error);
        self
    }

    /// Set the analysed history length
    pub fn history_days(mut self, days: i64) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Set companies analysed per run
    pub fn max_companies(mut self, companies: usize) -> Self {
        self.max_companies = Some(companies);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EvConfig> {
        let defaults = EvConfig::default();

        let config = EvConfig {
            llm_model: self.llm_model.unwrap_or(defaults.llm_model),
            llm_temperature: self.llm_temperature.unwrap_or(defaults.llm_temperature),
            llm_max_tokens: self.llm_max_tokens.unwrap_or(defaults.llm_max_tokens),
            embedding_model: self.embedding_model.unwrap_or(defaults.embedding_model),
            language: self.language.unwrap_or(defaults.language),
            search_max_results: self
                .search_max_results
                .unwrap_or(defaults.search_max_results),
            search_rate_per_minute: self
                .search_rate_per_minute
                .unwrap_or(defaults.search_rate_per_minute),
            fetch_timeout: self.fetch_timeout.unwrap_or(defaults.fetch_timeout),
            accept_invalid_certs: self
                .accept_invalid_certs
                .unwrap_or(defaults.accept_invalid_certs),
            max_documents: self.max_documents.unwrap_or(defaults.max_documents),
            max_doc_chars: defaults.max_doc_chars,
            max_context_tokens: self
                .max_context_tokens
                .unwrap_or(defaults.max_context_tokens),
            chunk_size: self.chunk_size.unwrap_or(defaults.chunk_size),
            chunk_overlap: self.chunk_overlap.unwrap_or(defaults.chunk_overlap),
            rag_top_k: self.rag_top_k.unwrap_or(defaults.rag_top_k),
            embedding_batch_size: defaults.embedding_batch_size,
            cache_dir: self.cache_dir.unwrap_or(defaults.cache_dir),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            empty_retry_delay: self
                .empty_retry_delay
                .unwrap_or(defaults.empty_retry_delay),
            error_retry_delay: self
                .error_retry_delay
                .unwrap_or(defaults.error_retry_delay),
            history_days: self.history_days.unwrap_or(defaults.history_days),
            max_companies: self.max_companies.unwrap_or(defaults.max_companies),
            max_urls_per_company: defaults.max_urls_per_company,
        };

        config.validate()?;
        Ok(config)
    }
}
