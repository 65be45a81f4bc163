//! Market research: web search, source filtering and an LLM market report

use crate::api::{FetchedPage, SearchBackend, SearchResult, WebContentFetcher};
use crate::config::EvConfig;
use crate::error::Result;
use crate::llm::ChatModel;
use crate::prompts::{MARKET_SYNTHESIS, MARKET_SYSTEM, Prompts};
use crate::schema::MarketResearchOutput;
use crate::tools::document_loader::{Document, META_SOURCE_URL};
use crate::utils::{
    deduplicate_results, extract_json_from_text, filter_reliable_sources, truncate_chars,
    truncate_documents,
};
use agent_core::state::keys;
use agent_core::{Agent, AgentState, StateUpdate};
use agent_prompt::Language;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

pub const MARKET_RESEARCHER: &str = "Market_Researcher";

const BASE_QUERIES: [&str; 8] = [
    "electric vehicle market trends 2025",
    "EV sales growth forecast 2025",
    "전기차 시장 전망 2025",
    "lithium battery supply chain issues 2025",
    "EV market outlook Asia Pacific",
    "전기차 배터리 공급망",
    "Tesla BYD market share 2025",
    "electric vehicle industry challenges",
];

/// Search queries for a request: the fixed set plus company-specific extras
pub fn search_queries(user_request: &str) -> Vec<String> {
    let mut queries: Vec<String> = BASE_QUERIES.iter().map(ToString::to_string).collect();
    if user_request.contains("Tesla") || user_request.contains("테슬라") {
        queries.push("Tesla market strategy 2025".to_string());
    }
    if user_request.contains("BYD") {
        queries.push("BYD electric vehicle growth".to_string());
    }
    queries
}

fn default_request(language: Language) -> &'static str {
    match language {
        Language::Korean => "전기차 시장 분석",
        _ => "EV market analysis",
    }
}

/// Report plus the pages it was written from
#[derive(Debug, Clone)]
pub struct MarketResearch {
    pub output: MarketResearchOutput,
    pub pages: Vec<FetchedPage>,
}

/// Researches the EV market from web sources
pub struct MarketResearcherAgent {
    search: Arc<dyn SearchBackend>,
    fetcher: WebContentFetcher,
    chat: ChatModel,
    prompts: Prompts,
    max_documents: usize,
    max_doc_chars: usize,
    max_context_tokens: usize,
}

impl MarketResearcherAgent {
    pub fn new(
        search: Arc<dyn SearchBackend>,
        fetcher: WebContentFetcher,
        chat: ChatModel,
        prompts: Prompts,
        config: &EvConfig,
    ) -> Self {
        Self {
            search,
            fetcher,
            chat,
            prompts,
            max_documents: config.max_documents,
            max_doc_chars: config.max_doc_chars,
            max_context_tokens: config.max_context_tokens,
        }
    }

    /// Run the full research flow for one request
    pub async fn research(&self, user_request: &str) -> Result<MarketResearch> {
        let queries = search_queries(user_request);
        info!(queries = queries.len(), "Generated search queries");

        let results = self.execute_searches(&queries).await;
        info!(results = results.len(), "Collected search results");

        let filtered = deduplicate_results(filter_reliable_sources(results));
        info!(results = filtered.len(), "Results after source filtering");

        let top: Vec<SearchResult> = filtered.into_iter().take(self.max_documents).collect();
        let urls: Vec<String> = top.iter().map(|r| r.url.clone()).collect();
        let pages = self.fetcher.fetch_multiple(&urls).await;
        info!(documents = pages.len(), "Loaded documents");

        let texts: Vec<String> = pages.iter().map(|p| p.text.clone()).collect();
        let texts = truncate_documents(&texts, self.max_context_tokens);

        let analysis = self.analyze_with_llm(&texts, &pages, &top).await?;
        let output = match extract_json_from_text(&analysis) {
            Some(map) => MarketResearchOutput::from_analysis(&map, urls),
            None => {
                warn!("Could not parse JSON from the LLM answer, using the raw text");
                MarketResearchOutput::fallback(&analysis, self.prompts.language(), urls)
            }
        };

        Ok(MarketResearch { output, pages })
    }

    async fn execute_searches(&self, queries: &[String]) -> Vec<SearchResult> {
        let mut all = Vec::new();
        for query in queries {
            info!(query = query.as_str(), "Searching");
            all.extend(self.search.search_web(query).await);
        }
        deduplicate_results(all)
    }

    /// `pages[i]` is the source of `texts[i]`
    async fn analyze_with_llm(
        &self,
        texts: &[String],
        pages: &[FetchedPage],
        results: &[SearchResult],
    ) -> Result<String> {
        let documents = texts
            .iter()
            .enumerate()
            .map(|(i, text)| format!("[{}]\n{}", i + 1, truncate_chars(text, self.max_doc_chars)))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        let sources = pages
            .iter()
            .take(texts.len())
            .enumerate()
            .map(|(i, page)| {
                let title = results
                    .iter()
                    .find(|r| r.url == page.url)
                    .map_or("", |r| r.title.as_str());
                format!("[{}] {} - {}", i + 1, title, page.url)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let system = self.prompts.render(MARKET_SYSTEM, &json!({}))?;
        let prompt = self.prompts.render(
            MARKET_SYNTHESIS,
            &json!({ "documents": documents, "sources": sources }),
        )?;

        info!("Starting LLM analysis");
        self.chat.invoke(Some(&system), &prompt).await
    }

    fn completion_message(&self, output: &MarketResearchOutput) -> String {
        let (companies, trends, risks) = (
            output.key_companies.len(),
            output.key_trends.len(),
            output.risks.len(),
        );
        match self.prompts.language() {
            Language::Korean => format!(
                "시장 조사를 완료했습니다. {companies}개 주요 기업, {trends}개 주요 트렌드, {risks}개 리스크 요인을 발견했습니다."
            ),
            _ => format!(
                "Market research complete: found {companies} key companies, {trends} key trends and {risks} risk factors."
            ),
        }
    }

    async fn run_inner(&self, state: &AgentState) -> agent_core::Result<StateUpdate> {
        info!("{} started", MARKET_RESEARCHER);

        let user_request = state
            .user_request()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| default_request(self.prompts.language()));
        info!(user_request, "Research request");

        let MarketResearch { output, pages } = self.research(user_request).await?;
        let documents: Vec<Document> = pages
            .into_iter()
            .map(|page| Document::new(page.text).with_metadata(META_SOURCE_URL, page.url))
            .collect();

        let update = StateUpdate::new()
            .set_typed(keys::MARKET_RESEARCH, &output)?
            .set(keys::MARKET_RESEARCH_DONE, Value::Bool(true))
            .set_typed(keys::COMPANIES, &output.key_companies)?
            .set_typed(keys::REFERENCES, &output.sources)?
            .set_typed(keys::DOCUMENTS, &documents)?
            .push_message(MARKET_RESEARCHER, self.completion_message(&output));

        info!("{} complete", MARKET_RESEARCHER);
        Ok(update)
    }
}

#[async_trait]
impl Agent for MarketResearcherAgent {
    async fn run(&self, state: &AgentState) -> agent_core::Result<StateUpdate> {
        self.run_inner(state)
            .instrument(info_span!("agent", name = MARKET_RESEARCHER))
            .await
    }

    fn name(&self) -> &str {
        MARKET_RESEARCHER
    }
}
