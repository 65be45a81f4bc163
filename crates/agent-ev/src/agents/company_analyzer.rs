//! Company analysis over a RAG index of collected documents

use crate::config::EvConfig;
use crate::error::{EvError, Result};
use crate::llm::ChatModel;
use crate::prompts::{COMPANY_QUESTIONS, COMPANY_SUMMARY, Prompts};
use crate::schema::{CompanyAnalysis, QaPair};
use crate::tools::document_loader::{Document, DocumentLoader};
use crate::tools::rag::RagTool;
use crate::tools::splitter::RecursiveCharacterTextSplitter;
use agent_core::state::keys;
use agent_core::{Agent, AgentState, StateUpdate};
use agent_llm::EmbeddingProvider;
use agent_prompt::Language;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

pub const COMPANY_ANALYZER: &str = "Company_Analyzer";

pub const DEFAULT_COMPANIES: [&str; 5] = [
    "Tesla",
    "BYD",
    "Samsung SDI",
    "LG Energy Solution",
    "CATL",
];

/// Lowercased names recognised in a request and the name they stand for
const KNOWN_COMPANIES: &[(&str, &str)] = &[
    ("tesla", "Tesla"),
    ("테슬라", "Tesla"),
    ("byd", "BYD"),
    ("catl", "CATL"),
    ("samsung sdi", "Samsung SDI"),
    ("삼성sdi", "Samsung SDI"),
    ("lg energy solution", "LG Energy Solution"),
    ("lg에너지솔루션", "LG Energy Solution"),
    ("panasonic", "Panasonic"),
    ("sk on", "SK On"),
    ("hyundai", "Hyundai"),
    ("현대차", "Hyundai"),
    ("kia", "Kia"),
    ("기아", "Kia"),
    ("nio", "NIO"),
    ("rivian", "Rivian"),
    ("volkswagen", "Volkswagen"),
];

fn is_word_char(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_alphanumeric())
}

/// First position of `needle` in `haystack` not glued to other ASCII letters or digits
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !is_word_char(before) && !is_word_char(after)
    })
}

/// Known companies named in a request, in order of appearance
pub fn companies_in_request(request: &str) -> Vec<String> {
    let lowered = request.to_lowercase();
    let mut found: Vec<(usize, &str)> = KNOWN_COMPANIES
        .iter()
        .filter_map(|(alias, name)| find_word(&lowered, alias).map(|pos| (pos, *name)))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, name)| name.to_string()).collect()
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Companies to analyse, highest priority first
///
/// Request mentions come first, then the `companies` list, then the
/// market report's `key_companies` and `major_players`. Names are compared
/// case-insensitively; an empty result falls back to [`DEFAULT_COMPANIES`].
pub fn target_companies(state: &AgentState, limit: usize) -> Vec<String> {
    let research = state.get(keys::MARKET_RESEARCH);
    let candidates = companies_in_request(state.user_request().unwrap_or_default())
        .into_iter()
        .chain(state.string_list(keys::COMPANIES))
        .chain(string_items(research.and_then(|r| r.get("key_companies"))))
        .chain(string_items(research.and_then(|r| r.get("major_players"))));

    let mut targets: Vec<String> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.trim();
        if candidate.is_empty() || targets.iter().any(|t| t.eq_ignore_ascii_case(candidate)) {
            continue;
        }
        targets.push(candidate.to_string());
        if targets.len() == limit {
            break;
        }
    }

    if targets.is_empty() {
        DEFAULT_COMPANIES.iter().take(limit).map(ToString::to_string).collect()
    } else {
        targets
    }
}

/// Analyses companies with retrieval over web documents
pub struct CompanyAnalyzerAgent {
    loader: DocumentLoader,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: ChatModel,
    prompts: Prompts,
    splitter: RecursiveCharacterTextSplitter,
    config: EvConfig,
    index_path: Option<PathBuf>,
}

impl CompanyAnalyzerAgent {
    pub fn new(
        loader: DocumentLoader,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: ChatModel,
        prompts: Prompts,
        config: &EvConfig,
    ) -> Self {
        Self {
            loader,
            embedder,
            chat,
            prompts,
            splitter: RecursiveCharacterTextSplitter::new(config.chunk_size, config.chunk_overlap),
            config: config.clone(),
            index_path: None,
        }
    }

    /// Save each built index to `path`
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = Some(path.into());
        self
    }

    /// Index documents and analyse every company
    ///
    /// Returns the analyses keyed by company.
    pub async fn analyze(
        &self,
        companies: &[String],
        documents: &[Document],
    ) -> Result<BTreeMap<String, CompanyAnalysis>> {
        let mut rag = RagTool::new(
            Arc::clone(&self.embedder),
            self.chat.clone(),
            self.prompts.clone(),
            &self.config,
        );
        rag.build_vectorstore(documents).await?;
        if let Some(path) = &self.index_path {
            rag.save_vectorstore(path).await?;
        }

        let mut analyses = BTreeMap::new();
        for company in companies {
            info!(company = company.as_str(), "Analyzing company");
            let analysis = self.analyze_company(&rag, company).await?;
            analyses.insert(company.clone(), analysis);
        }
        Ok(analyses)
    }

    async fn analyze_company(&self, rag: &RagTool, company: &str) -> Result<CompanyAnalysis> {
        let mut detailed_qa = Vec::with_capacity(COMPANY_QUESTIONS.len());

        for (topic, template) in COMPANY_QUESTIONS {
            let question = self.prompts.render(template, &json!({ "company": company }))?;
            let answer = match rag.query(&question).await {
                Ok(answer) => answer,
                Err(EvError::IndexNotBuilt) => self.not_built_answer().to_string(),
                Err(e) => {
                    warn!(company, topic, error = %e, "Question failed");
                    self.failed_answer(&e)
                }
            };
            detailed_qa.push(QaPair {
                topic: topic.to_string(),
                question,
                answer,
            });
        }

        let answers: Vec<Value> = detailed_qa
            .iter()
            .map(|qa| json!({ "topic": qa.topic, "answer": qa.answer }))
            .collect();
        let prompt = self.prompts.render(
            COMPANY_SUMMARY,
            &json!({ "company": company, "answers": answers }),
        )?;
        let summary_analysis = self.chat.invoke(None, &prompt).await?;

        Ok(CompanyAnalysis {
            company_name: company.to_string(),
            detailed_qa,
            summary_analysis,
            last_updated: Utc::now(),
        })
    }

    fn not_built_answer(&self) -> &'static str {
        match self.prompts.language() {
            Language::Korean => "벡터 DB가 구축되지 않았습니다.",
            _ => "Vector index has not been built.",
        }
    }

    fn failed_answer(&self, error: &EvError) -> String {
        match self.prompts.language() {
            Language::Korean => format!("질의 처리 중 오류 발생: {error}"),
            _ => format!("Query failed: {error}"),
        }
    }

    fn completion_message(&self, companies: &[String]) -> String {
        let (header, done) = match self.prompts.language() {
            Language::Korean => ("기업 분석 완료:", "분석 완료"),
            _ => ("Company analysis complete:", "analyzed"),
        };
        let lines: Vec<String> = companies.iter().map(|c| format!("• {c}: {done}")).collect();
        format!("{header}\n{}", lines.join("\n"))
    }

    /// Prior documents to reuse and the companies that still need fetching
    fn partition_documents(
        &self,
        companies: &[String],
        prior: Vec<Document>,
    ) -> (Vec<Document>, Vec<String>) {
        let mut reused = Vec::new();
        let mut shared = Vec::new();
        for doc in prior {
            match doc.company() {
                Some(owner) if companies.iter().any(|c| c.eq_ignore_ascii_case(owner)) => {
                    reused.push(doc);
                }
                Some(_) => {}
                None => shared.push(doc),
            }
        }

        let missing = companies
            .iter()
            .filter(|c| {
                !reused
                    .iter()
                    .any(|d| d.company().is_some_and(|owner| owner.eq_ignore_ascii_case(c)))
            })
            .cloned()
            .collect();

        reused.extend(self.splitter.split_documents(&shared));
        (reused, missing)
    }

    async fn run_inner(&self, state: &AgentState) -> agent_core::Result<StateUpdate> {
        info!("{} started", COMPANY_ANALYZER);

        let companies = target_companies(state, self.config.max_companies);
        info!(companies = ?companies, "Target companies");

        let prior: Vec<Document> = state
            .get_typed(keys::DOCUMENTS)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring unreadable documents in state");
                None
            })
            .unwrap_or_default();

        let (mut documents, missing) = self.partition_documents(&companies, prior);
        info!(reused = documents.len(), missing = ?missing, "Prior documents");

        let fresh = self.loader.load_company_documents(&missing).await;
        documents.extend(fresh.iter().cloned());
        info!(documents = documents.len(), "Documents ready for indexing");

        let analyses = self.analyze(&companies, &documents).await?;

        let update = StateUpdate::new()
            .set_typed(keys::COMPANY_ANALYSIS, &analyses)?
            .set(keys::COMPANY_ANALYSIS_DONE, Value::Bool(true))
            .set_typed(keys::DOCUMENTS, &fresh)?
            .push_message(COMPANY_ANALYZER, self.completion_message(&companies));

        info!("{} complete", COMPANY_ANALYZER);
        Ok(update)
    }
}

#[async_trait]
impl Agent for CompanyAnalyzerAgent {
    async fn run(&self, state: &AgentState) -> agent_core::Result<StateUpdate> {
        self.run_inner(state)
            .instrument(info_span!("agent", name = COMPANY_ANALYZER))
            .await
    }

    fn name(&self) -> &str {
        COMPANY_ANALYZER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PageFetcher, SearchBackend, SearchResult, WebContentFetcher};
    use crate::llm::testing::{FailingLlm, KeywordEmbedder, ScriptedLlm};
    use crate::tools::document_loader::META_COMPANY;
    use std::sync::Mutex;

    /// One page per query, or nothing at all
    #[derive(Default)]
    struct StubSearch {
        empty: bool,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchBackend for StubSearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.empty {
                return Ok(Vec::new());
            }
            let slug = query.replace(' ', "-");
            Ok(vec![SearchResult::new(
                query,
                format!("https://news.example.com/{slug}"),
                0.8,
            )])
        }
    }

    struct StubFetcher;

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            Ok(format!("<p>Battery strategy report {url}</p>"))
        }
    }

    fn agent(
        llm: Arc<dyn agent_llm::LLMProvider>,
        search: Arc<StubSearch>,
        language: Language,
    ) -> CompanyAnalyzerAgent {
        let loader = DocumentLoader::new(search, WebContentFetcher::new(Arc::new(StubFetcher)))
            .with_language(language);
        CompanyAnalyzerAgent::new(
            loader,
            Arc::new(KeywordEmbedder::new(&["tesla", "byd", "battery"])),
            ChatModel::new(llm, "gpt-4o-mini"),
            Prompts::new(language).unwrap(),
            &EvConfig::default(),
        )
    }

    fn state_with(request: &str, update: StateUpdate) -> AgentState {
        let mut state = AgentState::new().with_user_request(request);
        state.apply(update).unwrap();
        state
    }

    #[test]
    fn test_companies_in_request() {
        assert_eq!(
            companies_in_request("Compare Tesla with 삼성SDI and byd"),
            vec!["Tesla", "Samsung SDI", "BYD"]
        );
        assert_eq!(companies_in_request("테슬라와 기아 전망"), vec!["Tesla", "Kia"]);
        assert!(companies_in_request("Kiana bought a Niobium bike").is_empty());
    }

    #[test]
    fn test_target_company_priority() {
        let update = StateUpdate::new()
            .set(keys::COMPANIES, json!(["BYD", "tesla"]))
            .set(
                keys::MARKET_RESEARCH,
                json!({
                    "key_companies": ["CATL"],
                    "major_players": ["Panasonic", "Rivian"]
                }),
            );
        let state = state_with("Compare Tesla and 삼성SDI", update);

        assert_eq!(
            target_companies(&state, 5),
            vec!["Tesla", "Samsung SDI", "BYD", "CATL", "Panasonic"]
        );
        assert_eq!(target_companies(&state, 2), vec!["Tesla", "Samsung SDI"]);
    }

    #[test]
    fn test_target_companies_default() {
        let state = AgentState::new().with_user_request("EV outlook");
        assert_eq!(target_companies(&state, 5), DEFAULT_COMPANIES.to_vec());
    }

    #[tokio::test]
    async fn test_run_reuses_prior_documents() {
        let llm = Arc::new(ScriptedLlm::default().with_default("Solid outlook"));
        let search = Arc::new(StubSearch::default());
        let agent = agent(llm.clone(), search.clone(), Language::Korean);

        let prior = vec![
            Document::new("Tesla 4680 battery ramp").with_metadata(META_COMPANY, "tesla"),
            Document::new("Global EV sales overview"),
            Document::new("Rivian delivery numbers").with_metadata(META_COMPANY, "Rivian"),
        ];
        let update = StateUpdate::new()
            .set(keys::COMPANIES, json!(["Tesla", "BYD"]))
            .set_typed(keys::DOCUMENTS, &prior)
            .unwrap();
        let mut state = state_with("EV", update);

        let update = agent.run(&state).await.unwrap();

        // Only BYD had no documents
        let queries = search.queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 4);
        assert!(queries.iter().all(|q| q.starts_with("BYD ")));

        let fresh: Vec<Document> =
            serde_json::from_value(update.get(keys::DOCUMENTS).unwrap().clone()).unwrap();
        assert_eq!(fresh.len(), 4);
        assert!(fresh.iter().all(|d| d.company() == Some("BYD")));

        // Five questions and one summary per company
        assert_eq!(llm.requests.lock().unwrap().len(), 12);
        assert!(llm.prompts().iter().any(|p| p.contains("Tesla의 핵심 제품 라인업은?")));

        state.apply(update).unwrap();
        assert!(state.flag(keys::COMPANY_ANALYSIS_DONE));
        let analyses: BTreeMap<String, CompanyAnalysis> =
            state.get_typed(keys::COMPANY_ANALYSIS).unwrap().unwrap();
        assert_eq!(analyses.len(), 2);
        let tesla = &analyses["Tesla"];
        assert_eq!(tesla.detailed_qa.len(), 5);
        assert_eq!(tesla.detailed_qa[0].topic, "strategy");
        assert_eq!(tesla.detailed_qa[4].question, "Tesla가 직면한 주요 리스크와 도전과제는?");
        assert_eq!(tesla.summary_analysis, "Solid outlook");

        let documents: Vec<Document> = state.get_typed(keys::DOCUMENTS).unwrap().unwrap();
        assert_eq!(documents.len(), 7);
        assert_eq!(
            state.messages()[0].content,
            "기업 분석 완료:\n• Tesla: 분석 완료\n• BYD: 분석 완료"
        );
    }

    #[tokio::test]
    async fn test_no_documents_answers_without_index() {
        let llm = Arc::new(ScriptedLlm::default().with_default("Limited data"));
        let search = Arc::new(StubSearch {
            empty: true,
            ..StubSearch::default()
        });
        let agent = agent(llm.clone(), search, Language::English);

        let analyses = agent.analyze(&["CATL".to_string()], &[]).await.unwrap();

        let catl = &analyses["CATL"];
        assert!(catl
            .detailed_qa
            .iter()
            .all(|qa| qa.answer == "Vector index has not been built."));
        assert_eq!(catl.summary_analysis, "Limited data");
        // Only the summary reached the model
        assert_eq!(llm.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_index_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("company_index.json");
        let agent = agent(
            Arc::new(ScriptedLlm::default()),
            Arc::new(StubSearch::default()),
            Language::English,
        )
        .with_index_path(&path);

        agent
            .analyze(&["BYD".to_string()], &[Document::new("BYD blade battery")])
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_summary_failure_is_an_error() {
        let agent = agent(
            Arc::new(FailingLlm),
            Arc::new(StubSearch::default()),
            Language::English,
        );
        let state = AgentState::new().with_user_request("Tesla");
        assert!(agent.run(&state).await.is_err());
    }
}
