//! Company document collection: search, download, split

use crate::api::{SearchBackend, WebContentFetcher};
use crate::tools::splitter::RecursiveCharacterTextSplitter;
use agent_prompt::Language;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Metadata key naming the company a document is about
pub const META_COMPANY: &str = "company";
/// Metadata key holding the page the text came from
pub const META_SOURCE_URL: &str = "source_url";

/// A piece of text with string metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Company this document was collected for, if tagged
    pub fn company(&self) -> Option<&str> {
        self.metadata.get(META_COMPANY).map(String::as_str)
    }

    pub fn source_url(&self) -> Option<&str> {
        self.metadata.get(META_SOURCE_URL).map(String::as_str)
    }
}

/// Search queries issued for one company
pub fn company_queries(company: &str, language: Language) -> Vec<String> {
    match language {
        Language::Korean => vec![
            format!("{company} 전기차 사업 전략 2025"),
            format!("{company} 배터리 기술 제품"),
            format!("{company} IR 자료 실적"),
            format!("{company} 파트너십 협력"),
        ],
        _ => vec![
            format!("{company} electric vehicle business strategy 2025"),
            format!("{company} battery technology products"),
            format!("{company} investor relations earnings"),
            format!("{company} partnerships collaboration"),
        ],
    }
}

/// Collects and chunks web documents about companies
pub struct DocumentLoader {
    search: Arc<dyn SearchBackend>,
    fetcher: WebContentFetcher,
    splitter: RecursiveCharacterTextSplitter,
    max_urls: usize,
    language: Language,
}

impl DocumentLoader {
    pub fn new(search: Arc<dyn SearchBackend>, fetcher: WebContentFetcher) -> Self {
        Self {
            search,
            fetcher,
            splitter: RecursiveCharacterTextSplitter::default(),
            max_urls: 10,
            language: Language::English,
        }
    }

    pub fn with_splitter(mut self, splitter: RecursiveCharacterTextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_max_urls(mut self, max_urls: usize) -> Self {
        self.max_urls = max_urls;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Chunked documents for every company, in company order
    pub async fn load_company_documents(&self, companies: &[String]) -> Vec<Document> {
        let mut documents = Vec::new();

        for company in companies {
            info!(company = company.as_str(), "Collecting documents");
            let docs = self.load_single_company(company).await;
            info!(
                company = company.as_str(),
                chunks = docs.len(),
                "Documents collected"
            );
            documents.extend(docs);
        }

        documents
    }

    /// Search, download and split the pages for one company
    ///
    /// Search and download failures are skipped; a company without any
    /// readable page yields no documents.
    pub async fn load_single_company(&self, company: &str) -> Vec<Document> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for query in company_queries(company, self.language) {
            let results = self.search.search_web(&query).await;
            if results.is_empty() {
                warn!(query = query.as_str(), "No search results");
            }
            for result in results {
                if !result.url.is_empty() && seen.insert(result.url.clone()) {
                    urls.push(result.url);
                }
            }
        }
        urls.truncate(self.max_urls);

        let pages = self.fetcher.fetch_multiple(&urls).await;
        let documents: Vec<Document> = pages
            .into_iter()
            .map(|page| {
                Document::new(page.text)
                    .with_metadata(META_COMPANY, company)
                    .with_metadata(META_SOURCE_URL, page.url)
            })
            .collect();

        self.splitter.split_documents(&documents)
    }
}
