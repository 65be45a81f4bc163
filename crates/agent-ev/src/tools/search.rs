//! Single web search rendered as readable text

use crate::api::{SearchBackend, SearchResult};
use crate::utils::truncate_chars;
use agent_core::Result as AgentResult;
use agent_prompt::Language;
use agent_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: String,
}

/// EV market web search for tool-calling agents
pub struct MarketSearchTool {
    search: Arc<dyn SearchBackend>,
    language: Language,
}

impl MarketSearchTool {
    pub fn new(search: Arc<dyn SearchBackend>, language: Language) -> Self {
        Self { search, language }
    }

    /// Numbered list of titles, snippets and URLs
    pub fn render(&self, query: &str, results: &[SearchResult]) -> String {
        let (none, header, source) = match self.language {
            Language::Korean => (
                "검색 결과를 찾을 수 없습니다.".to_string(),
                format!("'{query}' 검색 결과 {}건:\n\n", results.len()),
                "출처",
            ),
            _ => (
                "No search results found.".to_string(),
                format!("{} results for '{query}':\n\n", results.len()),
                "Source",
            ),
        };
        if results.is_empty() {
            return none;
        }

        let mut summary = header;
        for (i, result) in results.iter().enumerate() {
            summary.push_str(&format!(
                "{}. {}\n   {}...\n   {source}: {}\n\n",
                i + 1,
                result.title,
                truncate_chars(&result.content, SNIPPET_CHARS),
                result.url
            ));
        }
        summary
    }

    pub async fn search_ev_market(&self, query: &str) -> String {
        let results = self.search.search_web(query).await;
        self.render(query, &results)
    }
}

#[async_trait]
impl Tool for MarketSearchTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: SearchParams = serde_json::from_value(params).map_err(|e| {
            agent_core::Error::InvalidParams(e.to_string())
        })?;

        let results = self.search.search_web(&params.query).await;
        Ok(json!({
            "query": params.query,
            "count": results.len(),
            "summary": self.render(&params.query, &results),
        }))
    }

    fn name(&self) -> &'static str {
        "search_ev_market"
    }

    fn description(&self) -> &'static str {
        "Search the web for electric vehicle market information \
         and return a numbered summary of the results with their sources."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query, e.g. 'EV battery supply chain 2025'"
                }
            },
            "required": ["query"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    struct FixedSearch(Vec<SearchResult>);

    #[async_trait]
    impl SearchBackend for FixedSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_render_korean() {
        let tool = MarketSearchTool::new(Arc::new(FixedSearch(Vec::new())), Language::Korean);
        let results = vec![
            SearchResult::new("EV Outlook", "https://www.iea.org/ev", 0.9)
                .with_content("x".repeat(300)),
        ];

        let text = tool.render("전기차", &results);
        assert!(text.starts_with("'전기차' 검색 결과 1건:\n\n1. EV Outlook\n"));
        assert!(text.contains(&format!("   {}...\n", "x".repeat(200))));
        assert!(text.contains("   출처: https://www.iea.org/ev\n"));

        assert_eq!(tool.render("전기차", &[]), "검색 결과를 찾을 수 없습니다.");
    }

    #[tokio::test]
    async fn test_execute() {
        let tool = MarketSearchTool::new(
            Arc::new(FixedSearch(vec![
                SearchResult::new("A", "https://a.example", 0.5).with_content("alpha"),
                SearchResult::new("B", "https://b.example", 0.4).with_content("beta"),
            ])),
            Language::English,
        );

        let value = tool.execute(json!({ "query": "EV sales" })).await.unwrap();
        assert_eq!(value["count"], 2);
        let summary = value["summary"].as_str().unwrap();
        assert!(summary.starts_with("2 results for 'EV sales':"));
        assert!(summary.contains("2. B\n   beta...\n   Source: https://b.example"));

        assert!(tool.execute(json!({})).await.is_err());
    }
}
