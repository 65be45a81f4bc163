//! Tools used by the agents

pub mod document_loader;
pub mod finance;
pub mod rag;
pub mod search;
pub mod splitter;

pub use document_loader::{Document, DocumentLoader, company_queries};
pub use finance::{
    FinanceDataTool, StockDataTool, analyze_bars, company_name_for, ticker_for_company,
    tickers_for_companies,
};
pub use rag::{RagTool, VectorStore};
pub use search::MarketSearchTool;
pub use splitter::RecursiveCharacterTextSplitter;

use crate::api::SearchBackend;
use agent_prompt::Language;
use agent_tools::ToolRegistry;
use std::sync::Arc;

/// `search_ev_market` and `stock_data`, ready for lookup by name
pub fn registry(
    search: Arc<dyn SearchBackend>,
    finance: Arc<FinanceDataTool>,
    language: Language,
) -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(MarketSearchTool::new(search, language)))
        .with_tool(Arc::new(StockDataTool::new(finance)))
}
