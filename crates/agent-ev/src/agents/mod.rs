//! The three pipeline agents

pub mod company_analyzer;
pub mod market_researcher;
pub mod stock_analyzer;

pub use company_analyzer::{COMPANY_ANALYZER, CompanyAnalyzerAgent, target_companies};
pub use market_researcher::{MARKET_RESEARCHER, MarketResearch, MarketResearcherAgent};
pub use stock_analyzer::{STOCK_ANALYZER, StockAnalyzerAgent};
