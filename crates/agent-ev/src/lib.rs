//! Electric vehicle market analysis agents
//!
//! Three agents share one [`agent_core::AgentState`] and run in order:
//!
//! - `MarketResearcherAgent`: web search and an LLM market report
//! - `CompanyAnalyzerAgent`: retrieval-augmented answers about key companies
//! - `StockAnalyzerAgent`: cached price history, indicators and an LLM narrative
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_ev::{EvConfig, MarketResearcherAgent, Prompts};
//! use agent_workflow::Workflow;
//!
//! let config = EvConfig::from_settings(&settings)?;
//! let prompts = Prompts::new(config.language)?;
//! let market = MarketResearcherAgent::new(search, fetcher, chat, prompts, &config);
//!
//! let workflow = Workflow::builder().add_agent(Arc::new(market)).build()?;
//! let state = workflow.execute(AgentState::new().with_user_request("EV outlook")).await?;
//! ```

pub mod agents;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod retry;
pub mod schema;
pub mod tools;
pub mod utils;

pub use agents::{CompanyAnalyzerAgent, MarketResearcherAgent, StockAnalyzerAgent};
pub use config::EvConfig;
pub use error::{EvError, FinanceError, FinanceResult, Result};
pub use llm::ChatModel;
pub use prompts::Prompts;

pub use agent_prompt::Language;
