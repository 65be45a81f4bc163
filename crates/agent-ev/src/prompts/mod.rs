//! Prompt templates for the agents, in English and Korean

pub mod company;
pub mod market;
pub mod stock;

use crate::error::Result;
use agent_prompt::{Language, PromptRegistry};
use serde::Serialize;
use std::sync::Arc;

pub use company::{COMPANY_QUESTIONS, COMPANY_SUMMARY, RAG_STUFF};
pub use market::{MARKET_SYNTHESIS, MARKET_SYSTEM};
pub use stock::{STOCK_DATA_BLOCK, STOCK_SYSTEM, STOCK_USER, TICKER_EXTRACTION};

/// Every agent prompt, rendered in one report language
#[derive(Debug, Clone)]
pub struct Prompts {
    registry: Arc<PromptRegistry>,
}

impl Prompts {
    pub fn new(language: Language) -> Result<Self> {
        let mut registry = PromptRegistry::new(language);
        for template in market::templates()
            .into_iter()
            .chain(company::templates())
            .chain(stock::templates())
        {
            registry.register(template)?;
        }
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn language(&self) -> Language {
        self.registry.language()
    }

    pub fn registry(&self) -> &PromptRegistry {
        &self.registry
    }

    /// Render `name` with any serialisable variables
    pub fn render<T: Serialize>(&self, name: &str, vars: &T) -> Result<String> {
        Ok(self.registry.render(name, vars)?)
    }
}
