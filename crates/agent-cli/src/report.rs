//! Readable console output for the final state

use agent_core::{AgentState, state::keys};
use agent_ev::schema::{CompanyAnalysis, MarketResearchOutput, StockAnalysisOutput};
use std::collections::BTreeMap;

const RULE: &str = "============================================================";

fn section(title: &str) {
    println!("\n{RULE}\n{title}\n{RULE}");
}

pub fn print_market(state: &AgentState) {
    let Ok(Some(research)) = state.get_typed::<MarketResearchOutput>(keys::MARKET_RESEARCH) else {
        return;
    };

    section("Market research");
    println!("\nSummary:\n{}", research.summary);
    if let Some(size) = &research.market_size {
        println!("\nMarket size: {size}");
    }
    println!("Growth rate: {}", research.growth_rate);

    if !research.key_companies.is_empty() {
        println!("\nKey companies: {}", research.key_companies.join(", "));
    }

    if !research.key_trends.is_empty() {
        println!("\nKey trends:");
        for (i, trend) in research.key_trends.iter().enumerate() {
            println!("  {}. {} - {}", i + 1, trend.title, trend.description);
        }
    }

    if !research.opportunities.is_empty() {
        println!("\nOpportunities:");
        for opportunity in &research.opportunities {
            println!("  - {opportunity}");
        }
    }

    if !research.risks.is_empty() {
        println!("\nRisks:");
        for risk in &research.risks {
            println!("  - [{}] {}: {}", risk.severity, risk.title, risk.description);
        }
    }

    if let Some(supply_chain) = &research.battery_supply_chain {
        println!("\nBattery supply chain: {supply_chain}");
    }

    println!("\nSources ({}):", research.sources.len());
    for source in &research.sources {
        println!("  {source}");
    }
}

pub fn print_companies(state: &AgentState) {
    let Ok(Some(analyses)) =
        state.get_typed::<BTreeMap<String, CompanyAnalysis>>(keys::COMPANY_ANALYSIS)
    else {
        return;
    };

    section("Company analysis");
    for analysis in analyses.values() {
        println!("\n## {}\n", analysis.company_name);
        println!("{}", analysis.summary_analysis);
        for qa in &analysis.detailed_qa {
            println!("\n[{}] {}\n{}", qa.topic, qa.question, qa.answer);
        }
    }
}

pub fn print_stocks(state: &AgentState) {
    let Ok(Some(output)) = state.get_typed::<StockAnalysisOutput>(keys::STOCK_ANALYSIS) else {
        return;
    };

    section("Stock analysis");
    println!("\n{}", output.analysis_text);

    if !output.summary.key_insights.is_empty() {
        println!("\nKey insights:");
        for insight in &output.summary.key_insights {
            println!("  - {insight}");
        }
    }
}

pub fn print_messages(state: &AgentState) {
    let messages = state.messages();
    if messages.is_empty() {
        return;
    }

    section("Messages");
    for message in messages {
        println!("[{}] {}", message.sender, message.content);
    }
    if let Some(error) = state.get(keys::ERROR).and_then(|e| e.as_str()) {
        println!("\nError: {error}");
    }
}
