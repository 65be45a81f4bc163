//! Structured results written to the shared state

use agent_prompt::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A market trend reported by the researcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// positive, negative or neutral
    #[serde(default)]
    pub impact: String,
}

/// A market risk reported by the researcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// high, medium or low
    #[serde(default)]
    pub severity: String,
}

/// Final market research report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketResearchOutput {
    pub summary: String,
    pub market_size: Option<String>,
    pub growth_rate: String,
    #[serde(default)]
    pub key_companies: Vec<String>,
    #[serde(default)]
    pub key_trends: Vec<TrendItem>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub risks: Vec<RiskItem>,
    pub battery_supply_chain: Option<String>,
    /// Reference URLs
    #[serde(default)]
    pub sources: Vec<String>,
}

impl MarketResearchOutput {
    /// Build the report from the JSON object an LLM produced
    ///
    /// Missing fields get defaults. Trends and risks given as plain strings
    /// become items with only a title.
    pub fn from_analysis(analysis: &Map<String, Value>, sources: Vec<String>) -> Self {
        let text = |key: &str| analysis.get(key).and_then(value_to_text);
        let items = |key: &str| {
            analysis
                .get(key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default()
        };

        Self {
            summary: text("summary").unwrap_or_default(),
            market_size: text("market_size"),
            growth_rate: text("growth_rate").unwrap_or_else(|| "N/A".to_string()),
            key_companies: items("key_companies")
                .iter()
                .filter_map(value_to_text)
                .collect(),
            key_trends: items("key_trends")
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(title) => Some(TrendItem {
                        title,
                        ..TrendItem::default()
                    }),
                    other => serde_json::from_value(other).ok(),
                })
                .collect(),
            opportunities: items("opportunities")
                .iter()
                .filter_map(value_to_text)
                .collect(),
            risks: items("risks")
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(title) => Some(RiskItem {
                        title,
                        ..RiskItem::default()
                    }),
                    other => serde_json::from_value(other).ok(),
                })
                .collect(),
            battery_supply_chain: text("battery_supply_chain"),
            sources,
        }
    }

    /// Report used when the LLM answer holds no parsable JSON
    pub fn fallback(raw_answer: &str, language: Language, sources: Vec<String>) -> Self {
        let no_info = match language {
            Language::Korean => "정보 부족",
            _ => "Insufficient information",
        };
        Self {
            summary: raw_answer.chars().take(500).collect(),
            market_size: Some("N/A".to_string()),
            growth_rate: "N/A".to_string(),
            battery_supply_chain: Some(no_info.to_string()),
            sources,
            ..Self::default()
        }
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// One RAG question and its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    /// Short label such as "strategy" or "risks"
    pub topic: String,
    pub question: String,
    pub answer: String,
}

/// Analysis of one company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAnalysis {
    pub company_name: String,
    pub detailed_qa: Vec<QaPair>,
    pub summary_analysis: String,
    pub last_updated: DateTime<Utc>,
}

/// Latest price against the period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    pub current_price: f64,
    pub prev_price: f64,
    pub change: f64,
    pub change_pct: f64,
    pub period_high: f64,
    pub period_low: f64,
    pub avg_price: f64,
}

/// Latest volume against the period mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub recent_volume: u64,
    pub avg_volume: f64,
    pub volume_change_pct: f64,
}

/// Direction of the price relative to its moving averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongUptrend,
    Uptrend,
    Neutral,
    Downtrend,
    StrongDowntrend,
}

impl Trend {
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (Trend::StrongUptrend, Language::Korean) => "강한 상승",
            (Trend::Uptrend, Language::Korean) => "상승",
            (Trend::Neutral, Language::Korean) => "중립",
            (Trend::Downtrend, Language::Korean) => "하락",
            (Trend::StrongDowntrend, Language::Korean) => "강한 하락",
            (Trend::StrongUptrend, _) => "strong uptrend",
            (Trend::Uptrend, _) => "uptrend",
            (Trend::Neutral, _) => "neutral",
            (Trend::Downtrend, _) => "downtrend",
            (Trend::StrongDowntrend, _) => "strong downtrend",
        }
    }
}

/// Moving averages, trend and volatility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub trend: Trend,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    /// Standard deviation of daily changes, e.g. `2.35%`
    pub volatility: String,
}

/// Normalised market data for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    pub ticker: String,
    pub company_name: String,
    pub price_info: PriceInfo,
    pub volume_info: Option<VolumeInfo>,
    pub trend_analysis: TrendAnalysis,
    /// `YYYY-MM-DD ~ YYYY-MM-DD`
    pub period: String,
    pub data_points: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
    Error,
}

/// Payload of a successful stock analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysisData {
    pub tickers: Vec<String>,
    pub raw_data: BTreeMap<String, StockData>,
    /// Markdown report written by the LLM
    pub analysis: String,
}

/// Outcome of [`crate::agents::StockAnalyzerAgent::analyze`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysisResult {
    pub status: AnalysisStatus,
    pub message: String,
    pub data: Option<StockAnalysisData>,
}

impl StockAnalysisResult {
    pub fn success(message: impl Into<String>, data: StockAnalysisData) -> Self {
        Self {
            status: AnalysisStatus::Success,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Error,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }
}

/// Price move of one ticker, for other agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTrend {
    pub company: String,
    pub current_price: f64,
    pub change_pct: f64,
    pub trend: Trend,
}

/// Compact digest of a stock analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockSummary {
    pub analyzed_tickers: Vec<String>,
    pub key_insights: Vec<String>,
    pub price_trends: BTreeMap<String, PriceTrend>,
    pub recommendations: Vec<String>,
}

/// Value stored under `stock_analysis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysisOutput {
    pub analysis_text: String,
    pub summary: StockSummary,
    pub timestamp: DateTime<Utc>,
}
