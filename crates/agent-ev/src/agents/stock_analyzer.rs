//! Stock analysis: ticker extraction, market data and an LLM narrative

use crate::config::EvConfig;
use crate::error::Result;
use crate::llm::ChatModel;
use crate::prompts::{Prompts, STOCK_DATA_BLOCK, STOCK_SYSTEM, STOCK_USER, TICKER_EXTRACTION};
use crate::schema::{
    PriceTrend, StockAnalysisData, StockAnalysisOutput, StockAnalysisResult, StockData,
    StockSummary,
};
use crate::tools::finance::{FinanceDataTool, tickers_for_companies};
use crate::utils::{format_number, format_percent};
use agent_core::state::keys;
use agent_core::{Agent, AgentState, StateUpdate};
use agent_prompt::Language;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

pub const STOCK_ANALYZER: &str = "Stock_Analyzer";

/// Daily moves beyond this many percent are called out as insights
const SURGE_THRESHOLD: f64 = 5.0;

/// Analyses stock prices of EV and battery companies
pub struct StockAnalyzerAgent {
    finance: Arc<FinanceDataTool>,
    chat: ChatModel,
    prompts: Prompts,
    history_days: i64,
}

impl StockAnalyzerAgent {
    pub fn new(
        finance: Arc<FinanceDataTool>,
        chat: ChatModel,
        prompts: Prompts,
        config: &EvConfig,
    ) -> Self {
        Self {
            finance,
            chat,
            prompts,
            history_days: config.history_days,
        }
    }

    fn localized(&self, korean: &str, english: &str) -> String {
        match self.prompts.language() {
            Language::Korean => korean.to_string(),
            _ => english.to_string(),
        }
    }

    /// Analyse `tickers`, or the tickers the LLM finds in `user_query`
    ///
    /// Never fails: problems are reported through an error result.
    pub async fn analyze(
        &self,
        user_query: &str,
        tickers: Option<Vec<String>>,
    ) -> StockAnalysisResult {
        info!(user_query, "Stock analysis request");
        match self.try_analyze(user_query, tickers).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Stock analysis failed");
                let message = match self.prompts.language() {
                    Language::Korean => format!("분석 중 오류 발생: {e}"),
                    _ => format!("Analysis failed: {e}"),
                };
                StockAnalysisResult::error(message)
            }
        }
    }

    async fn try_analyze(
        &self,
        user_query: &str,
        tickers: Option<Vec<String>>,
    ) -> Result<StockAnalysisResult> {
        let tickers = match tickers.filter(|t| !t.is_empty()) {
            Some(tickers) => tickers,
            None => {
                info!("Extracting tickers from the request");
                self.extract_tickers(user_query).await?
            }
        };

        if tickers.is_empty() {
            return Ok(StockAnalysisResult::error(self.localized(
                "분석할 종목을 찾을 수 없습니다. 종목명이나 티커를 명시해주세요.",
                "No stocks to analyze were found. Please name a company or ticker.",
            )));
        }
        info!(tickers = ?tickers, "Tickers to analyze");

        let mut raw_data = BTreeMap::new();
        for ticker in &tickers {
            match self.finance.get_stock_data(ticker, self.history_days).await {
                Ok(data) => {
                    info!(ticker = ticker.as_str(), "Stock data collected");
                    raw_data.insert(ticker.clone(), data);
                }
                Err(e) => warn!(ticker = ticker.as_str(), error = %e, "Stock data unavailable"),
            }
        }

        if raw_data.is_empty() {
            return Ok(StockAnalysisResult::error(self.localized(
                "주식 데이터를 가져올 수 없습니다.",
                "Could not retrieve any stock data.",
            )));
        }

        let analysis = self.analyze_with_llm(user_query, &tickers, &raw_data).await?;

        Ok(StockAnalysisResult::success(
            self.localized("주식 분석이 완료되었습니다.", "Stock analysis complete."),
            StockAnalysisData {
                tickers,
                raw_data,
                analysis,
            },
        ))
    }

    /// Comma-separated tickers from the LLM
    async fn extract_tickers(&self, user_query: &str) -> Result<Vec<String>> {
        let prompt = self
            .prompts
            .render(TICKER_EXTRACTION, &json!({ "query": user_query }))?;
        let answer = self.chat.invoke(None, &prompt).await?;

        Ok(answer
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn analyze_with_llm(
        &self,
        user_query: &str,
        tickers: &[String],
        raw_data: &BTreeMap<String, StockData>,
    ) -> Result<String> {
        let data = self.format_data(tickers, raw_data)?;
        let system = self.prompts.render(STOCK_SYSTEM, &json!({}))?;
        let prompt = self
            .prompts
            .render(STOCK_USER, &json!({ "query": user_query, "data": data }))?;

        info!("Starting LLM analysis");
        self.chat.invoke(Some(&system), &prompt).await
    }

    /// One Markdown block per ticker with data, in ticker order
    pub fn format_data(
        &self,
        tickers: &[String],
        raw_data: &BTreeMap<String, StockData>,
    ) -> Result<String> {
        let mut blocks = Vec::new();
        for ticker in tickers {
            let Some(data) = raw_data.get(ticker) else {
                continue;
            };
            let price = &data.price_info;
            let volume = data.volume_info.as_ref();
            let trend = &data.trend_analysis;

            blocks.push(self.prompts.render(
                STOCK_DATA_BLOCK,
                &json!({
                    "company_name": data.company_name,
                    "ticker": ticker,
                    "current_price": format_number(Some(price.current_price), "N/A"),
                    "change": format_number(Some(price.change), "0"),
                    "change_pct": format_percent(Some(price.change_pct), "0.00%"),
                    "period_high": format_number(Some(price.period_high), "N/A"),
                    "period_low": format_number(Some(price.period_low), "N/A"),
                    "avg_price": format_number(Some(price.avg_price), "N/A"),
                    "recent_volume": format_number(volume.map(|v| v.recent_volume as f64), "N/A"),
                    "avg_volume": format_number(volume.map(|v| v.avg_volume), "N/A"),
                    "volume_change": format_percent(volume.map(|v| v.volume_change_pct), "0.00%"),
                    "trend": trend.trend.label(self.prompts.language()),
                    "volatility": trend.volatility,
                    "ma20": format_number(trend.ma20, "N/A"),
                    "ma60": format_number(trend.ma60, "N/A"),
                    "period": data.period,
                }),
            )?);
        }
        Ok(blocks.join("\n\n"))
    }

    /// Digest of an analysis for the other agents
    pub fn summary(&self, data: &StockAnalysisData) -> StockSummary {
        let mut summary = StockSummary {
            analyzed_tickers: data.tickers.clone(),
            ..StockSummary::default()
        };

        for ticker in &data.tickers {
            let Some(stock) = data.raw_data.get(ticker) else {
                continue;
            };
            let change_pct = stock.price_info.change_pct;

            summary.price_trends.insert(
                ticker.clone(),
                PriceTrend {
                    company: stock.company_name.clone(),
                    current_price: stock.price_info.current_price,
                    change_pct,
                    trend: stock.trend_analysis.trend,
                },
            );

            let (surge, plunge) = match self.prompts.language() {
                Language::Korean => ("급등세", "급락세"),
                _ => ("surging", "plunging"),
            };
            if change_pct > SURGE_THRESHOLD {
                summary
                    .key_insights
                    .push(format!("{}: {surge} (+{change_pct:.2}%)", stock.company_name));
            } else if change_pct < -SURGE_THRESHOLD {
                summary
                    .key_insights
                    .push(format!("{}: {plunge} ({change_pct:.2}%)", stock.company_name));
            }
        }

        summary
    }

    async fn run_inner(&self, state: &AgentState) -> agent_core::Result<StateUpdate> {
        info!("{} started", STOCK_ANALYZER);

        let user_request = state.user_request().unwrap_or_default();
        let mut tickers = state.string_list(keys::TICKER_SYMBOLS);
        if tickers.is_empty() {
            tickers = tickers_for_companies(&state.string_list(keys::COMPANIES));
        }
        info!(tickers = ?tickers, "Tickers from state");

        let result = self
            .analyze(user_request, (!tickers.is_empty()).then_some(tickers))
            .await;

        let update = match result.data {
            Some(data) => {
                let output = StockAnalysisOutput {
                    analysis_text: data.analysis.clone(),
                    summary: self.summary(&data),
                    timestamp: Utc::now(),
                };
                let message = match self.prompts.language() {
                    Language::Korean => format!("{}개 종목 분석 완료", data.tickers.len()),
                    _ => format!("Analyzed {} stocks", data.tickers.len()),
                };
                StateUpdate::new()
                    .set_typed(keys::STOCK_ANALYSIS, &output)?
                    .set_typed(keys::TICKER_SYMBOLS, &data.tickers)?
                    .set_typed(keys::STOCK_DATA, &data.raw_data)?
                    .push_message(STOCK_ANALYZER, message)
            }
            None => {
                warn!(message = result.message.as_str(), "Stock analysis returned an error");
                StateUpdate::new().push_message(STOCK_ANALYZER, format!("Error: {}", result.message))
            }
        };

        info!("{} complete", STOCK_ANALYZER);
        Ok(update)
    }
}

#[async_trait]
impl Agent for StockAnalyzerAgent {
    async fn run(&self, state: &AgentState) -> agent_core::Result<StateUpdate> {
        self.run_inner(state)
            .instrument(info_span!("agent", name = STOCK_ANALYZER))
            .await
    }

    fn name(&self) -> &str {
        STOCK_ANALYZER
    }
}
