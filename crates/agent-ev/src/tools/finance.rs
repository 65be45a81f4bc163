//! Price history with caching and retry, plus simple technical analysis

use crate::api::{PriceBar, PriceSource};
use crate::cache::{CacheKey, FileCache};
use crate::config::EvConfig;
use crate::error::{FinanceError, FinanceResult};
use crate::retry::RetryPolicy;
use crate::schema::{PriceInfo, StockData, Trend, TrendAnalysis, VolumeInfo};
use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use ta::Next;
use ta::indicators::SimpleMovingAverage;
use tracing::{info, warn};

pub const DEFAULT_HISTORY_DAYS: i64 = 90;

/// Longest history the `stock_data` tool accepts
pub const MAX_HISTORY_DAYS: i64 = 3650;

const COMPANY_NAMES: &[(&str, &str)] = &[
    ("373220", "LG에너지솔루션"),
    ("006400", "삼성SDI"),
    ("000660", "SK하이닉스"),
    ("005380", "현대차"),
    ("000270", "기아"),
    ("003670", "포스코퓨처엠"),
    ("TSLA", "Tesla"),
    ("AAPL", "Apple"),
    ("MSFT", "Microsoft"),
    ("1211.HK", "BYD"),
];

/// Lowercased company names and aliases
const COMPANY_TICKERS: &[(&str, &str)] = &[
    ("lg에너지솔루션", "373220"),
    ("lg energy solution", "373220"),
    ("lges", "373220"),
    ("삼성sdi", "006400"),
    ("samsung sdi", "006400"),
    ("sk하이닉스", "000660"),
    ("sk hynix", "000660"),
    ("현대차", "005380"),
    ("hyundai", "005380"),
    ("hyundai motor", "005380"),
    ("기아", "000270"),
    ("kia", "000270"),
    ("테슬라", "TSLA"),
    ("tesla", "TSLA"),
    ("byd", "1211.HK"),
    ("포스코퓨처엠", "003670"),
    ("posco future m", "003670"),
];

/// Display name for a ticker; unknown tickers are returned as-is
pub fn company_name_for(ticker: &str) -> String {
    COMPANY_NAMES
        .iter()
        .find(|(t, _)| *t == ticker)
        .map_or_else(|| ticker.to_string(), |(_, name)| (*name).to_string())
}

/// Ticker for an exact (case-insensitive) company name or alias
pub fn ticker_for_company(company: &str) -> Option<&'static str> {
    let needle = company.trim().to_lowercase();
    COMPANY_TICKERS
        .iter()
        .find(|(name, _)| *name == needle)
        .map(|(_, ticker)| *ticker)
}

/// Tickers for the known names in `companies`, in order and without repeats
pub fn tickers_for_companies(companies: &[String]) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for ticker in companies.iter().filter_map(|c| ticker_for_company(c)) {
        if !tickers.iter().any(|t| t == ticker) {
            tickers.push(ticker.to_string());
        }
    }
    tickers
}

fn moving_average(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period {
        return None;
    }
    let mut sma = SimpleMovingAverage::new(period).ok()?;
    closes.iter().fold(None, |_, &close| Some(sma.next(close)))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Sample standard deviation of daily percentage changes, as `x.xx%`
fn volatility(closes: &[f64]) -> String {
    let changes: Vec<f64> = closes
        .windows(2)
        .map(|w| (w[1] / w[0] - 1.0) * 100.0)
        .filter(|c| c.is_finite())
        .collect();
    if changes.len() < 2 {
        return "N/A".to_string();
    }

    let avg = mean(changes.iter().copied());
    let variance =
        changes.iter().map(|c| (c - avg).powi(2)).sum::<f64>() / (changes.len() - 1) as f64;
    format!("{:.2}%", variance.sqrt())
}

fn classify_trend(current: f64, ma20: Option<f64>, ma60: Option<f64>) -> Trend {
    let (Some(ma20), Some(ma60)) = (ma20, ma60) else {
        return Trend::Neutral;
    };
    if current > ma20 && ma20 > ma60 {
        Trend::StrongUptrend
    } else if current > ma20 {
        Trend::Uptrend
    } else if current < ma20 && ma20 < ma60 {
        Trend::StrongDowntrend
    } else if current < ma20 {
        Trend::Downtrend
    } else {
        Trend::Neutral
    }
}

/// Summarise a price series, oldest bar first
///
/// Returns `None` for an empty series.
pub fn analyze_bars(ticker: &str, bars: &[PriceBar], now: DateTime<Utc>) -> Option<StockData> {
    let (first, last) = (bars.first()?, bars.last()?);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let current_price = last.close;
    let prev_price = bars
        .len()
        .checked_sub(2)
        .map_or(current_price, |i| bars[i].close);
    let change = current_price - prev_price;
    let change_pct = if prev_price == 0.0 {
        0.0
    } else {
        change / prev_price * 100.0
    };

    let price_info = PriceInfo {
        current_price,
        prev_price,
        change,
        change_pct,
        period_high: closes.iter().copied().fold(f64::MIN, f64::max),
        period_low: closes.iter().copied().fold(f64::MAX, f64::min),
        avg_price: mean(closes.iter().copied()),
    };

    let avg_volume = mean(bars.iter().map(|b| b.volume as f64));
    let volume_info = Some(VolumeInfo {
        recent_volume: last.volume,
        avg_volume,
        volume_change_pct: if avg_volume == 0.0 {
            0.0
        } else {
            (last.volume as f64 / avg_volume - 1.0) * 100.0
        },
    });

    let ma20 = moving_average(&closes, 20);
    let ma60 = moving_average(&closes, 60);

    Some(StockData {
        ticker: ticker.to_string(),
        company_name: company_name_for(ticker),
        price_info,
        volume_info,
        trend_analysis: TrendAnalysis {
            trend: classify_trend(current_price, ma20, ma60),
            ma20,
            ma60,
            volatility: volatility(&closes),
        },
        period: format!(
            "{} ~ {}",
            first.date.format("%Y-%m-%d"),
            last.date.format("%Y-%m-%d")
        ),
        data_points: bars.len(),
        last_updated: now,
    })
}

/// Cached, retried access to daily price history
pub struct FinanceDataTool {
    source: Arc<dyn PriceSource>,
    cache: FileCache,
    retry: RetryPolicy,
}

impl FinanceDataTool {
    pub fn new(source: Arc<dyn PriceSource>, cache: FileCache, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache,
            retry,
        }
    }

    pub fn from_config(source: Arc<dyn PriceSource>, config: &EvConfig) -> Self {
        Self::new(
            source,
            FileCache::new(&config.cache_dir, config.cache_ttl),
            RetryPolicy::from_config(config),
        )
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Analysed data for the last `days` days
    ///
    /// A fresh cache entry for the same ticker and day range is returned
    /// without touching the source. Otherwise the source is retried per the
    /// policy and the result is cached before it is returned. Nothing is
    /// cached when every attempt fails or comes back empty.
    pub async fn get_stock_data(&self, ticker: &str, days: i64) -> FinanceResult<StockData> {
        let end = Utc::now();
        let start = Duration::try_days(days)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or(FinanceError::InvalidRange { days })?;
        let key = CacheKey::new(ticker, start.date_naive(), end.date_naive());

        if let Some(cached) = self.cache.get::<StockData>(&key).await {
            info!(ticker, "Using cached stock data");
            return Ok(cached);
        }

        let attempts = self.retry.max_attempts;
        let bars = self
            .retry
            .fetch_with_retry(ticker, |attempt| {
                info!(ticker, attempt, attempts, "Fetching price history");
                self.source.history(ticker, start, end)
            })
            .await?;

        let data = analyze_bars(ticker, &bars, Utc::now()).ok_or_else(|| FinanceError::NoData {
            ticker: ticker.to_string(),
            attempts,
        })?;

        if let Err(e) = self.cache.put(&key, &data).await {
            warn!(ticker, "Failed to cache stock data: {}", e);
        }
        Ok(data)
    }
}

#[derive(Debug, Deserialize)]
struct StockDataParams {
    ticker: String,
    #[serde(default)]
    days: Option<i64>,
}

/// [`FinanceDataTool`] exposed through the tool registry
pub struct StockDataTool {
    finance: Arc<FinanceDataTool>,
}

impl StockDataTool {
    pub fn new(finance: Arc<FinanceDataTool>) -> Self {
        Self { finance }
    }
}

#[async_trait]
impl Tool for StockDataTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: StockDataParams = serde_json::from_value(params).map_err(|e| {
            agent_core::Error::InvalidParams(e.to_string())
        })?;

        let days = params.days.unwrap_or(DEFAULT_HISTORY_DAYS).max(1);
        if days > MAX_HISTORY_DAYS {
            return Err(agent_core::Error::InvalidParams(format!(
                "days must be at most {MAX_HISTORY_DAYS}, got {days}"
            )));
        }

        let data = self
            .finance
            .get_stock_data(params.ticker.trim(), days)
            .await?;
        serde_json::to_value(data).map_err(|e| agent_core::Error::ProcessingFailed(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "stock_data"
    }

    fn description(&self) -> &'static str {
        "Fetch daily price history for a ticker and summarise it: latest price and change, \
         period high/low/average, volume, 20/60-day moving averages, trend and volatility. \
         Korean six-digit codes (e.g. 373220) and exchange tickers (e.g. TSLA, 1211.HK) are supported."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. 'TSLA', '1211.HK' or '373220'"
                },
                "days": {
                    "type": "integer",
                    "description": "Number of calendar days of history",
                    "default": DEFAULT_HISTORY_DAYS,
                    "minimum": 1,
                    "maximum": MAX_HISTORY_DAYS
                }
            },
            "required": ["ticker"]
        })
    }
}
