//! Daily price history from Yahoo Finance

use crate::error::{FinanceError, FinanceResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// A source of daily price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Bars for `ticker` between `start` and `end`, oldest first
    async fn history(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FinanceResult<Vec<PriceBar>>;
}

/// Yahoo Finance price source
#[derive(Debug, Default, Clone, Copy)]
pub struct YahooPriceSource;

impl YahooPriceSource {
    pub fn new() -> Self {
        Self
    }

    /// Yahoo symbol for a ticker; six-digit Korean codes trade on KOSPI
    pub fn yahoo_symbol(ticker: &str) -> String {
        if ticker.len() == 6 && ticker.chars().all(|c| c.is_ascii_digit()) {
            format!("{ticker}.KS")
        } else {
            ticker.to_uppercase()
        }
    }
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    async fn history(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FinanceResult<Vec<PriceBar>> {
        let provider =
            yahoo::YahooConnector::new().map_err(|e| FinanceError::Source(e.to_string()))?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| FinanceError::Source(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| FinanceError::Source(format!("Invalid end timestamp: {e}")))?;

        let symbol = Self::yahoo_symbol(ticker);
        let quotes = provider
            .get_quote_history(&symbol, start_odt, end_odt)
            .await
            .and_then(|response| response.quotes());

        to_bars(&symbol, quotes)
    }
}

/// Bars from a decoded quote series, oldest first
///
/// Yahoo reports an unknown symbol or an empty range as an error; both become
/// an empty series so the caller can tell "no data" from a failed request.
fn to_bars(
    symbol: &str,
    quotes: Result<Vec<yahoo::Quote>, yahoo::YahooError>,
) -> FinanceResult<Vec<PriceBar>> {
    let quotes = match quotes {
        Ok(quotes) => quotes,
        Err(yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) => return Ok(Vec::new()),
        Err(e) => return Err(FinanceError::Source(format!("{symbol}: {e}"))),
    };

    let mut bars: Vec<PriceBar> = quotes
        .iter()
        .filter_map(|q| {
            let date = DateTime::from_timestamp(q.timestamp, 0)?.date_naive();
            Some(PriceBar {
                date,
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                volume: q.volume,
            })
        })
        .collect();
    bars.sort_by_key(|bar| bar.date);

    Ok(bars)
}
