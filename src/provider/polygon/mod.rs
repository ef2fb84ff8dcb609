//! Polygon.io provider implementation.
//!
//! - Quotes via the /v2/snapshot single-ticker endpoint
//! - History via the /v2/aggs daily aggregates endpoint
//!
//! Requires an API key. API documentation: https://polygon.io/docs

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{HistoryPoint, QuoteRecord};
use crate::provider::http::get_json;
use crate::provider::{HistoryProvider, QuoteProvider};

const BASE_URL: &str = "https://api.polygon.io";
const PROVIDER_ID: &str = "polygon";

/// Calendar days of daily aggregates requested; generous enough that the
/// series still holds 180 trading days after weekends and holidays.
const LOOKBACK_DAYS: i64 = 270;

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /v2/snapshot/locale/us/markets/stocks/tickers/{symbol}
#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    ticker: Option<SnapshotTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotTicker {
    /// Ticker symbol
    ticker: Option<String>,
    /// Change since previous close, absolute
    todays_change: Option<f64>,
    /// Change since previous close, already in percent units
    todays_change_perc: Option<f64>,
    /// Current day's aggregate
    day: Option<SnapshotBar>,
    /// Previous day's aggregate
    prev_day: Option<SnapshotBar>,
    /// Most recent trade
    last_trade: Option<SnapshotTrade>,
}

#[derive(Debug, Deserialize)]
struct SnapshotBar {
    /// Close
    c: Option<f64>,
    /// High
    h: Option<f64>,
    /// Low
    l: Option<f64>,
    /// Volume
    v: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SnapshotTrade {
    /// Trade price
    p: Option<f64>,
}

/// Response from /v2/aggs/ticker/{symbol}/range/1/day/{from}/{to}
#[derive(Debug, Deserialize)]
struct AggsResponse {
    results: Option<Vec<AggsBar>>,
}

#[derive(Debug, Deserialize)]
struct AggsBar {
    /// Timestamp, Unix milliseconds
    t: i64,
    /// Close
    c: f64,
    /// Open
    o: Option<f64>,
    /// High
    h: Option<f64>,
    /// Low
    l: Option<f64>,
    /// Volume
    v: Option<f64>,
}

// ============================================================================
// PolygonProvider
// ============================================================================

/// Polygon.io market data provider. Serves both pipelines.
pub struct PolygonProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl PolygonProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the upstream base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&str, MarketDataError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| MarketDataError::not_configured(PROVIDER_ID))
    }
}

fn dec(v: f64) -> Option<Decimal> {
    Decimal::try_from(v).ok()
}

fn map_quote(symbol: &str, response: SnapshotResponse) -> Result<QuoteRecord, MarketDataError> {
    let ticker = response
        .ticker
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let price = ticker
        .last_trade
        .as_ref()
        .and_then(|t| t.p)
        .and_then(dec)
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let day = ticker.day.as_ref();

    Ok(QuoteRecord {
        provider: PROVIDER_ID.to_string(),
        symbol: ticker.ticker.clone().unwrap_or_else(|| symbol.to_string()),
        name: ticker.ticker.unwrap_or_else(|| symbol.to_string()),
        price,
        change: ticker.todays_change.and_then(dec),
        change_percent: ticker.todays_change_perc.and_then(dec),
        volume: day.and_then(|d| d.v).and_then(dec),
        market_cap: None,
        pe: None,
        previous_close: ticker.prev_day.as_ref().and_then(|d| d.c).and_then(dec),
        day_high: day.and_then(|d| d.h).and_then(dec),
        day_low: day.and_then(|d| d.l).and_then(dec),
        currency: "USD".to_string(),
        exchange_name: None,
    })
}

fn map_history(response: AggsResponse) -> Result<Vec<HistoryPoint>, MarketDataError> {
    let bars = response
        .results
        .filter(|r| !r.is_empty())
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let points = bars
        .into_iter()
        .filter_map(|bar| {
            let timestamp = Utc.timestamp_millis_opt(bar.t).single()?;
            let close = dec(bar.c)?;
            Some(HistoryPoint {
                timestamp,
                close,
                open: bar.o.and_then(dec),
                high: bar.h.and_then(dec),
                low: bar.l.and_then(dec),
                volume: bar.v.and_then(dec),
            })
        })
        .collect::<Vec<_>>();

    if points.is_empty() {
        return Err(MarketDataError::empty(PROVIDER_ID));
    }

    Ok(points)
}

// ============================================================================
// Trait Implementations
// ============================================================================

#[async_trait]
impl QuoteProvider for PolygonProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let key = self.key()?;
        let url = format!(
            "{}/v2/snapshot/locale/us/markets/stocks/tickers/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );

        debug!("Fetching quote for {} from Polygon", symbol);

        let response: SnapshotResponse =
            get_json(&self.client, PROVIDER_ID, &url, &[("apiKey", key)]).await?;

        map_quote(symbol, response)
    }
}

#[async_trait]
impl HistoryProvider for PolygonProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        _range: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let key = self.key()?;

        // Fixed lookback window; the caller's range token is not forwarded
        // because the aggregates endpoint takes explicit dates.
        let to = Utc::now().date_naive();
        let from = to - Duration::days(LOOKBACK_DAYS);
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            self.base_url,
            urlencoding::encode(symbol),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        debug!("Fetching history for {} from Polygon", symbol);

        let response: AggsResponse = get_json(
            &self.client,
            PROVIDER_ID,
            &url,
            &[("adjusted", "true"), ("sort", "asc"), ("limit", "50000"), ("apiKey", key)],
        )
        .await?;

        map_history(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn provider(api_key: Option<&str>) -> PolygonProvider {
        PolygonProvider::new(Client::new(), api_key.map(String::from))
    }

    #[test]
    fn test_provider_id() {
        assert_eq!(QuoteProvider::id(&provider(Some("k"))), "polygon");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let err = provider(None).fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, MarketDataError::NotConfigured { .. }));

        let err = provider(None).fetch_history("AAPL", "1mo").await.unwrap_err();
        assert!(matches!(err, MarketDataError::NotConfigured { .. }));
    }

    #[test]
    fn test_map_quote() {
        let json = r#"{
            "ticker": {
                "ticker": "AAPL",
                "todaysChange": 1.5,
                "todaysChangePerc": 1.01,
                "day": {"c": 150.5, "h": 152.0, "l": 148.5, "v": 1000000.0},
                "prevDay": {"c": 149.0},
                "lastTrade": {"p": 150.25}
            }
        }"#;
        let response: SnapshotResponse = serde_json::from_str(json).unwrap();
        let record = map_quote("AAPL", response).unwrap();

        assert_eq!(record.provider, "polygon");
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.price, dec!(150.25));
        assert_eq!(record.change, Some(dec!(1.5)));
        assert_eq!(record.change_percent, Some(dec!(1.01)));
        assert_eq!(record.volume, Some(dec!(1000000)));
        assert_eq!(record.previous_close, Some(dec!(149)));
        assert_eq!(record.day_high, Some(dec!(152)));
        assert_eq!(record.day_low, Some(dec!(148.5)));
        assert!(record.market_cap.is_none());
        assert_eq!(record.currency, "USD");
    }

    #[test]
    fn test_map_quote_without_last_trade_is_empty() {
        let json = r#"{"ticker": {"ticker": "AAPL", "day": {"c": 150.5}}}"#;
        let response: SnapshotResponse = serde_json::from_str(json).unwrap();
        let err = map_quote("AAPL", response).unwrap_err();
        assert!(matches!(err, MarketDataError::EmptyResult { .. }));
    }

    #[test]
    fn test_map_quote_missing_ticker_is_empty() {
        let response: SnapshotResponse = serde_json::from_str("{}").unwrap();
        let err = map_quote("AAPL", response).unwrap_err();
        assert!(matches!(err, MarketDataError::EmptyResult { .. }));
    }

    #[test]
    fn test_map_history() {
        let json = r#"{
            "results": [
                {"t": 1704067200000, "c": 150.0, "o": 149.5, "h": 151.0, "l": 149.0, "v": 900000.0},
                {"t": 1704153600000, "c": 151.0}
            ]
        }"#;
        let response: AggsResponse = serde_json::from_str(json).unwrap();
        let points = map_history(response).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, dec!(150));
        assert_eq!(points[0].open, Some(dec!(149.5)));
        assert_eq!(points[1].close, dec!(151));
        assert!(points[1].open.is_none());
    }

    #[test]
    fn test_map_history_empty_results() {
        let response: AggsResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(matches!(
            map_history(response).unwrap_err(),
            MarketDataError::EmptyResult { .. }
        ));

        let response: AggsResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            map_history(response).unwrap_err(),
            MarketDataError::EmptyResult { .. }
        ));
    }
}
