//! Finnhub provider implementation.
//!
//! - Quotes via the /quote endpoint
//! - History via the /stock/candle endpoint
//!
//! Requires an API key. Finnhub returns zeros rather than an error for
//! unknown symbols, so an all-zero quote is treated as an empty result.
//! API documentation: https://finnhub.io/docs/api

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{HistoryPoint, QuoteRecord};
use crate::provider::http::get_json;
use crate::provider::{HistoryProvider, QuoteProvider};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "finnhub";

/// Candle lookback in calendar days, enough for 180 trading days.
const LOOKBACK_DAYS: i64 = 200;

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change since previous close
    d: Option<f64>,
    /// Percent change since previous close, already in percent units
    dp: Option<f64>,
    /// High of the day
    h: Option<f64>,
    /// Low of the day
    l: Option<f64>,
    /// Open of the day
    o: Option<f64>,
    /// Previous close
    pc: Option<f64>,
}

/// Response from /stock/candle
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    /// Close prices
    #[serde(default)]
    c: Vec<f64>,
    /// High prices
    #[serde(default)]
    h: Vec<f64>,
    /// Low prices
    #[serde(default)]
    l: Vec<f64>,
    /// Open prices
    #[serde(default)]
    o: Vec<f64>,
    /// Volume
    #[serde(default)]
    v: Vec<f64>,
    /// Timestamps (Unix seconds)
    #[serde(default)]
    t: Vec<i64>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub market data provider. Serves both pipelines.
pub struct FinnhubProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl FinnhubProvider {
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

fn map_quote(symbol: &str, response: QuoteResponse) -> Result<QuoteRecord, MarketDataError> {
    let close = response
        .c
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    // Zeros across the board mean the symbol is unknown
    if close == 0.0 && response.o.unwrap_or(0.0) == 0.0 {
        return Err(MarketDataError::empty(PROVIDER_ID));
    }

    let price = dec(close).ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    Ok(QuoteRecord {
        provider: PROVIDER_ID.to_string(),
        symbol: symbol.to_string(),
        name: symbol.to_string(),
        price,
        change: response.d.and_then(dec),
        change_percent: response.dp.and_then(dec),
        volume: None, // /quote does not report volume
        market_cap: None,
        pe: None,
        previous_close: response.pc.and_then(dec),
        day_high: response.h.and_then(dec),
        day_low: response.l.and_then(dec),
        currency: "USD".to_string(),
        exchange_name: None,
    })
}

fn map_history(response: CandleResponse) -> Result<Vec<HistoryPoint>, MarketDataError> {
    if response.s == "no_data" {
        return Err(MarketDataError::empty(PROVIDER_ID));
    }
    if response.s != "ok" {
        return Err(MarketDataError::transport(
            PROVIDER_ID,
            format!("unexpected candle status: {}", response.s),
        ));
    }
    if response.t.is_empty() || response.c.len() != response.t.len() {
        return Err(MarketDataError::empty(PROVIDER_ID));
    }

    let points = response
        .t
        .iter()
        .zip(response.c.iter())
        .enumerate()
        .filter_map(|(i, (&ts, &close))| {
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            let close = dec(close)?;
            Some(HistoryPoint {
                timestamp,
                close,
                open: response.o.get(i).copied().and_then(dec),
                high: response.h.get(i).copied().and_then(dec),
                low: response.l.get(i).copied().and_then(dec),
                volume: response.v.get(i).copied().and_then(dec),
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
impl QuoteProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let key = self.key()?;
        let url = format!("{}/quote", self.base_url);

        debug!("Fetching quote for {} from Finnhub", symbol);

        let response: QuoteResponse = get_json(
            &self.client,
            PROVIDER_ID,
            &url,
            &[("symbol", symbol), ("token", key)],
        )
        .await?;

        map_quote(symbol, response)
    }
}

#[async_trait]
impl HistoryProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        _range: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let key = self.key()?;
        let url = format!("{}/stock/candle", self.base_url);

        // Fixed lookback; the candle endpoint takes explicit Unix bounds.
        let to = Utc::now().timestamp();
        let from = to - LOOKBACK_DAYS * 86_400;
        let from = from.to_string();
        let to = to.to_string();

        debug!("Fetching history for {} from Finnhub", symbol);

        let response: CandleResponse = get_json(
            &self.client,
            PROVIDER_ID,
            &url,
            &[
                ("symbol", symbol),
                ("resolution", "D"),
                ("from", &from),
                ("to", &to),
                ("token", key),
            ],
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

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let provider = FinnhubProvider::new(Client::new(), None);
        assert!(matches!(
            provider.fetch_quote("AAPL").await.unwrap_err(),
            MarketDataError::NotConfigured { .. }
        ));
        assert!(matches!(
            provider.fetch_history("AAPL", "1mo").await.unwrap_err(),
            MarketDataError::NotConfigured { .. }
        ));
    }

    #[test]
    fn test_map_quote() {
        let json = r#"{
            "c": 150.25,
            "d": 1.5,
            "dp": 1.01,
            "h": 152.0,
            "l": 148.5,
            "o": 149.0,
            "pc": 148.75
        }"#;
        let response: QuoteResponse = serde_json::from_str(json).unwrap();
        let record = map_quote("AAPL", response).unwrap();

        assert_eq!(record.provider, "finnhub");
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.price, dec!(150.25));
        assert_eq!(record.change, Some(dec!(1.5)));
        assert_eq!(record.change_percent, Some(dec!(1.01)));
        assert_eq!(record.previous_close, Some(dec!(148.75)));
        assert!(record.volume.is_none());
        assert!(record.exchange_name.is_none());
    }

    #[test]
    fn test_map_quote_all_zero_is_empty() {
        let json = r#"{"c": 0.0, "d": null, "dp": null, "h": 0.0, "l": 0.0, "o": 0.0, "pc": 0.0}"#;
        let response: QuoteResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            map_quote("ZZZZ", response).unwrap_err(),
            MarketDataError::EmptyResult { .. }
        ));
    }

    #[test]
    fn test_map_history() {
        let json = r#"{
            "s": "ok",
            "c": [150.0, 151.0],
            "h": [151.0, 152.0],
            "l": [149.0, 150.0],
            "o": [149.5, 150.5],
            "v": [1000000, 1100000],
            "t": [1704067200, 1704153600]
        }"#;
        let response: CandleResponse = serde_json::from_str(json).unwrap();
        let points = map_history(response).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, dec!(150));
        assert_eq!(points[0].volume, Some(dec!(1000000)));
        assert!(points[0].timestamp < points[1].timestamp);
    }

    #[test]
    fn test_map_history_no_data_status() {
        let response: CandleResponse = serde_json::from_str(r#"{"s": "no_data"}"#).unwrap();
        assert!(matches!(
            map_history(response).unwrap_err(),
            MarketDataError::EmptyResult { .. }
        ));
    }

    #[test]
    fn test_map_history_error_status_is_transport() {
        let response: CandleResponse = serde_json::from_str(r#"{"s": "error"}"#).unwrap();
        assert!(matches!(
            map_history(response).unwrap_err(),
            MarketDataError::Transport { .. }
        ));
    }
}
