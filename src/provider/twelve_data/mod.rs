//! Twelve Data provider implementation.
//!
//! - Quotes via the /quote endpoint
//! - History via the /time_series endpoint (daily interval)
//!
//! Requires an API key. Numeric fields arrive as strings; errors arrive as
//! a JSON envelope with status "error" rather than a non-2xx status.
//! API documentation: https://twelvedata.com/docs

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{HistoryPoint, QuoteRecord};
use crate::provider::http::get_json;
use crate::provider::{HistoryProvider, QuoteProvider};

const BASE_URL: &str = "https://api.twelvedata.com";
const PROVIDER_ID: &str = "twelve_data";

/// Daily bars requested; matches the series cap so nothing is fetched just
/// to be truncated.
const OUTPUT_SIZE: &str = "180";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote
#[derive(Debug, Deserialize)]
struct TdQuote {
    symbol: Option<String>,
    name: Option<String>,
    exchange: Option<String>,
    currency: Option<String>,
    high: Option<String>,
    low: Option<String>,
    close: Option<String>,
    volume: Option<String>,
    previous_close: Option<String>,
    change: Option<String>,
    /// Already in percent units
    percent_change: Option<String>,
    /// "error" on failure envelopes
    status: Option<String>,
    message: Option<String>,
}

/// Response from /time_series
#[derive(Debug, Deserialize)]
struct TdTimeSeries {
    #[serde(default)]
    values: Vec<TdBar>,
    status: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TdBar {
    /// "2024-06-14" for daily bars
    datetime: String,
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    close: Option<String>,
    volume: Option<String>,
}

// ============================================================================
// TwelveDataProvider
// ============================================================================

/// Twelve Data market data provider. Serves both pipelines.
pub struct TwelveDataProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl TwelveDataProvider {
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

fn dec_str(v: Option<&String>) -> Option<Decimal> {
    v.and_then(|s| Decimal::from_str(s).ok())
}

fn map_quote(symbol: &str, quote: TdQuote) -> Result<QuoteRecord, MarketDataError> {
    if quote.status.as_deref() == Some("error") {
        return Err(MarketDataError::transport(
            PROVIDER_ID,
            quote.message.unwrap_or_else(|| "error status".to_string()),
        ));
    }

    let price =
        dec_str(quote.close.as_ref()).ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let symbol = quote.symbol.unwrap_or_else(|| symbol.to_string());

    Ok(QuoteRecord {
        provider: PROVIDER_ID.to_string(),
        symbol: symbol.clone(),
        name: quote.name.unwrap_or(symbol),
        price,
        change: dec_str(quote.change.as_ref()),
        change_percent: dec_str(quote.percent_change.as_ref()),
        volume: dec_str(quote.volume.as_ref()),
        market_cap: None,
        pe: None,
        previous_close: dec_str(quote.previous_close.as_ref()),
        day_high: dec_str(quote.high.as_ref()),
        day_low: dec_str(quote.low.as_ref()),
        currency: quote.currency.unwrap_or_else(|| "USD".to_string()),
        exchange_name: quote.exchange,
    })
}

fn map_history(response: TdTimeSeries) -> Result<Vec<HistoryPoint>, MarketDataError> {
    if response.status.as_deref() == Some("error") {
        return Err(MarketDataError::transport(
            PROVIDER_ID,
            response
                .message
                .unwrap_or_else(|| "error status".to_string()),
        ));
    }

    // Values arrive newest-first; the registry re-sorts, so order here is
    // not significant
    let points = response
        .values
        .into_iter()
        .filter_map(|bar| {
            let date = NaiveDate::parse_from_str(&bar.datetime, "%Y-%m-%d").ok()?;
            let timestamp = Utc
                .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
                .single()?;
            let close = dec_str(bar.close.as_ref())?;
            Some(HistoryPoint {
                timestamp,
                close,
                open: dec_str(bar.open.as_ref()),
                high: dec_str(bar.high.as_ref()),
                low: dec_str(bar.low.as_ref()),
                volume: dec_str(bar.volume.as_ref()),
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
impl QuoteProvider for TwelveDataProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let key = self.key()?;
        let url = format!("{}/quote", self.base_url);

        debug!("Fetching quote for {} from Twelve Data", symbol);

        let quote: TdQuote = get_json(
            &self.client,
            PROVIDER_ID,
            &url,
            &[("symbol", symbol), ("apikey", key)],
        )
        .await?;

        map_quote(symbol, quote)
    }
}

#[async_trait]
impl HistoryProvider for TwelveDataProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        _range: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let key = self.key()?;
        let url = format!("{}/time_series", self.base_url);

        debug!("Fetching history for {} from Twelve Data", symbol);

        let response: TdTimeSeries = get_json(
            &self.client,
            PROVIDER_ID,
            &url,
            &[
                ("symbol", symbol),
                ("interval", "1day"),
                ("outputsize", OUTPUT_SIZE),
                ("apikey", key),
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
        let provider = TwelveDataProvider::new(Client::new(), None);
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
            "symbol": "AAPL",
            "name": "Apple Inc",
            "exchange": "NASDAQ",
            "currency": "USD",
            "open": "149.00",
            "high": "152.00",
            "low": "148.50",
            "close": "150.25",
            "volume": "52000000",
            "previous_close": "148.75",
            "change": "1.50",
            "percent_change": "1.01"
        }"#;
        let quote: TdQuote = serde_json::from_str(json).unwrap();
        let record = map_quote("AAPL", quote).unwrap();

        assert_eq!(record.provider, "twelve_data");
        assert_eq!(record.name, "Apple Inc");
        assert_eq!(record.price, dec!(150.25));
        assert_eq!(record.change_percent, Some(dec!(1.01)));
        assert_eq!(record.exchange_name, Some("NASDAQ".to_string()));
        assert_eq!(record.currency, "USD");
    }

    #[test]
    fn test_map_quote_error_envelope_is_transport() {
        let json = r#"{"code": 400, "message": "symbol not found", "status": "error"}"#;
        let quote: TdQuote = serde_json::from_str(json).unwrap();
        assert!(matches!(
            map_quote("ZZZZ", quote).unwrap_err(),
            MarketDataError::Transport { .. }
        ));
    }

    #[test]
    fn test_map_quote_missing_close_is_empty() {
        let quote: TdQuote = serde_json::from_str(r#"{"symbol": "AAPL"}"#).unwrap();
        assert!(matches!(
            map_quote("AAPL", quote).unwrap_err(),
            MarketDataError::EmptyResult { .. }
        ));
    }

    #[test]
    fn test_map_history() {
        let json = r#"{
            "values": [
                {"datetime": "2024-06-14", "open": "150.5", "high": "152.0", "low": "150.0", "close": "151.0", "volume": "1100000"},
                {"datetime": "2024-06-13", "open": "149.5", "high": "151.0", "low": "149.0", "close": "150.0", "volume": "1000000"}
            ],
            "status": "ok"
        }"#;
        let response: TdTimeSeries = serde_json::from_str(json).unwrap();
        let points = map_history(response).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, dec!(151.0));
        assert_eq!(points[1].volume, Some(dec!(1000000)));
    }

    #[test]
    fn test_map_history_empty_values() {
        let response: TdTimeSeries =
            serde_json::from_str(r#"{"values": [], "status": "ok"}"#).unwrap();
        assert!(matches!(
            map_history(response).unwrap_err(),
            MarketDataError::EmptyResult { .. }
        ));
    }
}
