//! IEX Cloud provider implementation.
//!
//! Quotes via the /stable/stock/{symbol}/quote endpoint. Quote pipeline
//! only; IEX candles are not wired up.
//!
//! IEX reports percent change as a fraction (0.0123 for 1.23%); the mapping
//! rescales it to the canonical percent unit.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::QuoteRecord;
use crate::provider::http::get_json;
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://cloud.iexapis.com/stable";
const PROVIDER_ID: &str = "iex";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /stable/stock/{symbol}/quote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IexQuote {
    symbol: Option<String>,
    company_name: Option<String>,
    /// Latest price; null for unknown symbols
    latest_price: Option<f64>,
    change: Option<f64>,
    /// Fraction, not percent
    change_percent: Option<f64>,
    latest_volume: Option<f64>,
    market_cap: Option<f64>,
    pe_ratio: Option<f64>,
    previous_close: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    primary_exchange: Option<String>,
}

// ============================================================================
// IexProvider
// ============================================================================

/// IEX Cloud market data provider. Requires an API token.
pub struct IexProvider {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl IexProvider {
    pub fn new(client: Client, token: Option<String>) -> Self {
        Self {
            client,
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the upstream base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn dec(v: f64) -> Option<Decimal> {
    Decimal::try_from(v).ok()
}

fn map_quote(symbol: &str, quote: IexQuote) -> Result<QuoteRecord, MarketDataError> {
    let price = quote
        .latest_price
        .and_then(dec)
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let symbol = quote.symbol.unwrap_or_else(|| symbol.to_string());

    Ok(QuoteRecord {
        provider: PROVIDER_ID.to_string(),
        symbol: symbol.clone(),
        name: quote.company_name.unwrap_or(symbol),
        price,
        change: quote.change.and_then(dec),
        change_percent: quote
            .change_percent
            .and_then(dec)
            .map(|d| d * Decimal::ONE_HUNDRED),
        volume: quote.latest_volume.and_then(dec),
        market_cap: quote.market_cap.and_then(dec),
        pe: quote.pe_ratio.and_then(dec),
        previous_close: quote.previous_close.and_then(dec),
        day_high: quote.high.and_then(dec),
        day_low: quote.low.and_then(dec),
        currency: "USD".to_string(),
        exchange_name: quote.primary_exchange,
    })
}

#[async_trait]
impl QuoteProvider for IexProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| MarketDataError::not_configured(PROVIDER_ID))?;

        let url = format!(
            "{}/stock/{}/quote",
            self.base_url,
            urlencoding::encode(symbol)
        );

        debug!("Fetching quote for {} from IEX", symbol);

        let quote: IexQuote = get_json(&self.client, PROVIDER_ID, &url, &[("token", token)]).await?;

        map_quote(symbol, quote)
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
    async fn test_missing_token_fails_before_network() {
        let provider = IexProvider::new(Client::new(), None);
        let err = provider.fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, MarketDataError::NotConfigured { .. }));
    }

    #[test]
    fn test_map_quote_rescales_percent() {
        let json = r#"{
            "symbol": "AAPL",
            "companyName": "Apple Inc",
            "latestPrice": 150.25,
            "change": 1.5,
            "changePercent": 0.0101,
            "latestVolume": 52000000,
            "marketCap": 2400000000000,
            "peRatio": 28.5,
            "previousClose": 148.75,
            "high": 152.0,
            "low": 148.5,
            "primaryExchange": "NASDAQ"
        }"#;
        let quote: IexQuote = serde_json::from_str(json).unwrap();
        let record = map_quote("AAPL", quote).unwrap();

        assert_eq!(record.provider, "iex");
        assert_eq!(record.name, "Apple Inc");
        assert_eq!(record.price, dec!(150.25));
        // Fraction 0.0101 becomes 1.01 percent
        assert_eq!(record.change_percent, Some(dec!(1.0100)));
        assert_eq!(record.market_cap, Some(dec!(2400000000000)));
        assert_eq!(record.pe, Some(dec!(28.5)));
        assert_eq!(record.exchange_name, Some("NASDAQ".to_string()));
    }

    #[test]
    fn test_map_quote_null_price_is_empty() {
        let json = r#"{"symbol": "ZZZZ", "latestPrice": null}"#;
        let quote: IexQuote = serde_json::from_str(json).unwrap();
        assert!(matches!(
            map_quote("ZZZZ", quote).unwrap_err(),
            MarketDataError::EmptyResult { .. }
        ));
    }

    #[test]
    fn test_map_quote_name_falls_back_to_symbol() {
        let json = r#"{"latestPrice": 10.0}"#;
        let quote: IexQuote = serde_json::from_str(json).unwrap();
        let record = map_quote("XYZ", quote).unwrap();
        assert_eq!(record.symbol, "XYZ");
        assert_eq!(record.name, "XYZ");
    }
}
