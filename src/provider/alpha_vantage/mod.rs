//! Alpha Vantage provider implementation.
//!
//! Quotes via the GLOBAL_QUOTE function. Quote pipeline only. All numeric
//! fields arrive as strings; percent change arrives with a trailing "%"
//! and is already in percent units.
//!
//! Requires an API key. Free tier is limited to 5 calls per minute; a
//! throttled request returns a "Note"/"Information" payload instead of a
//! quote, which is mapped to a transport failure.

use std::str::FromStr;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::QuoteRecord;
use crate::provider::http::get_json;
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "alpha_vantage";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response envelope for function=GLOBAL_QUOTE
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    symbol: Option<String>,
    #[serde(rename = "03. high")]
    high: Option<String>,
    #[serde(rename = "04. low")]
    low: Option<String>,
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    /// e.g. "1.0100%"
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

// ============================================================================
// AlphaVantageProvider
// ============================================================================

/// Alpha Vantage market data provider. Requires an API key.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AlphaVantageProvider {
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
}

fn dec_str(v: Option<&String>) -> Option<Decimal> {
    v.and_then(|s| Decimal::from_str(s).ok())
}

fn percent_str(v: Option<&String>) -> Option<Decimal> {
    v.and_then(|s| Decimal::from_str(s.trim_end_matches('%')).ok())
}

fn map_quote(symbol: &str, response: GlobalQuoteResponse) -> Result<QuoteRecord, MarketDataError> {
    if let Some(message) = response
        .error_message
        .or(response.note)
        .or(response.information)
    {
        return Err(MarketDataError::transport(PROVIDER_ID, message));
    }

    let quote = response
        .global_quote
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let price =
        dec_str(quote.price.as_ref()).ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let symbol = quote.symbol.unwrap_or_else(|| symbol.to_string());

    Ok(QuoteRecord {
        provider: PROVIDER_ID.to_string(),
        symbol: symbol.clone(),
        name: symbol,
        price,
        change: dec_str(quote.change.as_ref()),
        change_percent: percent_str(quote.change_percent.as_ref()),
        volume: dec_str(quote.volume.as_ref()),
        market_cap: None,
        pe: None,
        previous_close: dec_str(quote.previous_close.as_ref()),
        day_high: dec_str(quote.high.as_ref()),
        day_low: dec_str(quote.low.as_ref()),
        currency: "USD".to_string(),
        exchange_name: None,
    })
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MarketDataError::not_configured(PROVIDER_ID))?;

        debug!("Fetching quote for {} from Alpha Vantage", symbol);

        let response: GlobalQuoteResponse = get_json(
            &self.client,
            PROVIDER_ID,
            &self.base_url,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", key),
            ],
        )
        .await?;

        map_quote(symbol, response)
    }
}

// ============================================================================
// Tests
// ============================================================================
