//! Yahoo Finance provider implementation.
//!
//! - Quotes via the v7 /finance/quote endpoint
//! - History via the v8 /finance/chart endpoint (range-aware)
//!
//! Yahoo is keyless, so this adapter is always configured and sits last in
//! the default order as the fallback of last resort.
//!
//! The displayed price depends on market state: pre-market price during
//! pre-open, post-market price after close, regular session price otherwise.

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

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const PROVIDER_ID: &str = "yahoo";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /v7/finance/quote
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: Option<QuoteResponse>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    /// "PRE", "PREPRE", "REGULAR", "POST", "POSTPOST", "CLOSED"
    market_state: Option<String>,
    pre_market_price: Option<f64>,
    post_market_price: Option<f64>,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    /// Already in percent units
    regular_market_change_percent: Option<f64>,
    regular_market_volume: Option<f64>,
    market_cap: Option<f64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    currency: Option<String>,
    full_exchange_name: Option<String>,
    exchange: Option<String>,
}

/// Response from /v8/finance/chart/{symbol}
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Option<Chart>,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Vec<ChartResult>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<IndicatorQuote>,
}

/// Arrays are index-aligned with `timestamp`; entries are null for halted
/// or missing sessions.
#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ============================================================================
// YahooProvider
// ============================================================================

/// Yahoo Finance market data provider. Keyless; serves both pipelines.
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
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

/// Pick the price to display for the current market state. Pre/post prices
/// are used only when the state calls for them and the price is present;
/// everything else falls back to the regular session price.
fn select_price(quote: &YahooQuote) -> Option<f64> {
    match quote.market_state.as_deref() {
        Some("PRE") | Some("PREPRE") => quote.pre_market_price.or(quote.regular_market_price),
        Some("POST") | Some("POSTPOST") | Some("CLOSED") => {
            quote.post_market_price.or(quote.regular_market_price)
        }
        _ => quote.regular_market_price,
    }
}

fn map_quote(envelope: QuoteEnvelope) -> Result<QuoteRecord, MarketDataError> {
    let quote = envelope
        .quote_response
        .and_then(|r| r.result.into_iter().next())
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let price = select_price(&quote)
        .and_then(dec)
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let symbol = quote
        .symbol
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    Ok(QuoteRecord {
        provider: PROVIDER_ID.to_string(),
        symbol: symbol.clone(),
        name: quote.long_name.or(quote.short_name).unwrap_or(symbol),
        price,
        change: quote.regular_market_change.and_then(dec),
        change_percent: quote.regular_market_change_percent.and_then(dec),
        volume: quote.regular_market_volume.and_then(dec),
        market_cap: quote.market_cap.and_then(dec),
        pe: quote.trailing_pe.and_then(dec),
        previous_close: quote.regular_market_previous_close.and_then(dec),
        day_high: quote.regular_market_day_high.and_then(dec),
        day_low: quote.regular_market_day_low.and_then(dec),
        currency: quote.currency.unwrap_or_else(|| "USD".to_string()),
        exchange_name: quote.full_exchange_name.or(quote.exchange),
    })
}

fn map_history(envelope: ChartEnvelope) -> Result<Vec<HistoryPoint>, MarketDataError> {
    let result = envelope
        .chart
        .and_then(|c| c.result.into_iter().next())
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let indicators = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .ok_or_else(|| MarketDataError::empty(PROVIDER_ID))?;

    let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten().and_then(dec);

    let points = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            // Null closes mark sessions without data; skip them
            let close = at(&indicators.close, i)?;
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            Some(HistoryPoint {
                timestamp,
                close,
                open: at(&indicators.open, i),
                high: at(&indicators.high, i),
                low: at(&indicators.low, i),
                volume: at(&indicators.volume, i),
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
impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError> {
        let url = format!("{}/v7/finance/quote", self.base_url);

        debug!("Fetching quote for {} from Yahoo", symbol);

        let envelope: QuoteEnvelope =
            get_json(&self.client, PROVIDER_ID, &url, &[("symbols", symbol)]).await?;

        map_quote(envelope)
    }
}

#[async_trait]
impl HistoryProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_history(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );

        debug!("Fetching history for {} ({}) from Yahoo", symbol, range);

        let envelope: ChartEnvelope = get_json(
            &self.client,
            PROVIDER_ID,
            &url,
            &[("range", range), ("interval", "1d"), ("events", "div,splits")],
        )
        .await?;

        map_history(envelope)
    }
}

// ============================================================================
// Tests
// ============================================================================
