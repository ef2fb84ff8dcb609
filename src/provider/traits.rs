//! Provider adapter trait definitions.
//!
//! One trait per capability: providers that serve both snapshots and
//! candles implement both. Adapters are independent units - adding,
//! removing, or reordering one never touches another.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{HistoryPoint, QuoteRecord};

/// A provider that can serve a current-price snapshot.
///
/// Implementations perform exactly one upstream call per invocation and
/// signal every failure condition through the returned error: missing
/// credential, transport problems, and responses without a usable price
/// all come back as `Err`, never as a panic, so the registry can discard
/// the attempt and move on.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Stable lowercase identifier, e.g. "polygon". Used as the record's
    /// provenance field and as the token callers pass to express a
    /// preference.
    fn id(&self) -> &'static str;

    /// Fetch and normalize the latest quote for `symbol`.
    ///
    /// A returned record always has a populated price; an upstream response
    /// without one is an [`MarketDataError::EmptyResult`].
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteRecord, MarketDataError>;
}

/// A provider that can serve historical daily closes.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Stable lowercase identifier, shared with the quote side when the
    /// same upstream serves both.
    fn id(&self) -> &'static str;

    /// Fetch the raw series for `symbol`.
    ///
    /// `range` is an opaque caller token (e.g. "1mo"); range-aware adapters
    /// forward it upstream, the rest use a fixed lookback and ignore it.
    /// An empty series is an [`MarketDataError::EmptyResult`]; ordering,
    /// deduplication and truncation are normalized by the registry.
    async fn fetch_history(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<Vec<HistoryPoint>, MarketDataError>;
}
