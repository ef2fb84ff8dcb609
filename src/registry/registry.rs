//! Provider registry and fallback resolution.
//!
//! Both pipelines share one pattern: compute the attempt order, invoke
//! adapters one at a time, short-circuit on the first validated record,
//! and surface a single terminal error once the order is exhausted.
//! Individual adapter failures are logged and swallowed - callers never
//! see per-provider causes.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::errors::MarketDataError;
use crate::models::{HistorySeries, ProviderId, QuoteRecord};
use crate::provider::http::build_client;
use crate::provider::{
    alpha_vantage::AlphaVantageProvider, finnhub::FinnhubProvider, iex::IexProvider,
    polygon::PolygonProvider, twelve_data::TwelveDataProvider, yahoo::YahooProvider,
    HistoryProvider, QuoteProvider,
};
use crate::settings::{FallbackPolicy, ProviderSettings};

/// Registry of provider adapters plus the policy that orders them.
///
/// Resolution is strictly sequential and deterministic: for a fixed
/// (symbol, preferred, adapter outcomes) tuple the same provider wins every
/// time. There is no racing, no latency-based reordering, and no shared
/// mutable state between resolutions.
pub struct ProviderRegistry {
    quote_providers: HashMap<ProviderId, Arc<dyn QuoteProvider>>,
    history_providers: HashMap<ProviderId, Arc<dyn HistoryProvider>>,
    policy: FallbackPolicy,
}

impl ProviderRegistry {
    /// Create an empty registry with the given attempt-order policy.
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            quote_providers: HashMap::new(),
            history_providers: HashMap::new(),
            policy,
        }
    }

    /// Build the full adapter set from configuration, with the default
    /// attempt order.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::with_policy(settings, FallbackPolicy::default())
    }

    /// Build the full adapter set from configuration with a custom policy.
    ///
    /// Adapters without a credential are still registered; they fail
    /// immediately and cheaply when attempted, which keeps the attempt
    /// order independent of configuration state.
    pub fn with_policy(settings: &ProviderSettings, policy: FallbackPolicy) -> Self {
        let client = build_client(settings.request_timeout());

        let polygon = Arc::new(PolygonProvider::new(
            client.clone(),
            settings.polygon_api_key.clone(),
        ));
        let finnhub = Arc::new(FinnhubProvider::new(
            client.clone(),
            settings.finnhub_api_key.clone(),
        ));
        let twelve_data = Arc::new(TwelveDataProvider::new(
            client.clone(),
            settings.twelve_data_api_key.clone(),
        ));
        let yahoo = Arc::new(YahooProvider::new(client.clone()));

        let mut registry = Self::new(policy);
        registry.register_quote_provider(polygon.clone());
        registry.register_quote_provider(Arc::new(IexProvider::new(
            client.clone(),
            settings.iex_cloud_token.clone(),
        )));
        registry.register_quote_provider(finnhub.clone());
        registry.register_quote_provider(Arc::new(AlphaVantageProvider::new(
            client,
            settings.alpha_vantage_api_key.clone(),
        )));
        registry.register_quote_provider(twelve_data.clone());
        registry.register_quote_provider(yahoo.clone());

        registry.register_history_provider(polygon);
        registry.register_history_provider(finnhub);
        registry.register_history_provider(twelve_data);
        registry.register_history_provider(yahoo);

        registry
    }

    /// Register (or replace) a quote adapter under its own id.
    pub fn register_quote_provider(&mut self, provider: Arc<dyn QuoteProvider>) {
        self.quote_providers
            .insert(ProviderId::Borrowed(provider.id()), provider);
    }

    /// Register (or replace) a history adapter under its own id.
    pub fn register_history_provider(&mut self, provider: Arc<dyn HistoryProvider>) {
        self.history_providers
            .insert(ProviderId::Borrowed(provider.id()), provider);
    }

    /// Resolve a quote for `symbol`.
    ///
    /// The caller has already validated the symbol (non-empty, uppercased)
    /// and lowercased `preferred`. Returns the first adapter success in
    /// attempt order, or [`MarketDataError::AllProvidersFailed`] once every
    /// adapter has failed.
    pub async fn resolve_quote(
        &self,
        symbol: &str,
        preferred: Option<&str>,
    ) -> Result<QuoteRecord, MarketDataError> {
        let order = FallbackPolicy::promote(&self.policy.quote_order, preferred);

        for id in order {
            let Some(provider) = self.quote_providers.get(id) else {
                debug!("No quote adapter registered for '{}', skipping", id);
                continue;
            };

            match provider.fetch_quote(symbol).await {
                Ok(record) => {
                    info!("Resolved quote for {} via '{}'", symbol, id);
                    return Ok(record);
                }
                Err(e) => {
                    // Swallowed: the next provider in order gets its turn
                    warn!("Quote attempt via '{}' failed for {}: {}", id, symbol, e);
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed)
    }

    /// Resolve a history series for `symbol`.
    ///
    /// `range` is forwarded opaquely to range-aware adapters. The returned
    /// series is normalized: ascending timestamps, no duplicates, at most
    /// 180 points.
    pub async fn resolve_history(
        &self,
        symbol: &str,
        range: &str,
        preferred: Option<&str>,
    ) -> Result<HistorySeries, MarketDataError> {
        let order = FallbackPolicy::promote(&self.policy.history_order, preferred);

        for id in order {
            let Some(provider) = self.history_providers.get(id) else {
                debug!("No history adapter registered for '{}', skipping", id);
                continue;
            };

            match provider.fetch_history(symbol, range).await {
                Ok(points) => {
                    info!(
                        "Resolved history for {} via '{}' ({} raw points)",
                        symbol,
                        id,
                        points.len()
                    );
                    return Ok(HistorySeries::from_points(points));
                }
                Err(e) => {
                    warn!("History attempt via '{}' failed for {}: {}", id, symbol, e);
                }
            }
        }

        Err(MarketDataError::AllProvidersFailed)
    }
}
