//! Quote Relay
//!
//! Provider-fallback aggregation core for stock quotes and historical
//! prices. Multiple third-party data sources are normalized into one
//! schema; a preference-ordered fallback chain tries them in sequence and
//! returns the first success.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |  Transport layer | --> | ProviderRegistry |  (attempt ordering,
//! |  (out of scope)  |     |                  |   sequential fallback)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |     Adapter      |  (Polygon, IEX, Finnhub,
//!                          |                  |   AlphaVantage, TwelveData,
//!                          +------------------+   Yahoo)
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   QuoteRecord /  |  (normalized schema)
//!                          |   HistorySeries  |
//!                          +------------------+
//! ```
//!
//! The transport layer validates input (non-empty uppercased symbol,
//! lowercased provider preference, defaulted range token) and maps the
//! single terminal error to its status code; everything between the symbol
//! string and the normalized record lives here.
//!
//! # Example
//!
//! ```no_run
//! use quote_relay::{ProviderRegistry, ProviderSettings};
//!
//! # async fn run() -> Result<(), quote_relay::MarketDataError> {
//! let registry = ProviderRegistry::from_settings(&ProviderSettings::from_env());
//!
//! let quote = registry.resolve_quote("AAPL", None).await?;
//! println!("{} = {} ({})", quote.symbol, quote.price, quote.provider);
//!
//! let history = registry.resolve_history("AAPL", "1mo", Some("yahoo")).await?;
//! println!("{} points", history.len());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod settings;

// Re-export the public surface
pub use errors::MarketDataError;
pub use models::{Currency, HistoryPoint, HistorySeries, ProviderId, QuoteRecord, MAX_POINTS};
pub use registry::ProviderRegistry;
pub use settings::{FallbackPolicy, ProviderSettings, DEFAULT_HISTORY_ORDER, DEFAULT_QUOTE_ORDER};

// Re-export provider types
pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::iex::IexProvider;
pub use provider::polygon::PolygonProvider;
pub use provider::twelve_data::TwelveDataProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{HistoryProvider, QuoteProvider};
