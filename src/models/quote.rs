use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalized quote snapshot.
///
/// Every adapter maps its native response onto this shape. `price` is the
/// only required numeric field: an adapter that cannot produce a usable
/// price fails its attempt instead of returning a record. All other numeric
/// fields are optional because not every provider reports them; absent
/// upstream data stays `None` rather than a fabricated default.
///
/// `change_percent` is always a percentage (1.5 means 1.5%), never a
/// fraction - adapters whose upstream reports fractions rescale on mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Provider the record came from ("polygon", "yahoo", ...)
    pub provider: String,

    /// Ticker symbol as reported by the provider
    pub symbol: String,

    /// Display name; falls back to the symbol when the provider has none
    pub name: String,

    /// Current price (required)
    pub price: Decimal,

    /// Absolute change since previous close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<Decimal>,

    /// Percent change since previous close, in percent units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<Decimal>,

    /// Trading volume
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,

    /// Market capitalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,

    /// Price/earnings ratio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe: Option<Decimal>,

    /// Previous session close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,

    /// Session high
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_high: Option<Decimal>,

    /// Session low
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_low: Option<Decimal>,

    /// Quote currency
    pub currency: String,

    /// Exchange display name, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_name: Option<String>,
}

impl QuoteRecord {
    /// Create a record with only the required fields populated.
    pub fn new(
        provider: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            symbol: symbol.into(),
            name: name.into(),
            price,
            change: None,
            change_percent: None,
            volume: None,
            market_cap: None,
            pe: None,
            previous_close: None,
            day_high: None,
            day_low: None,
            currency: currency.into(),
            exchange_name: None,
        }
    }
}
