//! Configuration for providers and fallback policy.
//!
//! Everything here is read once at process start and passed in explicitly;
//! the resolver and adapters hold no ambient global state. A missing
//! credential is an expected runtime state - the adapter self-disables -
//! not a startup error.

use std::time::Duration;

use crate::models::ProviderId;

/// Default attempt order for the quote pipeline. Order reflects assumed
/// data quality; callers can promote a provider per request without
/// changing this policy.
pub const DEFAULT_QUOTE_ORDER: &[&str] = &[
    "polygon",
    "iex",
    "finnhub",
    "alpha_vantage",
    "twelve_data",
    "yahoo",
];

/// Default attempt order for the history pipeline. Not every provider
/// offers candles, so this list is shorter than the quote order.
pub const DEFAULT_HISTORY_ORDER: &[&str] = &["polygon", "finnhub", "twelve_data", "yahoo"];

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-provider credentials and transport settings.
#[derive(Clone, Debug, Default)]
pub struct ProviderSettings {
    pub polygon_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
    pub iex_cloud_token: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub twelve_data_api_key: Option<String>,

    /// Per-adapter request deadline so one slow upstream cannot stall the
    /// whole fallback chain. `None` applies the default of 10 seconds.
    pub request_timeout: Option<Duration>,
}

impl ProviderSettings {
    /// Read credentials from the conventional environment variables.
    /// Unset or empty variables leave the provider unconfigured.
    pub fn from_env() -> Self {
        Self {
            polygon_api_key: env_key("POLYGON_API_KEY"),
            finnhub_api_key: env_key("FINNHUB_API_KEY"),
            iex_cloud_token: env_key("IEX_CLOUD_TOKEN"),
            alpha_vantage_api_key: env_key("ALPHA_VANTAGE_API_KEY"),
            twelve_data_api_key: env_key("TWELVE_DATA_API_KEY"),
            request_timeout: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Attempt-order policy for both pipelines.
///
/// The order is data, not a hardcoded constant, so deployments can reshuffle
/// providers without code changes.
#[derive(Clone, Debug)]
pub struct FallbackPolicy {
    pub quote_order: Vec<ProviderId>,
    pub history_order: Vec<ProviderId>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            quote_order: DEFAULT_QUOTE_ORDER
                .iter()
                .copied()
                .map(ProviderId::Borrowed)
                .collect(),
            history_order: DEFAULT_HISTORY_ORDER
                .iter()
                .copied()
                .map(ProviderId::Borrowed)
                .collect(),
        }
    }
}

impl FallbackPolicy {
    /// Compute the attempt order for one resolution: the default order with
    /// the preferred provider, when it is present in the list, moved to the
    /// front. This is a promotion, not a filter - every other provider keeps
    /// its relative position as a fallback. Unknown tokens leave the order
    /// unchanged.
    pub(crate) fn promote<'a>(order: &'a [ProviderId], preferred: Option<&str>) -> Vec<&'a ProviderId> {
        let mut result: Vec<&ProviderId> = order.iter().collect();
        if let Some(preferred) = preferred {
            if let Some(pos) = result.iter().position(|id| id.as_ref() == preferred) {
                let promoted = result.remove(pos);
                result.insert(0, promoted);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(order: &[&ProviderId]) -> Vec<String> {
        order.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_default_orders() {
        let policy = FallbackPolicy::default();
        assert_eq!(policy.quote_order.len(), 6);
        assert_eq!(policy.history_order.len(), 4);
        assert_eq!(policy.quote_order[0], "polygon");
        assert_eq!(policy.quote_order.last().unwrap(), "yahoo");
    }

    #[test]
    fn test_promote_moves_preferred_to_front_preserving_rest() {
        let policy = FallbackPolicy::default();
        let order = FallbackPolicy::promote(&policy.quote_order, Some("finnhub"));
        assert_eq!(
            ids(&order),
            vec![
                "finnhub",
                "polygon",
                "iex",
                "alpha_vantage",
                "twelve_data",
                "yahoo"
            ]
        );
    }

    #[test]
    fn test_promote_unknown_token_is_noop() {
        let policy = FallbackPolicy::default();
        let order = FallbackPolicy::promote(&policy.quote_order, Some("bloomberg"));
        assert_eq!(ids(&order), DEFAULT_QUOTE_ORDER.to_vec());
    }

    #[test]
    fn test_promote_without_preference_is_default_order() {
        let policy = FallbackPolicy::default();
        let order = FallbackPolicy::promote(&policy.history_order, None);
        assert_eq!(ids(&order), DEFAULT_HISTORY_ORDER.to_vec());
    }

    #[test]
    fn test_promote_already_first_is_stable() {
        let policy = FallbackPolicy::default();
        let order = FallbackPolicy::promote(&policy.quote_order, Some("polygon"));
        assert_eq!(ids(&order), DEFAULT_QUOTE_ORDER.to_vec());
    }

    #[test]
    fn test_request_timeout_default() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));

        let settings = ProviderSettings {
            request_timeout: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
    }
}
