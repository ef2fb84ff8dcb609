//! Shared HTTP plumbing for provider adapters.
//!
//! Every adapter speaks JSON over GET; the status handling and decode
//! failure mapping are identical across providers, so they live here once.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::errors::MarketDataError;

/// Build the client shared by all adapters. The timeout bounds each
/// adapter's single upstream call so one slow provider cannot stall the
/// whole fallback chain.
pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET `url` and decode the JSON body into `T`.
///
/// Network errors, non-success statuses, and undecodable bodies all map to
/// [`MarketDataError::Transport`] tagged with `provider`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    provider: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, MarketDataError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| MarketDataError::transport(provider, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MarketDataError::transport(
            provider,
            format!("HTTP {status}"),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| MarketDataError::transport(provider, format!("failed to read body: {e}")))?;

    serde_json::from_str(&body)
        .map_err(|e| MarketDataError::transport(provider, format!("failed to parse body: {e}")))
}
