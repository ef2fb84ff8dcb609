//! Error types for quote and history resolution.
//!
//! The first three variants are per-adapter failure reasons. They stay local
//! to the adapter and the registry: the registry logs them, moves on to the
//! next provider, and surfaces only [`MarketDataError::AllProvidersFailed`]
//! to callers once the chain is exhausted.

use thiserror::Error;

/// Errors that can occur during market data resolution.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The adapter has no credential configured. Signalled before any
    /// network I/O is attempted.
    #[error("Provider not configured: {provider}")]
    NotConfigured {
        /// The provider missing its credential
        provider: String,
    },

    /// The upstream call failed in transport: network error, non-success
    /// status, or an unparseable payload.
    #[error("Transport failure: {provider} - {message}")]
    Transport {
        /// The provider whose upstream call failed
        provider: String,
        /// What went wrong
        message: String,
    },

    /// The upstream call nominally succeeded but lacked the minimum
    /// required field: no usable price for quotes, an empty series for
    /// history.
    #[error("Empty result from provider: {provider}")]
    EmptyResult {
        /// The provider that returned nothing usable
        provider: String,
    },

    /// Every provider in the computed order failed. The only error the
    /// registry surfaces to callers.
    #[error("All providers failed")]
    AllProvidersFailed,
}

impl MarketDataError {
    /// Convenience constructor for [`Self::NotConfigured`].
    pub fn not_configured(provider: &str) -> Self {
        Self::NotConfigured {
            provider: provider.to_string(),
        }
    }

    /// Convenience constructor for [`Self::Transport`].
    pub fn transport(provider: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Self::EmptyResult`].
    pub fn empty(provider: &str) -> Self {
        Self::EmptyResult {
            provider: provider.to_string(),
        }
    }
}
