//! Provider adapters and the traits they implement.
//!
//! This module contains:
//! - The `QuoteProvider` and `HistoryProvider` capability traits
//! - One adapter per upstream source (Polygon, IEX, Finnhub, Alpha Vantage,
//!   Twelve Data, Yahoo Finance)
//!
//! Adapters receive a plain symbol string and own the full path from URL
//! construction through response validation to the normalized schema. An
//! adapter with no credential fails immediately and cheaply; the registry
//! treats that exactly like any other failed attempt.

pub(crate) mod http;
mod traits;

pub mod alpha_vantage;
pub mod finnhub;
pub mod iex;
pub mod polygon;
pub mod twelve_data;
pub mod yahoo;

pub use traits::{HistoryProvider, QuoteProvider};
