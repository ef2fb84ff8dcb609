//! Normalized data model shared by every provider adapter.
//!
//! The resolver can return one uniform type regardless of which provider
//! answered because each adapter owns exactly one mapping from its native
//! response into these shapes.

mod history;
mod quote;
mod types;

pub use history::{HistoryPoint, HistorySeries, MAX_POINTS};
pub use quote::QuoteRecord;
pub use types::{Currency, ProviderId};
