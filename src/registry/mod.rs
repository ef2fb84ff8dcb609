//! Fallback orchestration for provider adapters.
//!
//! This module provides the [`ProviderRegistry`], which:
//! - keeps quote and history adapters keyed by provider id
//! - computes the attempt order from the fallback policy and an optional
//!   per-request preferred provider
//! - drives adapters strictly in sequence, returning the first success

mod registry;

pub use registry::ProviderRegistry;
