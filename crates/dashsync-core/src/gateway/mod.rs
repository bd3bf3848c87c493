//! Remote data gateway.
//!
//! Resolves logical resources (weather, crypto prices, quote, news, location)
//! from external JSON providers with a short-lived in-memory cache. Provider
//! failures never reach the caller: each operation returns a `Fetched` that is
//! either live data or the resource's static fallback.

pub mod cache;
pub mod client;
pub mod error;
pub mod fallback;
pub mod providers;
pub mod transport;

pub use cache::{CacheEntry, CacheStats, ResponseCache};
pub use client::Gateway;
pub use error::GatewayError;
pub use providers::Endpoints;
pub use transport::{HttpTransport, Transport};
