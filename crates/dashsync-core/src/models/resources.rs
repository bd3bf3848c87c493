//! Normalized shapes for the logical resources served by the gateway.
//!
//! These types are what callers depend on. Provider wire formats live in
//! `gateway::providers` and are converted into these shapes there.

use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Outcome of a gateway call. Both arms always carry well-formed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(TS))]
pub enum Fetched<T> {
    /// Fetched from the provider, or served from a fresh cache entry.
    Live { data: T },
    /// Static substitute returned because the live fetch failed.
    Fallback { data: T, reason: String },
}

impl<T> Fetched<T> {
    pub fn live(data: T) -> Self {
        Fetched::Live { data }
    }

    pub fn fallback(data: T, reason: impl Into<String>) -> Self {
        Fetched::Fallback {
            data,
            reason: reason.into(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Fetched::Live { .. })
    }

    pub fn data(&self) -> &T {
        match self {
            Fetched::Live { data } | Fetched::Fallback { data, .. } => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Fetched::Live { data } | Fetched::Fallback { data, .. } => data,
        }
    }

    /// Failure reason, if this is fallback data.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Fetched::Live { .. } => None,
            Fetched::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Current weather conditions for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct Weather {
    pub location: String,
    /// Degrees Celsius
    pub temperature: i32,
    pub description: String,
    /// Relative humidity, percent
    pub humidity: i32,
    /// km/h
    pub wind_speed: i32,
    pub icon: String,
}

/// Spot price of one cryptocurrency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct CryptoQuote {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price_usd: f64,
    pub price_eur: f64,
    /// 24h change in percent, 0 when the provider omits it
    pub change_24h: f64,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct Quote {
    pub text: String,
    pub author: String,
    pub category: String,
}

/// A news headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub url: String,
    pub published_at: String,
    pub source: String,
}

/// Approximate location derived from the caller's IP address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct Location {
    pub city: String,
    pub country: String,
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
}
