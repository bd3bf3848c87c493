//! The remote data gateway.
//!
//! Every operation checks the response cache first, then asks its provider,
//! and on any failure returns the resource's static fallback. Callers always
//! receive well-formed data tagged as live or fallback.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::cache::{CacheStats, ResponseCache};
use super::providers::{self, Endpoints};
use super::transport::{HttpTransport, Transport};
use super::{fallback, GatewayError};
use crate::config::GatewayConfig;
use crate::models::{
    CryptoQuote, DashboardData, Fetched, Location, NewsItem, Quote, Weather,
};

/// Cache keys for parameterless resources.
const CRYPTO_KEY: &str = "crypto-prices";
const QUOTE_KEY: &str = "motivational-quote";
const NEWS_KEY: &str = "news-headlines";
const LOCATION_KEY: &str = "user-location";

pub fn weather_key(location: &str) -> String {
    format!("weather:{}", location)
}

/// Gateway to the external data providers.
/// Clone is cheap - the transport and cache are shared.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache>,
    endpoints: Arc<Endpoints>,
}

impl Gateway {
    /// Create a gateway backed by HTTP.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let transport = HttpTransport::new(timeout)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create a gateway over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &GatewayConfig) -> Self {
        Self {
            transport,
            cache: Arc::new(ResponseCache::new(Duration::from_secs(config.cache_ttl_secs))),
            endpoints: Arc::new(config.endpoints.clone()),
        }
    }

    pub async fn get_weather(&self, location: &str) -> Fetched<Weather> {
        let url = self.endpoints.weather_url(location);
        self.resolve(
            &weather_key(location),
            &url,
            |body| providers::normalize_weather(location, body),
            || fallback::weather(location),
        )
        .await
    }

    pub async fn get_crypto_prices(&self) -> Fetched<Vec<CryptoQuote>> {
        let url = self.endpoints.crypto_url();
        self.resolve(CRYPTO_KEY, &url, providers::normalize_crypto, fallback::crypto)
            .await
    }

    pub async fn get_motivational_quote(&self) -> Fetched<Quote> {
        let url = self.endpoints.quote_url();
        self.resolve(QUOTE_KEY, &url, providers::normalize_quote, fallback::quote)
            .await
    }

    pub async fn get_news_headlines(&self) -> Fetched<Vec<NewsItem>> {
        let url = self.endpoints.news_url();
        self.resolve(NEWS_KEY, &url, providers::normalize_news, fallback::news)
            .await
    }

    pub async fn get_user_location(&self) -> Fetched<Location> {
        let url = self.endpoints.location_url();
        self.resolve(LOCATION_KEY, &url, providers::normalize_location, fallback::location)
            .await
    }

    /// Resolve everything the dashboard shows, concurrently.
    ///
    /// Live only if every part was live; otherwise the merged data is
    /// returned as fallback and `reason` lists the degraded resources.
    pub async fn get_dashboard(&self, location: &str) -> Fetched<DashboardData> {
        let (weather, crypto, news, quote) = tokio::join!(
            self.get_weather(location),
            self.get_crypto_prices(),
            self.get_news_headlines(),
            self.get_motivational_quote(),
        );

        let degraded: Vec<String> = [
            ("weather", weather.reason()),
            ("crypto", crypto.reason()),
            ("news", news.reason()),
            ("quote", quote.reason()),
        ]
        .into_iter()
        .filter_map(|(name, reason)| reason.map(|r| format!("{}: {}", name, r)))
        .collect();

        let data = DashboardData {
            weather: weather.into_data(),
            crypto: crypto.into_data(),
            news: news.into_data(),
            quote: quote.into_data(),
        };

        if degraded.is_empty() {
            Fetched::live(data)
        } else {
            Fetched::fallback(data, degraded.join("; "))
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("Gateway cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cache lookup, then fetch + normalize, then fallback.
    ///
    /// Concurrent misses on the same key each go to the network; the last
    /// one to finish wins the cache slot.
    async fn resolve<T, N, F>(&self, key: &str, url: &str, normalize: N, fallback: F) -> Fetched<T>
    where
        T: Serialize + DeserializeOwned,
        N: FnOnce(Value) -> Result<T, GatewayError>,
        F: FnOnce() -> T,
    {
        if let Some(payload) = self.cache.get_fresh(key) {
            match serde_json::from_value(payload) {
                Ok(data) => {
                    debug!(key = key, "Cache hit");
                    return Fetched::live(data);
                }
                Err(e) => debug!(key = key, error = %e, "Cached payload unreadable, refetching"),
            }
        }

        let result = match self.transport.get_json(url).await {
            Ok(body) => normalize(body),
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => {
                match serde_json::to_value(&data) {
                    Ok(payload) => self.cache.insert(key, payload),
                    Err(e) => warn!(key = key, error = %e, "Failed to cache normalized result"),
                }
                debug!(key = key, "Fetched from provider");
                Fetched::live(data)
            }
            Err(e) => {
                warn!(
                    key = key,
                    url = url,
                    transient = e.is_transient(),
                    error = %e,
                    "Provider fetch failed, serving fallback"
                );
                Fetched::fallback(fallback(), e.to_string())
            }
        }
    }
}
