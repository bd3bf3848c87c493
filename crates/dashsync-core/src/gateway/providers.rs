//! Provider endpoints, wire formats and normalization.
//!
//! Each logical resource maps to one JSON endpoint. The wire structs here
//! mirror only the fields we consume; anything missing or mistyped is a
//! schema error and the gateway serves fallback data instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GatewayError;
use crate::models::{CryptoQuote, Location, NewsItem, Quote, Weather};
use crate::utils::{ellipsize, format_date, strip_html};

/// Coins requested from the price provider, in display order.
pub const CRYPTO_IDS: [&str; 5] = ["bitcoin", "ethereum", "binancecoin", "cardano", "solana"];

/// News headlines kept per fetch.
const MAX_NEWS_ITEMS: usize = 5;

/// Description length before the ellipsis.
const NEWS_DESCRIPTION_CHARS: usize = 150;

const NEWS_FEED_URL: &str = "http://feeds.bbci.co.uk/news/rss.xml";
const NEWS_SOURCE: &str = "BBC News";
const DEFAULT_QUOTE_CATEGORY: &str = "motivation";

/// Base URLs for each provider. Swapping a provider means changing the URL
/// here and, if the wire format differs, its normalizer below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub weather: String,
    pub crypto: String,
    pub quotes: String,
    pub news: String,
    pub location: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weather: "https://wttr.in".to_string(),
            crypto: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            quotes: "https://api.quotable.io/random".to_string(),
            news: "https://api.rss2json.com/v1/api.json".to_string(),
            location: "https://ipapi.co/json".to_string(),
        }
    }
}

impl Endpoints {
    pub fn weather_url(&self, city: &str) -> String {
        format!("{}/{}?format=j1", self.weather.trim_end_matches('/'), city)
    }

    pub fn crypto_url(&self) -> String {
        format!(
            "{}?ids={}&vs_currencies=usd,eur&include_24hr_change=true",
            self.crypto,
            CRYPTO_IDS.join(",")
        )
    }

    pub fn quote_url(&self) -> String {
        format!("{}?minLength=50&maxLength=120", self.quotes)
    }

    pub fn news_url(&self) -> String {
        format!("{}?rss_url={}&count={}", self.news, NEWS_FEED_URL, MAX_NEWS_ITEMS)
    }

    pub fn location_url(&self) -> String {
        self.location.clone()
    }
}

// ============================================================================
// Weather (wttr.in j1)
// ============================================================================

#[derive(Debug, Deserialize)]
struct WttrResponse {
    current_condition: Vec<WttrCondition>,
}

#[derive(Debug, Deserialize)]
struct WttrCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    humidity: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(rename = "weatherCode")]
    weather_code: String,
    #[serde(rename = "weatherDesc")]
    weather_desc: Vec<WttrText>,
}

#[derive(Debug, Deserialize)]
struct WttrText {
    value: String,
}

fn parse_int(field: &str, raw: &str) -> Result<i32, GatewayError> {
    raw.trim()
        .parse()
        .map_err(|_| GatewayError::InvalidResponse(format!("{} is not a number: {:?}", field, raw)))
}

pub fn normalize_weather(city: &str, body: Value) -> Result<Weather, GatewayError> {
    let parsed: WttrResponse = serde_json::from_value(body)?;
    let current = parsed
        .current_condition
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::InvalidResponse("no current_condition".to_string()))?;
    let description = current
        .weather_desc
        .into_iter()
        .next()
        .map(|d| d.value)
        .ok_or_else(|| GatewayError::InvalidResponse("no weatherDesc".to_string()))?;

    Ok(Weather {
        location: city.to_string(),
        temperature: parse_int("temp_C", &current.temp_c)?,
        description,
        humidity: parse_int("humidity", &current.humidity)?,
        wind_speed: parse_int("windspeedKmph", &current.windspeed_kmph)?,
        icon: weather_icon(&current.weather_code).to_string(),
    })
}

/// Map a wttr.in weather code to an icon.
pub fn weather_icon(code: &str) -> &'static str {
    match code {
        "113" => "☀️",
        "116" => "⛅",
        "119" | "122" => "☁️",
        "143" | "248" | "260" => "🌫️",
        "176" | "263" | "266" | "293" | "296" | "353" => "🌦️",
        "299" | "302" | "305" | "308" | "356" | "359" => "🌧️",
        "179" | "182" | "185" | "281" | "284" | "317" | "320" | "362" | "365" | "392" => "🌨️",
        "227" | "230" | "323" | "326" | "329" | "332" | "335" | "338" | "368" | "371" | "395" => {
            "❄️"
        }
        "311" | "314" | "350" | "374" | "377" => "🧊",
        "200" | "386" | "389" => "⛈️",
        _ => "🌤️",
    }
}

// ============================================================================
// Crypto prices (CoinGecko simple/price)
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: f64,
    #[serde(default)]
    eur: Option<f64>,
    #[serde(default)]
    usd_24h_change: Option<f64>,
}

pub fn normalize_crypto(body: Value) -> Result<Vec<CryptoQuote>, GatewayError> {
    let mut prices: HashMap<String, CoinPrice> = serde_json::from_value(body)?;
    if prices.is_empty() {
        return Err(GatewayError::InvalidResponse("no prices returned".to_string()));
    }

    let mut quotes: Vec<CryptoQuote> = CRYPTO_IDS
        .iter()
        .filter_map(|id| prices.remove(*id).map(|price| crypto_quote(id, price)))
        .collect();

    // Coins we did not ask for go last, in a stable order
    let mut extra: Vec<(String, CoinPrice)> = prices.into_iter().collect();
    extra.sort_by(|a, b| a.0.cmp(&b.0));
    quotes.extend(extra.into_iter().map(|(id, price)| crypto_quote(&id, price)));

    Ok(quotes)
}

fn crypto_quote(id: &str, price: CoinPrice) -> CryptoQuote {
    let (name, symbol, icon) = crypto_info(id);
    CryptoQuote {
        id: id.to_string(),
        name,
        symbol,
        price_usd: price.usd,
        price_eur: price.eur.unwrap_or(0.0),
        change_24h: price.usd_24h_change.unwrap_or(0.0),
        icon: icon.to_string(),
    }
}

/// Display name, ticker symbol and icon for a coin id.
pub fn crypto_info(id: &str) -> (String, String, &'static str) {
    match id {
        "bitcoin" => ("Bitcoin".to_string(), "BTC".to_string(), "₿"),
        "ethereum" => ("Ethereum".to_string(), "ETH".to_string(), "Ξ"),
        "binancecoin" => ("BNB".to_string(), "BNB".to_string(), "🔶"),
        "cardano" => ("Cardano".to_string(), "ADA".to_string(), "♠️"),
        "solana" => ("Solana".to_string(), "SOL".to_string(), "◎"),
        other => (other.to_string(), other.to_uppercase(), "💰"),
    }
}

// ============================================================================
// Quotes (quotable)
// ============================================================================

#[derive(Debug, Deserialize)]
struct QuotableResponse {
    content: String,
    author: String,
    #[serde(default)]
    tags: Vec<String>,
}

pub fn normalize_quote(body: Value) -> Result<Quote, GatewayError> {
    let parsed: QuotableResponse = serde_json::from_value(body)?;
    Ok(Quote {
        text: parsed.content,
        author: parsed.author,
        category: parsed
            .tags
            .into_iter()
            .next()
            .unwrap_or_else(|| DEFAULT_QUOTE_CATEGORY.to_string()),
    })
}

// ============================================================================
// News (rss2json)
// ============================================================================

#[derive(Debug, Deserialize)]
struct FeedResponse {
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    link: String,
    #[serde(rename = "pubDate", default)]
    pub_date: String,
    #[serde(default)]
    description: Option<String>,
}

pub fn normalize_news(body: Value) -> Result<Vec<NewsItem>, GatewayError> {
    let parsed: FeedResponse = serde_json::from_value(body)?;
    Ok(parsed
        .items
        .into_iter()
        .take(MAX_NEWS_ITEMS)
        .map(|item| {
            let text = strip_html(item.description.as_deref().unwrap_or_default());
            NewsItem {
                title: item.title,
                description: ellipsize(text.trim(), NEWS_DESCRIPTION_CHARS),
                url: item.link,
                published_at: format_date(&item.pub_date),
                source: NEWS_SOURCE.to_string(),
            }
        })
        .collect())
}

// ============================================================================
// Location (ipapi.co)
// ============================================================================

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    city: String,
    country_name: String,
    timezone: String,
    latitude: f64,
    longitude: f64,
}

pub fn normalize_location(body: Value) -> Result<Location, GatewayError> {
    let parsed: IpApiResponse = serde_json::from_value(body)?;
    Ok(Location {
        city: parsed.city,
        country: parsed.country_name,
        timezone: parsed.timezone,
        latitude: parsed.latitude,
        longitude: parsed.longitude,
    })
}
