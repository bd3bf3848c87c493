//! Static substitutes served when a provider cannot be reached.

use chrono::{Datelike, Utc};

use crate::models::{CryptoQuote, Location, NewsItem, Quote, Weather};

pub fn weather(city: &str) -> Weather {
    Weather {
        location: city.to_string(),
        temperature: 22,
        description: "Clear".to_string(),
        humidity: 45,
        wind_speed: 12,
        icon: "☀️".to_string(),
    }
}

pub fn crypto() -> Vec<CryptoQuote> {
    let coin = |id: &str, name: &str, symbol: &str, usd: f64, eur: f64, change: f64, icon: &str| {
        CryptoQuote {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            price_usd: usd,
            price_eur: eur,
            change_24h: change,
            icon: icon.to_string(),
        }
    };

    vec![
        coin("bitcoin", "Bitcoin", "BTC", 43500.0, 40200.0, 2.34, "₿"),
        coin("ethereum", "Ethereum", "ETH", 2650.0, 2450.0, 1.85, "Ξ"),
        coin("binancecoin", "BNB", "BNB", 315.0, 291.0, -0.52, "🔶"),
    ]
}

const QUOTES: [(&str, &str, &str); 4] = [
    (
        "Success is the sum of small efforts, repeated day in and day out.",
        "Robert Collier",
        "motivation",
    ),
    (
        "The only way to do great work is to love what you do.",
        "Steve Jobs",
        "work",
    ),
    (
        "Don't wait for the perfect moment, take the moment and make it perfect.",
        "Zoey Sayward",
        "action",
    ),
    (
        "The future belongs to those who believe in the beauty of their dreams.",
        "Eleanor Roosevelt",
        "dreams",
    ),
];

/// One of the built-in quotes, rotating by day of year.
pub fn quote() -> Quote {
    let index = Utc::now().ordinal0() as usize % QUOTES.len();
    let (text, author, category) = QUOTES[index];
    Quote {
        text: text.to_string(),
        author: author.to_string(),
        category: category.to_string(),
    }
}

pub fn news() -> Vec<NewsItem> {
    let today = Utc::now().format("%d/%m/%Y").to_string();
    vec![
        NewsItem {
            title: "Offline mode: headlines unavailable".to_string(),
            description: "Live news could not be loaded. Showing placeholder headlines until the next refresh...".to_string(),
            url: "#".to_string(),
            published_at: today.clone(),
            source: "dashsync".to_string(),
        },
        NewsItem {
            title: "Trends in web development".to_string(),
            description: "New approaches to building applications keep changing how the web is made...".to_string(),
            url: "#".to_string(),
            published_at: today,
            source: "Web Dev".to_string(),
        },
    ]
}

pub fn location() -> Location {
    Location {
        city: "Madrid".to_string(),
        country: "Spain".to_string(),
        timezone: "Europe/Madrid".to_string(),
        latitude: 40.4168,
        longitude: -3.7038,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_are_populated() {
        assert_eq!(weather("Oslo").location, "Oslo");
        assert_eq!(crypto().len(), 3);
        assert!(!quote().text.is_empty());
        assert!(news().iter().all(|n| !n.title.is_empty() && !n.published_at.is_empty()));
        assert_eq!(location().timezone, "Europe/Madrid");
    }

    #[test]
    fn test_quote_is_deterministic_within_a_day() {
        assert_eq!(quote(), quote());
    }
}
