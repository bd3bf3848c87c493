use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

use super::{CryptoQuote, NewsItem, Quote, Weather};
use crate::utils::age_display;

/// A snapshot younger than this can be shown without refetching.
const SNAPSHOT_USABLE_MINUTES: i64 = 60;

/// Everything the dashboard shows from remote sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct DashboardData {
    pub weather: Weather,
    pub crypto: Vec<CryptoQuote>,
    pub news: Vec<NewsItem>,
    pub quote: Quote,
}

/// The last successfully fetched dashboard data, timestamped on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct DashboardSnapshot {
    #[serde(flatten)]
    pub data: DashboardData,
    pub last_updated: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn new(data: DashboardData) -> Self {
        Self {
            data,
            last_updated: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.last_updated
    }

    pub fn age_display(&self) -> String {
        age_display(self.age().num_minutes())
    }

    /// Whether the snapshot can be rendered without triggering a refresh.
    pub fn is_usable(&self) -> bool {
        self.age() < Duration::minutes(SNAPSHOT_USABLE_MINUTES)
    }

    pub fn is_older_than(&self, age: Duration) -> bool {
        self.age() > age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fallback;

    fn sample() -> DashboardData {
        DashboardData {
            weather: fallback::weather("Madrid"),
            crypto: fallback::crypto(),
            news: fallback::news(),
            quote: fallback::quote(),
        }
    }

    #[test]
    fn test_snapshot_usable_window() {
        let fresh = DashboardSnapshot::new(sample());
        assert!(fresh.is_usable());
        assert_eq!(fresh.age_display(), "just now");

        let mut old = DashboardSnapshot::new(sample());
        old.last_updated = Utc::now() - Duration::minutes(61);
        assert!(!old.is_usable());
        assert!(!old.is_older_than(Duration::days(7)));
    }

    #[test]
    fn test_snapshot_serializes_flat() {
        let json = serde_json::to_value(DashboardSnapshot::new(sample())).unwrap();
        assert!(json.get("weather").is_some());
        assert!(json.get("lastUpdated").is_some());
        assert!(json.get("data").is_none());
    }
}
