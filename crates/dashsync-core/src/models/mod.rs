//! Data models for dashsync.
//!
//! - Normalized remote resources: `Weather`, `CryptoQuote`, `Quote`,
//!   `NewsItem`, `Location`, and the `Fetched` live/fallback wrapper
//! - Dashboard aggregate: `DashboardData`, `DashboardSnapshot`
//! - Persisted state: `UserPreferences`, `Record`, `AnalyticsLog`

pub mod analytics;
pub mod dashboard;
pub mod preferences;
pub mod record;
pub mod resources;

pub use analytics::{AnalyticsEvent, AnalyticsLog, MAX_ANALYTICS_EVENTS};
pub use dashboard::{DashboardData, DashboardSnapshot};
pub use preferences::{PreferencesPatch, UserPreferences};
pub use record::{generate_id, Collection, Record, UnknownCollection};
pub use resources::{CryptoQuote, Fetched, Location, NewsItem, Quote, Weather};
