use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Default auto-refresh interval: 5 minutes, in milliseconds.
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 300_000;

const DEFAULT_WIDGETS: [&str; 8] = [
    "weather",
    "crypto",
    "news",
    "quotes",
    "calculator",
    "pomodoro",
    "qr",
    "stats",
];

/// User preferences singleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct UserPreferences {
    pub theme: String,
    pub language: String,
    pub location: String,
    pub notifications: bool,
    pub auto_refresh: bool,
    pub currency: String,
    /// Milliseconds between caller-driven refreshes
    pub refresh_interval: u64,
    pub dashboard_widgets: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            language: "es".to_string(),
            location: "Madrid".to_string(),
            notifications: true,
            auto_refresh: true,
            currency: "EUR".to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_MS,
            dashboard_widgets: default_widgets(),
            saved_at: None,
        }
    }
}

fn default_widgets() -> BTreeMap<String, bool> {
    DEFAULT_WIDGETS
        .iter()
        .map(|name| (name.to_string(), true))
        .collect()
}

impl UserPreferences {
    /// Build preferences from a patch, filling unset fields from the defaults.
    pub fn from_patch(patch: PreferencesPatch) -> Self {
        let defaults = Self::default();
        Self {
            theme: patch.theme.unwrap_or(defaults.theme),
            language: patch.language.unwrap_or(defaults.language),
            location: patch.location.unwrap_or(defaults.location),
            notifications: patch.notifications.unwrap_or(defaults.notifications),
            auto_refresh: patch.auto_refresh.unwrap_or(defaults.auto_refresh),
            currency: patch.currency.unwrap_or(defaults.currency),
            // Zero is not a usable interval
            refresh_interval: patch
                .refresh_interval
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.refresh_interval),
            dashboard_widgets: patch
                .dashboard_widgets
                .unwrap_or(defaults.dashboard_widgets),
            saved_at: None,
        }
    }

    /// Whether a dashboard widget should be shown. Unknown widgets are hidden.
    pub fn widget_visible(&self, widget: &str) -> bool {
        self.dashboard_widgets.get(widget).copied().unwrap_or(false)
    }
}

/// Partial preferences as supplied by a caller or an import document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub location: Option<String>,
    pub notifications: Option<bool>,
    pub auto_refresh: Option<bool>,
    pub currency: Option<String>,
    pub refresh_interval: Option<u64>,
    pub dashboard_widgets: Option<BTreeMap<String, bool>>,
}

impl From<UserPreferences> for PreferencesPatch {
    fn from(prefs: UserPreferences) -> Self {
        Self {
            theme: Some(prefs.theme),
            language: Some(prefs.language),
            location: Some(prefs.location),
            notifications: Some(prefs.notifications),
            auto_refresh: Some(prefs.auto_refresh),
            currency: Some(prefs.currency),
            refresh_interval: Some(prefs.refresh_interval),
            dashboard_widgets: Some(prefs.dashboard_widgets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = UserPreferences::default();
        assert_eq!(prefs.theme, "light");
        assert_eq!(prefs.language, "es");
        assert_eq!(prefs.location, "Madrid");
        assert_eq!(prefs.currency, "EUR");
        assert_eq!(prefs.refresh_interval, 300_000);
        assert_eq!(prefs.dashboard_widgets.len(), 8);
        assert!(prefs.widget_visible("pomodoro"));
        assert!(!prefs.widget_visible("unknown"));
        assert!(prefs.saved_at.is_none());
    }

    #[test]
    fn test_from_patch_merges_over_defaults() {
        let patch = PreferencesPatch {
            theme: Some("dark".to_string()),
            notifications: Some(false),
            refresh_interval: Some(0),
            ..Default::default()
        };
        let prefs = UserPreferences::from_patch(patch);
        assert_eq!(prefs.theme, "dark");
        assert!(!prefs.notifications);
        assert_eq!(prefs.refresh_interval, DEFAULT_REFRESH_INTERVAL_MS);
        assert_eq!(prefs.location, "Madrid");
    }

    #[test]
    fn test_patch_ignores_unknown_fields() {
        let patch: PreferencesPatch =
            serde_json::from_str(r#"{"theme":"ocean","fontSize":14,"autoRefresh":false}"#)
                .unwrap();
        assert_eq!(patch.theme.as_deref(), Some("ocean"));
        assert_eq!(patch.auto_refresh, Some(false));
    }
}
