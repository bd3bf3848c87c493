//! Export document format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AnalyticsLog, Record, UserPreferences};

/// Schema version written into every export.
pub const EXPORT_VERSION: &str = "1.0";

/// Everything a user can take to another installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub preferences: UserPreferences,
    pub projects: Vec<Record>,
    pub team: Vec<Record>,
    pub analytics: AnalyticsLog,
    pub exported_at: DateTime<Utc>,
    pub version: String,
}

/// What an import actually applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub preferences: bool,
    pub projects: usize,
    pub team: usize,
    pub analytics_events: usize,
    /// Sections that were present but could not be read
    pub skipped: Vec<String>,
}

impl ImportReport {
    pub fn is_empty(&self) -> bool {
        !self.preferences && self.projects == 0 && self.team == 0 && self.analytics_events == 0
    }
}
