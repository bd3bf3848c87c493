use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Maximum number of events kept in the log. Oldest are dropped first.
pub const MAX_ANALYTICS_EVENTS: usize = 1000;

/// One usage event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct AnalyticsEvent {
    pub action: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl AnalyticsEvent {
    pub fn new(action: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            source: source.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Ordered, bounded event log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct AnalyticsLog {
    #[serde(default)]
    pub events: Vec<AnalyticsEvent>,
    #[serde(default)]
    pub sessions: u64,
}

impl AnalyticsLog {
    /// Append an event, dropping the oldest entries beyond the cap.
    pub fn push(&mut self, event: AnalyticsEvent) {
        self.events.push(event);
        self.truncate_to_cap();
    }

    pub fn truncate_to_cap(&mut self) {
        if self.events.len() > MAX_ANALYTICS_EVENTS {
            let excess = self.events.len() - MAX_ANALYTICS_EVENTS;
            self.events.drain(..excess);
        }
    }

    /// Drop events older than `max_age`. Returns how many were removed.
    pub fn prune_older_than(&mut self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let before = self.events.len();
        self.events.retain(|event| event.timestamp > cutoff);
        before - self.events.len()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_most_recent() {
        let mut log = AnalyticsLog::default();
        for i in 0..1500 {
            log.push(AnalyticsEvent::new(format!("a{}", i), "test"));
        }
        assert_eq!(log.len(), MAX_ANALYTICS_EVENTS);
        assert_eq!(log.events[0].action, "a500");
        assert_eq!(log.events[999].action, "a1499");
    }

    #[test]
    fn test_prune_older_than() {
        let mut log = AnalyticsLog::default();
        let mut old = AnalyticsEvent::new("old", "test");
        old.timestamp = Utc::now() - Duration::days(8);
        log.push(old);
        log.push(AnalyticsEvent::new("new", "test"));

        assert_eq!(log.prune_older_than(Duration::days(7)), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.events[0].action, "new");
    }

    #[test]
    fn test_log_tolerates_missing_fields() {
        let log: AnalyticsLog = serde_json::from_str("{}").unwrap();
        assert!(log.is_empty());
        assert_eq!(log.sessions, 0);
    }
}
