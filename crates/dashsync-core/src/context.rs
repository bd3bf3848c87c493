//! Application context: the gateway and the store, built once at startup.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::gateway::Gateway;
use crate::models::{AnalyticsEvent, DashboardData, DashboardSnapshot, Fetched};
use crate::store::PersistenceStore;

/// Shared handle passed to every consumer. Cloning is cheap.
#[derive(Clone)]
pub struct DashSync {
    pub gateway: Gateway,
    pub store: PersistenceStore,
}

impl DashSync {
    pub fn new(gateway: Gateway, store: PersistenceStore) -> Self {
        Self { gateway, store }
    }

    /// Build an HTTP gateway and open the file-backed store under the
    /// configured data directory.
    pub async fn open(config: &Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let gateway = Gateway::new(&config.gateway).context("Failed to build HTTP gateway")?;
        let store = PersistenceStore::open(&data_dir, &config.store).await;
        info!(data_dir = %data_dir.display(), "dashsync ready");
        Ok(Self::new(gateway, store))
    }

    /// Fetch the dashboard for the preferred location. Only live results are
    /// kept as the snapshot, so a later offline start never shows fallback
    /// data as if it were real.
    pub async fn refresh_dashboard(&self) -> Fetched<DashboardData> {
        let location = self.store.get_preferences().location;
        let result = self.gateway.get_dashboard(&location).await;

        match &result {
            Fetched::Live { data } => {
                self.store.save_dashboard_snapshot(data.clone()).await;
            }
            Fetched::Fallback { reason, .. } => {
                debug!(reason = %reason, "Dashboard degraded, snapshot not updated");
            }
        }
        result
    }

    /// Last saved snapshot, for showing something before the first refresh.
    pub async fn cached_dashboard(&self) -> Option<DashboardSnapshot> {
        self.store.get_dashboard_snapshot().await
    }

    pub fn track(&self, action: &str, source: &str) {
        self.store
            .record_analytics_event(AnalyticsEvent::new(action, source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::GatewayConfig;
    use crate::gateway::client::tests::MockTransport;
    use crate::models::PreferencesPatch;
    use crate::store::{MemoryDurableTier, MemoryFastTier};

    fn context(transport: MockTransport) -> (DashSync, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let gateway = Gateway::with_transport(transport.clone(), &GatewayConfig::default());
        let store = PersistenceStore::new(
            Arc::new(MemoryFastTier::new(1024 * 1024)),
            Some(Arc::new(MemoryDurableTier::new())),
        );
        (DashSync::new(gateway, store), transport)
    }

    #[tokio::test]
    async fn test_refresh_saves_live_snapshot() {
        let (app, _) = context(MockTransport::healthy());
        assert!(app.cached_dashboard().await.is_none());

        let result = app.refresh_dashboard().await;
        assert!(result.is_live());

        let snapshot = app.cached_dashboard().await.unwrap();
        assert_eq!(&snapshot.data, result.data());
        assert!(snapshot.is_usable());
    }

    #[tokio::test]
    async fn test_refresh_does_not_save_fallback() {
        let (app, _) = context(MockTransport::failing());

        let result = app.refresh_dashboard().await;
        assert!(!result.is_live());
        assert!(!result.data().crypto.is_empty());
        assert!(app.cached_dashboard().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_uses_preferred_location() {
        let (app, _) = context(MockTransport::healthy());
        app.store
            .save_preferences(PreferencesPatch {
                location: Some("Sevilla".to_string()),
                ..Default::default()
            })
            .await;

        let result = app.refresh_dashboard().await;
        assert_eq!(result.data().weather.location, "Sevilla");
    }

    #[tokio::test]
    async fn test_refresh_within_ttl_hits_cache() {
        let (app, transport) = context(MockTransport::healthy());
        app.refresh_dashboard().await;
        let calls = transport.calls();

        app.refresh_dashboard().await;
        assert_eq!(transport.calls(), calls);
    }

    #[test]
    fn test_track_records_event() {
        let (app, _) = context(MockTransport::default());
        app.track("widget_toggle", "settings");

        let log = app.store.analytics();
        assert_eq!(log.len(), 1);
        assert_eq!(log.events[0].action, "widget_toggle");
        assert_eq!(log.events[0].source, "settings");
    }
}
