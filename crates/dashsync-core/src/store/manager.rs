use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::durable::{DurableTier, FileDurableTier, DASHBOARD_COLLECTION, PREFERENCES_COLLECTION};
use super::export::{ExportDocument, ImportReport, EXPORT_VERSION};
use super::fast::{FastTier, FileFastTier, MemoryFastTier};
use super::StoreError;
use crate::config::StoreConfig;
use crate::models::{
    AnalyticsEvent, AnalyticsLog, Collection, DashboardData, DashboardSnapshot, PreferencesPatch,
    Record, UserPreferences,
};

// Fast-tier keys
pub const PREFERENCES_KEY: &str = "userPreferences";
pub const DASHBOARD_KEY: &str = "dashboardCache";
pub const ANALYTICS_KEY: &str = "appAnalytics";

/// Durable ids of the singleton documents
const PREFERENCES_ID: &str = "main";
const DASHBOARD_ID: &str = "current";

/// Snapshots and analytics older than this are dropped by `prune_old_data`.
const RETENTION_DAYS: i64 = 7;

const FAST_TIER_FILE: &str = "fast.json";
const DURABLE_TIER_DIR: &str = "durable";

/// Tiered persistence for preferences, dashboard snapshots, records and
/// analytics.
///
/// The fast tier is synchronous and always present. The durable tier is
/// optional; when it is `None` every operation degrades to fast-tier-only
/// behavior. For records the durable tier is authoritative and the fast-tier
/// lists are projections of it.
#[derive(Clone)]
pub struct PersistenceStore {
    fast: Arc<dyn FastTier>,
    durable: Option<Arc<dyn DurableTier>>,
}

impl PersistenceStore {
    pub fn new(fast: Arc<dyn FastTier>, durable: Option<Arc<dyn DurableTier>>) -> Self {
        Self { fast, durable }
    }

    /// Open file-backed tiers under `dir`. Neither tier failing to open is
    /// fatal: the fast tier falls back to memory, the durable tier is dropped.
    pub async fn open(dir: &Path, config: &StoreConfig) -> Self {
        let budget = config.fast_tier_budget_bytes;
        let fast: Arc<dyn FastTier> = match FileFastTier::open(dir.join(FAST_TIER_FILE), budget) {
            Ok(tier) => Arc::new(tier),
            Err(e) => {
                warn!(error = %e, "Fast tier unavailable on disk, using memory");
                Arc::new(MemoryFastTier::new(budget))
            }
        };

        let durable: Option<Arc<dyn DurableTier>> =
            match FileDurableTier::open(dir.join(DURABLE_TIER_DIR)).await {
                Ok(tier) => Some(Arc::new(tier)),
                Err(e) => {
                    warn!(error = %e, "Durable tier unavailable, continuing with fast tier only");
                    None
                }
            };

        debug!(dir = %dir.display(), durable = durable.is_some(), "Persistence store opened");
        Self::new(fast, durable)
    }

    pub fn durable_available(&self) -> bool {
        self.durable.is_some()
    }

    // ===== Fast-tier helpers =====

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(contents) = self.fast.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<(), StoreError> {
        let contents = serde_json::to_string(data)?;
        self.fast.set(key, &contents)
    }

    /// Load, treating a missing or unreadable value as absent.
    /// Unreadable values are logged and left in place.
    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key = key, error = %e, "Failed to load from fast tier, using default");
                T::default()
            }
        }
    }

    /// Best-effort copy of a singleton document into the durable tier.
    async fn mirror<T: Serialize>(&self, collection: &str, id: &str, data: &T) -> bool {
        let Some(durable) = &self.durable else {
            return false;
        };
        let result = match serde_json::to_value(data) {
            Ok(value) => durable.put(collection, id, &value).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(collection = collection, error = %e, "Durable mirror write failed");
                false
            }
        }
    }

    // ===== Preferences =====

    /// Save preferences merged over the defaults. Returns whether the
    /// fast-tier write succeeded; the durable copy is best-effort.
    pub async fn save_preferences(&self, patch: PreferencesPatch) -> bool {
        let mut prefs = UserPreferences::from_patch(patch);
        prefs.saved_at = Some(Utc::now());

        let saved = match self.save(PREFERENCES_KEY, &prefs) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to save preferences");
                false
            }
        };
        self.mirror(PREFERENCES_COLLECTION, PREFERENCES_ID, &prefs).await;
        saved
    }

    pub fn get_preferences(&self) -> UserPreferences {
        self.load_or_default(PREFERENCES_KEY)
    }

    // ===== Dashboard snapshot =====

    /// Timestamp and store a snapshot in both tiers. True if either took it.
    pub async fn save_dashboard_snapshot(&self, data: DashboardData) -> bool {
        let snapshot = DashboardSnapshot::new(data);

        let fast_ok = match self.save(DASHBOARD_KEY, &snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to save dashboard snapshot to fast tier");
                false
            }
        };
        let durable_ok = self.mirror(DASHBOARD_COLLECTION, DASHBOARD_ID, &snapshot).await;
        fast_ok || durable_ok
    }

    /// The fast-tier snapshot whatever its age, else the durable copy.
    /// Judging freshness is up to the caller (`DashboardSnapshot::is_usable`).
    pub async fn get_dashboard_snapshot(&self) -> Option<DashboardSnapshot> {
        match self.load::<DashboardSnapshot>(DASHBOARD_KEY) {
            Ok(Some(snapshot)) => return Some(snapshot),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Fast-tier snapshot unreadable, trying durable tier"),
        }
        self.durable_snapshot().await
    }

    async fn durable_snapshot(&self) -> Option<DashboardSnapshot> {
        let durable = self.durable.as_ref()?;
        match durable.get(DASHBOARD_COLLECTION, DASHBOARD_ID).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(error = %e, "Durable snapshot unreadable");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read durable snapshot");
                None
            }
        }
    }

    // ===== Records =====

    /// Save a record: durable tier first, then the fast-tier list (replace
    /// by id or append). An `id` field is kept; otherwise one is generated.
    ///
    /// Without a durable tier the list alone holds the record. If the durable
    /// write fails the list is left as it was, so the two never disagree.
    pub async fn save_record(&self, collection: Collection, fields: Map<String, Value>) -> Record {
        let record = Record::from_fields(fields);

        match &self.durable {
            Some(durable) => {
                let result = match serde_json::to_value(&record) {
                    Ok(value) => durable.put(collection.durable_name(), &record.id, &value).await,
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = result {
                    warn!(
                        %collection,
                        id = %record.id,
                        error = %e,
                        "Durable record write failed, list not updated"
                    );
                    return record;
                }
            }
            None => debug!(%collection, id = %record.id, "No durable tier, saving to list only"),
        }

        let mut list = self.list_records(collection);
        match list.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => list.push(record.clone()),
        }
        if let Err(e) = self.save(collection.list_key(), &list) {
            warn!(%collection, error = %e, "Failed to update record list");
        }

        record
    }

    /// Delete from the durable tier, then from the list. False when the
    /// durable tier is missing or its delete failed; the list is untouched
    /// in that case.
    pub async fn delete_record(&self, collection: Collection, id: &str) -> bool {
        let Some(durable) = &self.durable else {
            warn!(%collection, id = id, "Cannot delete without a durable tier");
            return false;
        };
        if let Err(e) = durable.delete(collection.durable_name(), id).await {
            warn!(%collection, id = id, error = %e, "Durable delete failed");
            return false;
        }

        let list: Vec<Record> = self
            .list_records(collection)
            .into_iter()
            .filter(|r| r.id != id)
            .collect();
        if let Err(e) = self.save(collection.list_key(), &list) {
            warn!(%collection, error = %e, "Failed to update record list after delete");
        }
        true
    }

    /// One record from the durable tier, or from the list without one.
    pub async fn get_record(&self, collection: Collection, id: &str) -> Option<Record> {
        let Some(durable) = &self.durable else {
            return self.list_records(collection).into_iter().find(|r| r.id == id);
        };
        match durable.get(collection.durable_name(), id).await {
            Ok(Some(value)) => serde_json::from_value(value)
                .map_err(|e| warn!(%collection, id = id, error = %e, "Stored record unreadable"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(%collection, id = id, error = %e, "Failed to read record");
                None
            }
        }
    }

    /// The denormalized list from the fast tier.
    pub fn list_records(&self, collection: Collection) -> Vec<Record> {
        self.load_or_default(collection.list_key())
    }

    pub fn projects_list(&self) -> Vec<Record> {
        self.list_records(Collection::Projects)
    }

    pub fn team_list(&self) -> Vec<Record> {
        self.list_records(Collection::Team)
    }

    /// Rebuild a fast-tier list from the durable tier.
    pub async fn reconcile(&self, collection: Collection) -> bool {
        let Some(durable) = &self.durable else {
            return false;
        };
        let documents = match durable.get_all(collection.durable_name()).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(%collection, error = %e, "Failed to read durable collection");
                return false;
            }
        };

        let mut records: Vec<Record> = documents
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Record>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%collection, error = %e, "Skipping unreadable durable record");
                    None
                }
            })
            .collect();

        // Keep the existing list order where possible; new ids go last
        let order: Vec<String> = self.list_records(collection).into_iter().map(|r| r.id).collect();
        records.sort_by_key(|r| order.iter().position(|id| *id == r.id).unwrap_or(usize::MAX));

        match self.save(collection.list_key(), &records) {
            Ok(()) => {
                info!(%collection, count = records.len(), "Record list rebuilt from durable tier");
                true
            }
            Err(e) => {
                warn!(%collection, error = %e, "Failed to write rebuilt record list");
                false
            }
        }
    }

    /// Rebuild every record list and restore the singleton documents.
    pub async fn reconcile_all(&self) -> bool {
        let results = futures::future::join_all(
            Collection::ALL.iter().map(|collection| self.reconcile(*collection)),
        )
        .await;
        let restored = self.restore_from_durable().await;
        results.into_iter().all(|ok| ok) && restored
    }

    /// Copy the mirrored preferences and dashboard snapshot back into the
    /// fast tier where the fast copy is missing or unreadable. Existing fast
    /// values are never overwritten.
    pub async fn restore_from_durable(&self) -> bool {
        if self.durable.is_none() {
            return false;
        }
        let prefs = self
            .restore_document::<UserPreferences>(PREFERENCES_KEY, PREFERENCES_COLLECTION, PREFERENCES_ID)
            .await;
        let snapshot = self
            .restore_document::<DashboardSnapshot>(DASHBOARD_KEY, DASHBOARD_COLLECTION, DASHBOARD_ID)
            .await;
        prefs && snapshot
    }

    async fn restore_document<T: DeserializeOwned + Serialize>(
        &self,
        key: &str,
        collection: &str,
        id: &str,
    ) -> bool {
        if matches!(self.load::<T>(key), Ok(Some(_))) {
            return true;
        }
        let Some(durable) = &self.durable else {
            return false;
        };
        let value = match durable.get(collection, id).await {
            Ok(Some(value)) => value,
            Ok(None) => return true,
            Err(e) => {
                warn!(collection = collection, error = %e, "Failed to read durable copy");
                return false;
            }
        };
        let document: T = match serde_json::from_value(value) {
            Ok(document) => document,
            Err(e) => {
                warn!(collection = collection, error = %e, "Durable copy unreadable, not restored");
                return false;
            }
        };
        match self.save(key, &document) {
            Ok(()) => {
                info!(key = key, "Restored from durable tier");
                true
            }
            Err(e) => {
                warn!(key = key, error = %e, "Failed to restore from durable tier");
                false
            }
        }
    }

    // ===== Analytics =====

    /// Append an event, keeping only the most recent entries.
    pub fn record_analytics_event(&self, event: AnalyticsEvent) {
        let mut log = self.analytics();
        log.push(event);
        if let Err(e) = self.save(ANALYTICS_KEY, &log) {
            warn!(error = %e, "Failed to save analytics event");
        }
    }

    pub fn analytics(&self) -> AnalyticsLog {
        self.load_or_default(ANALYTICS_KEY)
    }

    // ===== Maintenance =====

    /// Drop snapshots and analytics events older than the retention window.
    pub async fn prune_old_data(&self) -> PruneReport {
        let retention = Duration::days(RETENTION_DAYS);
        let mut report = PruneReport::default();

        match self.load::<DashboardSnapshot>(DASHBOARD_KEY) {
            Ok(Some(snapshot)) if snapshot.is_older_than(retention) => {
                match self.fast.remove(DASHBOARD_KEY) {
                    Ok(()) => report.snapshot_removed = true,
                    Err(e) => warn!(error = %e, "Failed to remove old snapshot"),
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not read snapshot while pruning"),
        }

        if let Some(durable) = &self.durable {
            if let Some(snapshot) = self.durable_snapshot().await {
                if snapshot.is_older_than(retention) {
                    match durable.delete(DASHBOARD_COLLECTION, DASHBOARD_ID).await {
                        Ok(()) => report.snapshot_removed = true,
                        Err(e) => warn!(error = %e, "Failed to remove old durable snapshot"),
                    }
                }
            }
        }

        let mut log = self.analytics();
        report.events_removed = log.prune_older_than(retention);
        if report.events_removed > 0 {
            if let Err(e) = self.save(ANALYTICS_KEY, &log) {
                warn!(error = %e, "Failed to save pruned analytics");
            }
        }

        info!(
            snapshot_removed = report.snapshot_removed,
            events_removed = report.events_removed,
            "Old data pruned"
        );
        report
    }

    pub fn storage_stats(&self) -> StorageStats {
        StorageStats {
            fast_used_bytes: self.fast.used_bytes(),
            fast_budget_bytes: self.fast.budget_bytes(),
            durable_available: self.durable_available(),
            has_preferences: matches!(self.fast.get(PREFERENCES_KEY), Ok(Some(_))),
            has_dashboard: matches!(self.fast.get(DASHBOARD_KEY), Ok(Some(_))),
            projects: self.projects_list().len(),
            team: self.team_list().len(),
            analytics_events: self.analytics().len(),
        }
    }

    // ===== Export / import =====

    pub fn export_all(&self) -> String {
        let document = ExportDocument {
            preferences: self.get_preferences(),
            projects: self.projects_list(),
            team: self.team_list(),
            analytics: self.analytics(),
            exported_at: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        };
        serde_json::to_string_pretty(&document).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize export");
            "{}".to_string()
        })
    }

    /// Import an export document. False only if the document as a whole
    /// cannot be parsed.
    pub async fn import_all(&self, document: &str) -> bool {
        match self.import_document(document).await {
            Ok(report) => {
                info!(?report, "Import finished");
                true
            }
            Err(e) => {
                warn!(error = %e, "Import failed");
                false
            }
        }
    }

    /// Parse once, then apply each section as it is read. A malformed
    /// section is skipped; sections applied before a failure stay applied.
    /// Record ids in the document are kept.
    pub async fn import_document(&self, document: &str) -> Result<ImportReport, StoreError> {
        let root: Value = serde_json::from_str(document)?;
        let Value::Object(mut root) = root else {
            return Err(StoreError::Corrupt {
                key: "import".to_string(),
                reason: "document is not a JSON object".to_string(),
            });
        };

        match root.get("version").and_then(Value::as_str) {
            Some(EXPORT_VERSION) | None => {}
            Some(other) => warn!(version = other, "Importing document with unknown version"),
        }

        let mut report = ImportReport::default();

        if let Some(section) = take_section(&mut root, "preferences") {
            match serde_json::from_value::<PreferencesPatch>(section) {
                Ok(patch) => report.preferences = self.save_preferences(patch).await,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed preferences section");
                    report.skipped.push("preferences".to_string());
                }
            }
        }

        for (name, collection) in [("projects", Collection::Projects), ("team", Collection::Team)] {
            let Some(section) = take_section(&mut root, name) else {
                continue;
            };
            let Value::Array(items) = section else {
                warn!(section = name, "Skipping record section that is not an array");
                report.skipped.push(name.to_string());
                continue;
            };
            let mut imported = 0;
            for item in items {
                match item {
                    Value::Object(fields) => {
                        self.save_record(collection, fields).await;
                        imported += 1;
                    }
                    other => warn!(section = name, value = %other, "Skipping non-object record"),
                }
            }
            match collection {
                Collection::Projects => report.projects = imported,
                Collection::Team => report.team = imported,
            }
        }

        if let Some(section) = take_section(&mut root, "analytics") {
            match serde_json::from_value::<AnalyticsLog>(section) {
                Ok(mut log) => {
                    log.truncate_to_cap();
                    match self.save(ANALYTICS_KEY, &log) {
                        Ok(()) => report.analytics_events = log.len(),
                        Err(e) => warn!(error = %e, "Failed to store imported analytics"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Skipping malformed analytics section");
                    report.skipped.push("analytics".to_string());
                }
            }
        }

        Ok(report)
    }
}

/// A present, non-null section of an import document.
fn take_section(root: &mut Map<String, Value>, name: &str) -> Option<Value> {
    match root.remove(name) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruneReport {
    pub snapshot_removed: bool,
    pub events_removed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageStats {
    pub fast_used_bytes: usize,
    pub fast_budget_bytes: usize,
    pub durable_available: bool,
    pub has_preferences: bool,
    pub has_dashboard: bool,
    pub projects: usize,
    pub team: usize,
    pub analytics_events: usize,
}
