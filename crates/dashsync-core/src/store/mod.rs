//! Local persistence in two tiers.
//!
//! The fast tier is a small synchronous key-value store holding JSON strings
//! (preferences, the dashboard snapshot, denormalized record lists, analytics).
//! The durable tier is an optional asynchronous document store keyed by
//! collection and id, authoritative for records. `PersistenceStore` keeps the
//! two in step and never surfaces tier failures to its callers.

pub mod durable;
pub mod error;
pub mod export;
pub mod fast;
pub mod manager;

pub use durable::{DurableTier, FileDurableTier, MemoryDurableTier};
pub use error::StoreError;
pub use export::{ExportDocument, ImportReport, EXPORT_VERSION};
pub use fast::{FastTier, FileFastTier, MemoryFastTier};
pub use manager::{PersistenceStore, PruneReport, StorageStats};
