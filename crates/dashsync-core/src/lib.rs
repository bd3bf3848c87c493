//! dashsync core library.
//!
//! Client-side data layer for a personal dashboard: a remote data gateway
//! with a TTL cache and static fallbacks, and a two-tier persistence store
//! for preferences, dashboard snapshots, records and analytics.
//!
//! Consumers build a single [`DashSync`] at startup and pass it around.

pub mod config;
pub mod context;
pub mod gateway;
pub mod models;
pub mod store;
pub mod utils;

pub use config::Config;
pub use context::DashSync;
pub use gateway::{Gateway, GatewayError};
pub use models::*;
pub use store::{PersistenceStore, StoreError};
