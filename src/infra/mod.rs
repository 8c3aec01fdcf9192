//! Adapters to the outside world: the inventory backend.

pub mod api;

pub use api::{ApiClientError, CacheStatus, CachedPayload, InventoryClient};
