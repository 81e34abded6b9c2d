//! Storage abstractions for service layer
//!
//! The ticket service only needs an ordered key-value map. Two implementations
//! share one ordered map core: a purely in-memory store and a JSON file-backed
//! store that persists after every mutation.

pub mod ordered_map;
pub mod memory_map_store;
pub mod json_map_store;

use async_trait::async_trait;

use crate::errors::ServiceError;

/// Ordered key-value map consumed by services.
///
/// `values` yields entries in insertion order; replacing an existing key keeps
/// its position.
#[async_trait]
pub trait KeyValueStore<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, ServiceError>;
    /// Insert or replace; returns the previous value.
    async fn insert(&self, key: K, value: V) -> Result<Option<V>, ServiceError>;
    /// Remove a key; returns the removed value.
    async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError>;
    async fn values(&self) -> Result<Vec<V>, ServiceError>;

    async fn contains_key(&self, key: &K) -> Result<bool, ServiceError> {
        Ok(self.get(key).await?.is_some())
    }
}

pub use json_map_store::JsonMapStore;
pub use memory_map_store::MemoryMapStore;
