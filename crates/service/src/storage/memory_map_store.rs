use std::hash::Hash;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ordered_map::OrderedMap, KeyValueStore};
use crate::errors::ServiceError;

/// In-memory ordered map; contents live as long as the process.
#[derive(Debug)]
pub struct MemoryMapStore<K, V> {
    inner: RwLock<OrderedMap<K, V>>,
}

impl<K, V> MemoryMapStore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self { inner: RwLock::new(OrderedMap::new()) }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl<K, V> Default for MemoryMapStore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> KeyValueStore<K, V> for MemoryMapStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, ServiceError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn insert(&self, key: K, value: V) -> Result<Option<V>, ServiceError> {
        Ok(self.inner.write().await.insert(key, value))
    }

    async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError> {
        Ok(self.inner.write().await.remove(key))
    }

    async fn values(&self) -> Result<Vec<V>, ServiceError> {
        Ok(self.inner.read().await.values().cloned().collect())
    }
}
