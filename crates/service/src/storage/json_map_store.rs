use std::{hash::Hash, path::PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, sync::RwLock};
use tracing::warn;

use super::{ordered_map::OrderedMap, KeyValueStore};
use crate::errors::ServiceError;

/// Generic JSON file-backed ordered key-value store.
///
/// Keeps the map in memory and rewrites the whole file on every mutation. A
/// mutation is applied to a copy, written out, and only then made visible, so a
/// failed write leaves the store as it was.
/// Intended for small record sets where a database is overkill.
#[derive(Debug)]
pub struct JsonMapStore<K, V> {
    inner: RwLock<OrderedMap<K, V>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }

        let map: OrderedMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "unreadable store file; starting empty");
                OrderedMap::new()
            }),
            Err(_) => {
                let empty: OrderedMap<K, V> = OrderedMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(ServiceError::storage)?)
                    .await
                    .map_err(ServiceError::storage)?;
                empty
            }
        };

        Ok(Self { inner: RwLock::new(map), file_path })
    }

    async fn save(&self, map: &OrderedMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec(map).map_err(ServiceError::storage)?;
        fs::write(&self.file_path, data).await.map_err(ServiceError::storage)?;
        Ok(())
    }
}

#[async_trait]
impl<K, V> KeyValueStore<K, V> for JsonMapStore<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync,
    V: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, ServiceError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn insert(&self, key: K, value: V) -> Result<Option<V>, ServiceError> {
        let mut map = self.inner.write().await;
        let mut candidate = map.clone();
        let prev = candidate.insert(key, value);
        self.save(&candidate).await?;
        *map = candidate;
        Ok(prev)
    }

    async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError> {
        let mut map = self.inner.write().await;
        if map.get(key).is_none() {
            return Ok(None);
        }
        let mut candidate = map.clone();
        let removed = candidate.remove(key);
        self.save(&candidate).await?;
        *map = candidate;
        Ok(removed)
    }

    async fn values(&self) -> Result<Vec<V>, ServiceError> {
        Ok(self.inner.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_map_store_crud_persists() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_{}.json", uuid::Uuid::new_v4()));
        let store = JsonMapStore::<String, String>::new(&tmp).await?;

        // initially empty
        assert_eq!(store.values().await?.len(), 0);

        store.insert("b".into(), "2".into()).await?;
        store.insert("a".into(), "1".into()).await?;
        store.insert("c".into(), "3".into()).await?;
        assert_eq!(store.get(&"a".into()).await?.as_deref(), Some("1"));

        // replace keeps position
        store.insert("b".into(), "20".into()).await?;

        // remove and reload persistence
        let removed = store.remove(&"c".into()).await?;
        assert_eq!(removed.as_deref(), Some("3"));
        let reloaded = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(reloaded.values().await?, vec!["20".to_string(), "1".to_string()]);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_rofs_{}.json", uuid::Uuid::new_v4()));
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        store.insert("a".into(), "1".into()).await?;

        // a directory in place of the file makes every write fail
        tokio::fs::remove_file(&tmp).await?;
        tokio::fs::create_dir(&tmp).await?;

        let inserted = store.insert("k".into(), "v".into()).await;
        assert!(matches!(inserted, Err(ServiceError::Storage(_))));
        let replaced = store.insert("a".into(), "changed".into()).await;
        assert!(matches!(replaced, Err(ServiceError::Storage(_))));
        let removed = store.remove(&"a".into()).await;
        assert!(matches!(removed, Err(ServiceError::Storage(_))));

        assert_eq!(store.get(&"k".into()).await?, None);
        assert_eq!(store.get(&"a".into()).await?.as_deref(), Some("1"));
        assert_eq!(store.values().await?, vec!["1".to_string()]);

        let _ = tokio::fs::remove_dir(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn removing_missing_key_is_a_no_op() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_nokey_{}.json", uuid::Uuid::new_v4()));
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(store.remove(&"ghost".into()).await?, None);
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_bad_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, b"{not json").await?;
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        assert!(store.values().await?.is_empty());
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
