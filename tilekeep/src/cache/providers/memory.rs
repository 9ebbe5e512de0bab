//! In-memory cache provider using DashMap.
//!
//! Entries are never evicted: a saved tile must stay available until it is
//! explicitly removed, and counts must be exact.

use dashmap::DashMap;

use crate::cache::traits::{BoxFuture, Cache, ServiceCacheError};

/// In-memory key-value namespace.
#[derive(Debug, Default)]
pub struct MemoryCacheProvider {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryCacheProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCacheProvider {
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move {
            self.entries.insert(key, value);
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.entries.get(&key).map(|v| v.value().clone())) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.entries.remove(&key).is_some()) })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.entries.contains_key(&key)) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        Box::pin(async move {
            self.entries.clear();
            Ok(())
        })
    }

    fn entry_count(&self) -> BoxFuture<'_, Result<u64, ServiceCacheError>> {
        Box::pin(async move { Ok(self.entries.len() as u64) })
    }

    fn values(&self) -> BoxFuture<'_, Result<Vec<Vec<u8>>, ServiceCacheError>> {
        Box::pin(async move {
            Ok(self
                .entries
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_provider_set_and_get() {
        let provider = MemoryCacheProvider::new();

        provider.set("key1", vec![1, 2, 3]).await.unwrap();

        let value = provider.get("key1").await.unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_memory_provider_get_missing() {
        let provider = MemoryCacheProvider::new();
        assert!(provider.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_provider_delete() {
        let provider = MemoryCacheProvider::new();

        provider.set("key1", vec![1, 2, 3]).await.unwrap();
        assert!(provider.contains("key1").await.unwrap());

        assert!(provider.delete("key1").await.unwrap());
        assert!(!provider.contains("key1").await.unwrap());
        assert!(!provider.delete("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_provider_replace_and_count() {
        let provider = MemoryCacheProvider::new();

        provider.set("k", vec![1]).await.unwrap();
        provider.set("k", vec![2]).await.unwrap();
        provider.set("other", vec![3]).await.unwrap();

        assert_eq!(provider.entry_count().await.unwrap(), 2);
        assert_eq!(provider.get("k").await.unwrap(), Some(vec![2]));

        let mut values = provider.values().await.unwrap();
        values.sort();
        assert_eq!(values, vec![vec![2], vec![3]]);
    }

    #[tokio::test]
    async fn test_memory_provider_clear() {
        let provider = MemoryCacheProvider::new();
        for i in 0..10 {
            provider.set(&format!("key{}", i), vec![i]).await.unwrap();
        }

        provider.clear().await.unwrap();
        assert_eq!(provider.entry_count().await.unwrap(), 0);
        assert!(provider.values().await.unwrap().is_empty());
    }
}
