//! Persistent tile storage.
//!
//! A [`TileStore`] pairs two key-value namespaces: blobs under
//! [`TILES_NAMESPACE`](crate::cache::TILES_NAMESPACE) and JSON descriptors
//! under [`AREAS_NAMESPACE`](crate::cache::AREAS_NAMESPACE), both keyed by
//! the tile's storage key.
//!
//! The two namespaces are written one after the other without a
//! transaction. A crash between the writes can leave a blob without a
//! descriptor; [`TileStore::blob_count`] next to [`TileStore::count`]
//! reveals such orphans.

mod geojson;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::cache::{open_namespace, Cache, CacheConfig, ServiceCacheError, AREAS_NAMESPACE, TILES_NAMESPACE};
use crate::tile::{StoredTile, TileDescriptor};

pub use geojson::tiles_to_geojson;

/// Errors from the tile store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The blob namespace failed.
    #[error("Tile blob storage failed: {0}")]
    Blob(#[source] ServiceCacheError),

    /// The descriptor namespace failed.
    #[error("Tile descriptor storage failed: {0}")]
    Descriptor(#[source] ServiceCacheError),

    /// A descriptor record could not be encoded or decoded.
    #[error("Invalid descriptor record: {0}")]
    Record(#[from] serde_json::Error),
}

/// Blob and descriptor storage for saved tiles.
#[derive(Clone)]
pub struct TileStore {
    blobs: Arc<dyn Cache>,
    descriptors: Arc<dyn Cache>,
}

impl TileStore {
    /// Build a store from two namespaces.
    pub fn new(blobs: Arc<dyn Cache>, descriptors: Arc<dyn Cache>) -> Self {
        Self { blobs, descriptors }
    }

    /// Open both namespaces on the configured backend.
    pub async fn open(config: &CacheConfig) -> Result<Self, StoreError> {
        let blobs = open_namespace(config, TILES_NAMESPACE)
            .await
            .map_err(StoreError::Blob)?;
        let descriptors = open_namespace(config, AREAS_NAMESPACE)
            .await
            .map_err(StoreError::Descriptor)?;
        Ok(Self::new(blobs, descriptors))
    }

    /// In-memory store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::open(&CacheConfig::Memory).await
    }

    /// Blob stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.blobs.get(key).await.map_err(StoreError::Blob)
    }

    /// Persist a tile.
    ///
    /// Writes the blob with [`put_blob`](Self::put_blob), then the
    /// descriptor with [`put_descriptor`](Self::put_descriptor). The blob is
    /// visible to readers before the descriptor is.
    pub async fn put(&self, descriptor: TileDescriptor, blob: Vec<u8>) -> Result<StoredTile, StoreError> {
        self.put_blob(&descriptor.key, blob).await?;
        self.put_descriptor(descriptor).await
    }

    /// Replace the blob stored under `key`.
    pub async fn put_blob(&self, key: &str, blob: Vec<u8>) -> Result<(), StoreError> {
        self.blobs.delete(key).await.map_err(StoreError::Blob)?;
        self.blobs.set(key, blob).await.map_err(StoreError::Blob)
    }

    /// Write a descriptor stamped with the current time.
    pub async fn put_descriptor(&self, descriptor: TileDescriptor) -> Result<StoredTile, StoreError> {
        let key = descriptor.key.clone();
        let stored = StoredTile::new(descriptor, chrono::Utc::now().timestamp_millis());
        let record = serde_json::to_vec(&stored)?;
        self.descriptors
            .set(&key, record)
            .await
            .map_err(StoreError::Descriptor)?;

        debug!(key = %key, "Tile stored");
        Ok(stored)
    }

    /// Remove a tile's blob and descriptor. Returns whether anything existed.
    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let had_blob = self.blobs.delete(key).await.map_err(StoreError::Blob)?;
        let had_descriptor = self
            .descriptors
            .delete(key)
            .await
            .map_err(StoreError::Descriptor)?;
        Ok(had_blob || had_descriptor)
    }

    /// Remove every blob, then every descriptor.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.blobs.clear().await.map_err(StoreError::Blob)?;
        self.descriptors
            .clear()
            .await
            .map_err(StoreError::Descriptor)?;
        Ok(())
    }

    /// Number of stored descriptors.
    pub async fn count(&self) -> Result<u64, StoreError> {
        self.descriptors
            .entry_count()
            .await
            .map_err(StoreError::Descriptor)
    }

    /// Number of stored blobs.
    pub async fn blob_count(&self) -> Result<u64, StoreError> {
        self.blobs.entry_count().await.map_err(StoreError::Blob)
    }

    /// Every stored descriptor, in no particular order.
    pub async fn list(&self) -> Result<Vec<StoredTile>, StoreError> {
        let records = self
            .descriptors
            .values()
            .await
            .map_err(StoreError::Descriptor)?;
        records
            .iter()
            .map(|record| serde_json::from_slice(record).map_err(StoreError::from))
            .collect()
    }

    /// Stored descriptors of the layer with `url_template`.
    pub async fn list_for_template(&self, url_template: &str) -> Result<Vec<StoredTile>, StoreError> {
        let mut tiles = self.list().await?;
        tiles.retain(|t| t.descriptor.url_template == url_template);
        Ok(tiles)
    }

    /// GeoJSON `FeatureCollection` of the layer's stored tiles.
    pub async fn to_geojson(
        &self,
        url_template: &str,
        tile_size: u32,
    ) -> Result<serde_json::Value, StoreError> {
        let tiles = self.list_for_template(url_template).await?;
        Ok(tiles_to_geojson(&tiles, tile_size))
    }
}

impl std::fmt::Debug for TileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BoxFuture, MemoryCacheProvider};
    use tempfile::TempDir;

    fn descriptor(x: u32, y: u32, z: u8, template: &str) -> TileDescriptor {
        TileDescriptor {
            key: format!("https://a.example.org/{}/{}/{}.png", z, x, y),
            url: format!("https://b.example.org/{}/{}/{}.png", z, x, y),
            url_template: template.to_string(),
            x,
            y,
            z,
        }
    }

    const TEMPLATE: &str = "https://{s}.example.org/{z}/{x}/{y}.png";

    #[tokio::test]
    async fn test_put_then_get() {
        let store = TileStore::in_memory().await.unwrap();
        let d = descriptor(1, 2, 3, TEMPLATE);

        let stored = store.put(d.clone(), b"tile".to_vec()).await.unwrap();
        assert_eq!(stored.descriptor, d);
        assert!(stored.created_at > 0);

        assert_eq!(store.get(&d.key).await.unwrap(), Some(b"tile".to_vec()));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = TileStore::in_memory().await.unwrap();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resave_overwrites_and_refreshes_timestamp() {
        let store = TileStore::in_memory().await.unwrap();
        let d = descriptor(1, 2, 3, TEMPLATE);

        let first = store.put(d.clone(), b"old".to_vec()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.put(d.clone(), b"new".to_vec()).await.unwrap();

        assert!(second.created_at >= first.created_at);
        assert_eq!(store.get(&d.key).await.unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.list().await.unwrap()[0].created_at, second.created_at);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let store = TileStore::in_memory().await.unwrap();
        let a = descriptor(1, 1, 5, TEMPLATE);
        let b = descriptor(2, 1, 5, TEMPLATE);
        store.put(a.clone(), vec![1]).await.unwrap();
        store.put(b.clone(), vec![2]).await.unwrap();

        assert!(store.remove(&a.key).await.unwrap());
        assert!(!store.remove(&a.key).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.blob_count().await.unwrap(), 0);
        assert!(store.get(&b.key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_template_filters_layers() {
        let store = TileStore::in_memory().await.unwrap();
        store.put(descriptor(1, 1, 5, TEMPLATE), vec![1]).await.unwrap();
        store
            .put(descriptor(1, 1, 6, "https://other/{z}/{x}/{y}.png"), vec![2])
            .await
            .unwrap();

        assert_eq!(store.list().await.unwrap().len(), 2);
        let layer = store.list_for_template(TEMPLATE).await.unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer[0].descriptor.z, 5);
    }

    #[tokio::test]
    async fn test_disk_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config = CacheConfig::Disk {
            directory: temp_dir.path().to_path_buf(),
        };
        let d = descriptor(7, 8, 9, TEMPLATE);

        let store = TileStore::open(&config).await.unwrap();
        store.put(d.clone(), b"disk".to_vec()).await.unwrap();

        let reopened = TileStore::open(&config).await.unwrap();
        assert_eq!(reopened.get(&d.key).await.unwrap(), Some(b"disk".to_vec()));
        assert_eq!(reopened.list().await.unwrap()[0].descriptor, d);
    }

    /// Descriptor namespace that rejects writes.
    struct ReadOnlyCache;

    impl Cache for ReadOnlyCache {
        fn set(&self, _key: &str, _value: Vec<u8>) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
            Box::pin(async { Err(ServiceCacheError::Provider("read-only".to_string())) })
        }
        fn get(&self, _key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, ServiceCacheError>> {
            Box::pin(async { Ok(None) })
        }
        fn delete(&self, _key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
            Box::pin(async { Ok(false) })
        }
        fn contains(&self, _key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
            Box::pin(async { Ok(false) })
        }
        fn clear(&self) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
            Box::pin(async { Ok(()) })
        }
        fn entry_count(&self) -> BoxFuture<'_, Result<u64, ServiceCacheError>> {
            Box::pin(async { Ok(0) })
        }
        fn values(&self) -> BoxFuture<'_, Result<Vec<Vec<u8>>, ServiceCacheError>> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    #[tokio::test]
    async fn test_descriptor_failure_leaves_orphan_blob() {
        let store = TileStore::new(Arc::new(MemoryCacheProvider::new()), Arc::new(ReadOnlyCache));
        let d = descriptor(1, 2, 3, TEMPLATE);

        let err = store.put(d.clone(), vec![1]).await.unwrap_err();
        assert!(matches!(err, StoreError::Descriptor(_)));

        assert_eq!(store.blob_count().await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
