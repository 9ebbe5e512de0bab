//! Key-value backends for the tile store.
//!
//! The store works with two namespaces, [`TILES_NAMESPACE`] for blobs and
//! [`AREAS_NAMESPACE`] for descriptors. [`open_namespace`] builds one
//! namespace from a [`CacheConfig`]:
//!
//! ```ignore
//! use tilekeep::cache::{open_namespace, CacheConfig, TILES_NAMESPACE};
//!
//! let tiles = open_namespace(&CacheConfig::Memory, TILES_NAMESPACE).await?;
//! tiles.set("key", vec![1, 2, 3]).await?;
//! ```

mod providers;
mod traits;

use std::path::PathBuf;
use std::sync::Arc;

pub use providers::{DiskCacheProvider, MemoryCacheProvider};
pub use traits::{BoxFuture, Cache, ServiceCacheError};

/// Namespace holding tile blobs.
pub const TILES_NAMESPACE: &str = "tiles";

/// Namespace holding tile descriptors.
pub const AREAS_NAMESPACE: &str = "areas";

/// Backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheConfig {
    /// Process-local storage
    #[default]
    Memory,
    /// One subdirectory per namespace under `directory`
    Disk { directory: PathBuf },
}

impl CacheConfig {
    /// Short backend name as used in the config file.
    pub fn backend_name(&self) -> &'static str {
        match self {
            CacheConfig::Memory => "memory",
            CacheConfig::Disk { .. } => "disk",
        }
    }
}

/// Open the namespace `name` on the configured backend.
pub async fn open_namespace(
    config: &CacheConfig,
    name: &str,
) -> Result<Arc<dyn Cache>, ServiceCacheError> {
    match config {
        CacheConfig::Memory => Ok(Arc::new(MemoryCacheProvider::new())),
        CacheConfig::Disk { directory } => {
            let provider = DiskCacheProvider::open(directory.join(name)).await?;
            Ok(Arc::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_memory_namespaces_are_independent() {
        let tiles = open_namespace(&CacheConfig::Memory, TILES_NAMESPACE).await.unwrap();
        let areas = open_namespace(&CacheConfig::Memory, AREAS_NAMESPACE).await.unwrap();

        tiles.set("k", vec![1]).await.unwrap();
        assert!(!areas.contains("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_disk_namespace_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config = CacheConfig::Disk {
            directory: temp_dir.path().to_path_buf(),
        };

        let tiles = open_namespace(&config, TILES_NAMESPACE).await.unwrap();
        tiles.set("k", vec![1]).await.unwrap();

        assert!(temp_dir.path().join("tiles").is_dir());
        assert_eq!(config.backend_name(), "disk");
    }
}
