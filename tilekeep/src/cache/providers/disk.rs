//! On-disk cache provider.
//!
//! Each namespace is one directory. Files are stored flat:
//!
//! ```text
//! {directory}/{sha256(key)}.cache
//! ```
//!
//! The key is hashed to create a safe filename on every platform. Writes go
//! to a uniquely named `.tmp` file first and are renamed into place, so a
//! reader never sees a half-written value; leftover `.tmp` files are ignored.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::traits::{BoxFuture, Cache, ServiceCacheError};

const VALUE_EXTENSION: &str = "cache";
const TEMP_EXTENSION: &str = "tmp";

/// On-disk key-value namespace.
#[derive(Debug)]
pub struct DiskCacheProvider {
    directory: PathBuf,
    /// Distinguishes concurrent temp files for the same key
    write_seq: AtomicU64,
}

impl DiskCacheProvider {
    /// Open (creating if needed) a namespace directory.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, ServiceCacheError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;
        debug!(directory = %directory.display(), "Disk cache namespace opened");

        Ok(Self {
            directory,
            write_seq: AtomicU64::new(0),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Generate a safe filename from a cache key.
    fn key_to_filename(key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        let mut name = String::with_capacity(digest.len() * 2 + VALUE_EXTENSION.len() + 1);
        for byte in digest {
            name.push_str(&format!("{:02x}", byte));
        }
        name.push('.');
        name.push_str(VALUE_EXTENSION);
        name
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.directory.join(Self::key_to_filename(key))
    }

    /// Paths of all committed values in the namespace.
    async fn value_files(&self) -> Result<Vec<PathBuf>, ServiceCacheError> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(ServiceCacheError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == VALUE_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl Cache for DiskCacheProvider {
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        let path = self.key_path(key);
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        Box::pin(async move {
            let temp_path = path.with_extension(format!("{}.{}", seq, TEMP_EXTENSION));
            if let Err(e) = tokio::fs::write(&temp_path, &value).await {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(ServiceCacheError::Io(e));
            }
            tokio::fs::rename(&temp_path, &path)
                .await
                .map_err(ServiceCacheError::Io)?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, ServiceCacheError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            match tokio::fs::read(&path).await {
                Ok(data) => Ok(Some(data)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ServiceCacheError::Io(e)),
            }
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(ServiceCacheError::Io(e)),
            }
        })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let path = self.key_path(key);
        Box::pin(async move { Ok(tokio::fs::try_exists(&path).await?) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        Box::pin(async move {
            for path in self.value_files().await? {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(ServiceCacheError::Io(e)),
                }
            }
            Ok(())
        })
    }

    fn entry_count(&self) -> BoxFuture<'_, Result<u64, ServiceCacheError>> {
        Box::pin(async move { Ok(self.value_files().await?.len() as u64) })
    }

    fn values(&self) -> BoxFuture<'_, Result<Vec<Vec<u8>>, ServiceCacheError>> {
        Box::pin(async move {
            let mut values = Vec::new();
            for path in self.value_files().await? {
                match tokio::fs::read(&path).await {
                    Ok(data) => values.push(data),
                    // Removed between listing and reading
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        warn!(path = %path.display(), "Cache file vanished during listing");
                    }
                    Err(e) => return Err(ServiceCacheError::Io(e)),
                }
            }
            Ok(values)
        })
    }
}
