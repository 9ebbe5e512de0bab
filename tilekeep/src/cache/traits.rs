//! Core traits for the key-value backends.
//!
//! The `Cache` trait is a domain-agnostic key-value interface. The tile store
//! keeps blobs and descriptors in two separate `Cache` handles, so any
//! backend that implements this trait can hold either namespace.
//!
//! - **String keys**: tile storage keys are URLs, readable in logs
//! - **Vec<u8> values**: raw bytes, serialization is the caller's concern
//! - **Dyn-compatible**: async methods return `Pin<Box<dyn Future>>` so
//!   backends can be shared as `Arc<dyn Cache>`

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum ServiceCacheError {
    /// I/O error during cache operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider-specific error.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Key-value storage for one namespace.
///
/// Implementations must be `Send + Sync`; the save orchestrator writes from
/// several tasks at once.
pub trait Cache: Send + Sync {
    /// Store a value, replacing any previous value for the key.
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), ServiceCacheError>>;

    /// Retrieve a value by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(data))` if the key exists
    /// - `Ok(None)` if the key is not found
    /// - `Err(_)` if an error occurs
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, ServiceCacheError>>;

    /// Delete a value by key. Returns whether the key existed.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Check if a key exists without retrieving the value.
    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Remove every entry of the namespace.
    fn clear(&self) -> BoxFuture<'_, Result<(), ServiceCacheError>>;

    /// Number of entries in the namespace.
    fn entry_count(&self) -> BoxFuture<'_, Result<u64, ServiceCacheError>>;

    /// Every stored value, in no particular order.
    fn values(&self) -> BoxFuture<'_, Result<Vec<Vec<u8>>, ServiceCacheError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        let err = ServiceCacheError::Provider("backend offline".to_string());
        assert_eq!(format!("{}", err), "Provider error: backend offline");
    }

    #[test]
    fn test_cache_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cache_err: ServiceCacheError = io_err.into();
        assert!(matches!(cache_err, ServiceCacheError::Io(_)));
    }
}
