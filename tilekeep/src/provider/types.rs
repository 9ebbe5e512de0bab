//! Fetcher trait and error types.

use thiserror::Error;

use crate::cache::BoxFuture;

/// Errors from tile downloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request could not be sent or no response arrived.
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The response body could not be read.
    #[error("Failed to read response from {url}: {message}")]
    Body { url: String, message: String },

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// URL the failed request was for, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Request { url, .. }
            | FetchError::Body { url, .. } => Some(url),
            FetchError::Client(_) => None,
        }
    }
}

/// Downloads the bytes of one tile.
///
/// Dyn-compatible so the offline layer and the save orchestrator can share
/// one fetcher as `Arc<dyn TileFetcher>` and tests can substitute a mock.
pub trait TileFetcher: Send + Sync {
    /// GET `url` and return the response body.
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, FetchError>>;
}
