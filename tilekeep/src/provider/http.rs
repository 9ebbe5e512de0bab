//! reqwest-backed tile fetcher.

use std::time::Duration;

use tracing::{debug, trace, warn};

use super::types::{FetchError, TileFetcher};
use crate::cache::BoxFuture;

/// User-Agent sent with every tile request.
///
/// Public tile servers reject anonymous clients.
pub const DEFAULT_USER_AGENT: &str = concat!("tilekeep/", env!("CARGO_PKG_VERSION"));

/// Tile fetcher using an async reqwest client.
///
/// One GET per call, no retry. A timeout applies only when configured.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Creates a fetcher without a request timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(None)
    }

    /// Creates a fetcher with an optional request timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl TileFetcher for ReqwestFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<Vec<u8>, FetchError>> {
        let url = url.to_string();
        Box::pin(async move {
            trace!(url = %url, "HTTP GET request starting");

            let response = match self.client.get(&url).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(
                        url = %url,
                        error = %e,
                        is_connect = e.is_connect(),
                        is_timeout = e.is_timeout(),
                        "HTTP request failed"
                    );
                    return Err(FetchError::Request {
                        url,
                        message: e.to_string(),
                    });
                }
            };

            let status = response.status();
            if !status.is_success() {
                debug!(url = %url, status = status.as_u16(), "HTTP error status");
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url,
                });
            }

            match response.bytes().await {
                Ok(body) => {
                    debug!(url = %url, bytes = body.len(), "HTTP response received");
                    Ok(body.to_vec())
                }
                Err(e) => Err(FetchError::Body {
                    url,
                    message: e.to_string(),
                }),
            }
        })
    }
}
