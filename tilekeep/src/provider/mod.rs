//! Tile download abstraction.
//!
//! [`TileFetcher`] is the seam between the offline layer and the network.
//! [`ReqwestFetcher`] is the production implementation:
//!
//! ```ignore
//! use tilekeep::provider::{ReqwestFetcher, TileFetcher};
//!
//! let fetcher = ReqwestFetcher::new()?;
//! let bytes = fetcher.fetch("https://a.tile.openstreetmap.org/5/16/10.png").await?;
//! ```

mod http;
mod types;

pub use http::{ReqwestFetcher, DEFAULT_USER_AGENT};
pub use types::{FetchError, TileFetcher};

#[cfg(test)]
pub use http::tests::MockFetcher;
