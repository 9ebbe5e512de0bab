//! Offline-aware tile layer.
//!
//! [`OfflineTileLayer`] answers the host's per-tile requests from the store
//! when it can and falls back to the online URL otherwise. It also carries
//! the layer's [`TileUrlDeriver`] and fetcher, which the save orchestrator
//! borrows for enumeration and download.

mod image;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::coord::{project_bounds, LatLngBounds, PixelBounds, TileCoord};
use crate::provider::{FetchError, TileFetcher};
use crate::store::TileStore;
use crate::template::{TemplateError, TileLayerOptions, TileUrlDeriver};
use crate::tile::TileDescriptor;

pub use image::{sniff_content_type, TileImage};

/// Tile layer that prefers stored tiles over the network.
#[derive(Clone)]
pub struct OfflineTileLayer {
    deriver: Arc<TileUrlDeriver>,
    store: TileStore,
    fetcher: Arc<dyn TileFetcher>,
}

impl OfflineTileLayer {
    pub fn new(
        url_template: &str,
        options: TileLayerOptions,
        store: TileStore,
        fetcher: Arc<dyn TileFetcher>,
    ) -> Result<Self, TemplateError> {
        let deriver = TileUrlDeriver::new(url_template, options)?;
        Ok(Self::from_deriver(deriver, store, fetcher))
    }

    pub fn from_deriver(
        deriver: TileUrlDeriver,
        store: TileStore,
        fetcher: Arc<dyn TileFetcher>,
    ) -> Self {
        Self {
            deriver: Arc::new(deriver),
            store,
            fetcher,
        }
    }

    pub fn deriver(&self) -> &TileUrlDeriver {
        &self.deriver
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn fetcher(&self) -> &Arc<dyn TileFetcher> {
        &self.fetcher
    }

    pub fn url_template(&self) -> &str {
        self.deriver.template()
    }

    pub fn storage_key(&self, coord: &TileCoord) -> String {
        self.deriver.storage_key(coord)
    }

    pub fn tile_url(&self, coord: &TileCoord) -> String {
        self.deriver.tile_url(coord)
    }

    /// Parallel download width, one per subdomain.
    pub fn simultaneous(&self) -> usize {
        self.deriver.simultaneous()
    }

    /// Descriptors of the tiles covering pixel `bounds` at `zoom`.
    pub fn tile_descriptors(&self, bounds: &PixelBounds, zoom: u8) -> Vec<TileDescriptor> {
        self.deriver.tile_descriptors(bounds, zoom)
    }

    /// Descriptors of the tiles covering a geographic area at `zoom`.
    pub fn area_descriptors(&self, bounds: &LatLngBounds, zoom: u8) -> Vec<TileDescriptor> {
        self.deriver
            .tile_descriptors(&project_bounds(bounds, zoom), zoom)
    }

    /// Resolve the image source of one tile.
    ///
    /// A store hit yields the stored bytes. A miss, or a store error, yields
    /// the online URL; store errors are logged and never surfaced.
    pub async fn create_tile(&self, coord: TileCoord) -> TileImage {
        let key = self.deriver.storage_key(&coord);
        match self.store.get(&key).await {
            Ok(Some(data)) => {
                debug!(tile = %coord, key = %key, "Serving stored tile");
                TileImage::Stored { key, data }
            }
            Ok(None) => TileImage::Online {
                url: self.deriver.tile_url(&coord),
            },
            Err(e) => {
                warn!(tile = %coord, key = %key, error = %e, "Tile store lookup failed, using online tile");
                TileImage::Online {
                    url: self.deriver.tile_url(&coord),
                }
            }
        }
    }

    /// Callback form of [`create_tile`](Self::create_tile).
    ///
    /// The lookup runs on a spawned task so the caller is not blocked;
    /// `done` is invoked exactly once with no error and the resolved image.
    pub fn create_tile_with<F>(&self, coord: TileCoord, done: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<FetchError>, TileImage) + Send + 'static,
    {
        let layer = self.clone();
        tokio::spawn(async move {
            let tile = layer.create_tile(coord).await;
            done(None, tile);
        })
    }

    /// Bytes of one tile: from the store when present, otherwise one fetch.
    ///
    /// Fetched bytes are not written to the store; only bulk saves persist.
    pub async fn load_tile(&self, coord: TileCoord) -> Result<Vec<u8>, FetchError> {
        match self.create_tile(coord).await {
            TileImage::Stored { data, .. } => Ok(data),
            TileImage::Online { url } => self.fetcher.fetch(&url).await,
        }
    }
}

impl std::fmt::Debug for OfflineTileLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineTileLayer")
            .field("url_template", &self.deriver.template())
            .finish_non_exhaustive()
    }
}
