//! Application bootstrap implementation.
//!
//! `TileKeepApp` opens the store before anything that reads from it, then
//! builds the fetcher, the layer and the save control on top.

use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::control::SaveControl;
use crate::layer::OfflineTileLayer;
use crate::provider::{ReqwestFetcher, TileFetcher};
use crate::store::TileStore;

/// A running tilekeep instance.
///
/// # Example
///
/// ```ignore
/// use tilekeep::app::{AppConfig, TileKeepApp};
///
/// let app = TileKeepApp::start(AppConfig::new(template)).await?;
/// let bytes = app.layer().load_tile(coord).await?;
/// app.shutdown().await;
/// ```
pub struct TileKeepApp {
    store: TileStore,
    layer: OfflineTileLayer,
    control: Arc<SaveControl>,
    config: AppConfig,
}

impl TileKeepApp {
    /// Start the application with an HTTP fetcher built from the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, the HTTP client
    /// cannot be built or the URL template is invalid.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let fetcher = ReqwestFetcher::with_timeout(config.download_timeout)?;
        Self::start_with_fetcher(config, Arc::new(fetcher)).await
    }

    /// Start the application with a caller-supplied fetcher.
    pub async fn start_with_fetcher(
        config: AppConfig,
        fetcher: Arc<dyn TileFetcher>,
    ) -> Result<Self, AppError> {
        info!(
            backend = config.cache.backend_name(),
            url_template = %config.url_template,
            "Starting tilekeep"
        );

        // 1. Store first; the layer reads from it
        let store = TileStore::open(&config.cache).await?;
        let stored = store.count().await?;
        info!(stored_tiles = stored, "Tile store opened");

        // 2. Layer over store and fetcher
        let layer = OfflineTileLayer::new(
            &config.url_template,
            config.layer_options.clone(),
            store.clone(),
            fetcher,
        )?;

        // 3. Save control
        let control = Arc::new(SaveControl::new(layer.clone(), config.control.clone()));

        info!(
            simultaneous = layer.simultaneous(),
            tile_size = layer.deriver().tile_size(),
            "Tile layer ready"
        );

        Ok(Self {
            store,
            layer,
            control,
            config,
        })
    }

    pub fn store(&self) -> &TileStore {
        &self.store
    }

    pub fn layer(&self) -> &OfflineTileLayer {
        &self.layer
    }

    /// Save control, shareable with signal handlers.
    pub fn control(&self) -> Arc<SaveControl> {
        Arc::clone(&self.control)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shut the application down, cancelling any running save session.
    ///
    /// Tiles already persisted stay in the store.
    pub async fn shutdown(self) {
        info!("Shutting down tilekeep");
        self.control.drain_active().await;
        match self.store.count().await {
            Ok(count) => info!(stored_tiles = count, "tilekeep shutdown complete"),
            Err(e) => info!(error = %e, "tilekeep shutdown complete, store count unavailable"),
        }
    }
}

impl std::fmt::Debug for TileKeepApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileKeepApp")
            .field("layer", &self.layer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
