//! Application configuration for TileKeepApp.
//!
//! `AppConfig` gathers everything needed to bootstrap the application: the
//! layer being cached, the storage backend, download settings and the
//! save control options.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::config::{CacheBackend, ConfigFile, DEFAULT_URL_TEMPLATE};
use crate::control::SaveControlConfig;
use crate::template::TileLayerOptions;

/// Top-level configuration passed to `TileKeepApp::start()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Tile URL template of the cached layer.
    pub url_template: String,

    /// Subdomains, tile size, retina and TMS options of the layer.
    pub layer_options: TileLayerOptions,

    /// Storage backend of the tile store.
    pub cache: CacheConfig,

    /// Timeout of one tile request; `None` waits indefinitely.
    pub download_timeout: Option<Duration>,

    /// Options of the save/remove control.
    pub control: SaveControlConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL_TEMPLATE)
    }
}

impl AppConfig {
    /// Create a config for `url_template` with in-memory storage.
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            layer_options: TileLayerOptions::default(),
            cache: CacheConfig::Memory,
            download_timeout: None,
            control: SaveControlConfig::default(),
        }
    }

    /// Create application config from the configuration file.
    ///
    /// Keeps the translation from file settings to runtime types in one
    /// place rather than scattered in CLI code.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let layer = &config.layer;
        let layer_options = TileLayerOptions::default()
            .with_subdomains(layer.subdomains.iter().cloned())
            .with_tile_size(layer.tile_size)
            .with_retina(layer.retina)
            .with_tms(layer.tms);

        let cache = match config.cache.backend {
            CacheBackend::Memory => CacheConfig::Memory,
            CacheBackend::Disk => CacheConfig::Disk {
                directory: config.cache.directory.clone(),
            },
        };

        let download_timeout = match config.download.timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let save = &config.save;
        let mut control = SaveControlConfig::default()
            .with_position(config.control.position)
            .with_labels(
                config.control.save_text.clone(),
                config.control.remove_text.clone(),
            )
            .with_max_zoom(save.max_zoom)
            .with_min_zoom(save.min_zoom)
            .with_save_what_you_see(save.save_what_you_see);
        if let Some(levels) = &save.zoom_levels {
            control = control.with_zoom_levels(levels.clone());
        }
        if let Some(bounds) = save.bounds {
            control = control.with_bounds(bounds);
        }

        Self {
            url_template: layer.url_template.clone(),
            layer_options,
            cache,
            download_timeout,
            control,
        }
    }

    /// Replace the URL template.
    pub fn with_url_template(mut self, url_template: impl Into<String>) -> Self {
        self.url_template = url_template.into();
        self
    }

    pub fn with_layer_options(mut self, options: TileLayerOptions) -> Self {
        self.layer_options = options;
        self
    }

    /// Persist tiles under `directory`.
    pub fn with_disk_cache(mut self, directory: PathBuf) -> Self {
        self.cache = CacheConfig::Disk { directory };
        self
    }

    pub fn with_memory_cache(mut self) -> Self {
        self.cache = CacheConfig::Memory;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_control(mut self, control: SaveControlConfig) -> Self {
        self.control = control;
        self
    }
}
