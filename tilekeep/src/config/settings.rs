//! Settings structs for each configuration section.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

use crate::control::ControlPosition;
use crate::coord::LatLngBounds;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub layer: LayerSettings,
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub save: SaveSettings,
    pub control: ControlSettings,
    pub logging: LoggingSettings,
}

/// Tile layer being cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSettings {
    /// URL template with `{s}`, `{z}`, `{x}`, `{y}`, `{r}` placeholders
    pub url_template: String,
    pub subdomains: Vec<String>,
    pub tile_size: u32,
    pub retina: bool,
    pub tms: bool,
}

/// Storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Disk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    /// Root of the on-disk namespaces
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Request timeout in seconds, 0 for none
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveSettings {
    pub max_zoom: u8,
    pub min_zoom: u8,
    pub save_what_you_see: bool,
    pub zoom_levels: Option<Vec<u8>>,
    pub bounds: Option<LatLngBounds>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSettings {
    pub position: ControlPosition,
    pub save_text: String,
    pub remove_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
