//! Default values and the `ConfigFile::default()` implementation.

use crate::control::{ControlPosition, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use crate::template::{DEFAULT_SUBDOMAINS, DEFAULT_TILE_SIZE};

use super::file::config_directory;
use super::settings::*;

/// OpenStreetMap standard tile layer.
pub const DEFAULT_URL_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// No request timeout.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 0;

pub const DEFAULT_SAVE_TEXT: &str = "+";
pub const DEFAULT_REMOVE_TEXT: &str = "-";

pub const DEFAULT_LOG_FILE_NAME: &str = "tilekeep.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            layer: LayerSettings {
                url_template: DEFAULT_URL_TEMPLATE.to_string(),
                subdomains: DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
                tile_size: DEFAULT_TILE_SIZE,
                retina: false,
                tms: false,
            },
            cache: CacheSettings {
                backend: CacheBackend::Disk,
                directory: config_dir.join("cache"),
            },
            download: DownloadSettings {
                timeout: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            },
            save: SaveSettings {
                max_zoom: DEFAULT_MAX_ZOOM,
                min_zoom: DEFAULT_MIN_ZOOM,
                save_what_you_see: false,
                zoom_levels: None,
                bounds: None,
            },
            control: ControlSettings {
                position: ControlPosition::TopLeft,
                save_text: DEFAULT_SAVE_TEXT.to_string(),
                remove_text: DEFAULT_REMOVE_TEXT.to_string(),
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
