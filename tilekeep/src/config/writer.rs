//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::{CacheBackend, ConfigFile};

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let backend = match config.cache.backend {
        CacheBackend::Memory => "memory",
        CacheBackend::Disk => "disk",
    };
    let zoom_levels = config
        .save
        .zoom_levels
        .as_ref()
        .map(|levels| {
            levels
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default();
    let bounds = config
        .save
        .bounds
        .map(|b| b.to_string())
        .unwrap_or_default();

    format!(
        r#"[layer]
; Tile URL template. Placeholders:
;   {{s}} subdomain, {{z}} zoom, {{x}} column, {{y}} row,
;   {{-y}} row counted from the south, {{r}} '@2x' when retina is enabled
url_template = {}
; Comma-separated subdomains rotated through by {{s}}
subdomains = {}
; Tile edge in pixels (default: 256)
tile_size = {}
; Request high-DPI tiles
retina = {}
; Rows are numbered from the south edge
tms = {}

[cache]
; Storage backend: disk (persistent) or memory (lost on exit)
backend = {}
; Directory holding the 'tiles' and 'areas' namespaces (disk backend)
directory = {}

[download]
; Timeout in seconds for tile requests, 0 for none (default: 0)
timeout = {}

[save]
; Highest zoom saved when save_what_you_see is enabled (default: 19)
max_zoom = {}
; Lowest zoom from which save_what_you_see is allowed (default: 5)
min_zoom = {}
; Save the current view from its zoom up to max_zoom
save_what_you_see = {}
; Comma-separated zoom levels to save; empty saves the current zoom only
zoom_levels = {}
; Fixed area as south,west,north,east; empty uses the current view
bounds = {}

[control]
; Control corner: topleft, topright, bottomleft, bottomright
position = {}
save_text = {}
remove_text = {}

[logging]
; Log file path
file = {}
"#,
        config.layer.url_template,
        config.layer.subdomains.join(","),
        config.layer.tile_size,
        config.layer.retina,
        config.layer.tms,
        backend,
        path_to_string(&config.cache.directory),
        config.download.timeout,
        config.save.max_zoom,
        config.save.min_zoom,
        config.save.save_what_you_see,
        zoom_levels,
        bounds,
        config.control.position,
        config.control.save_text,
        config.control.remove_text,
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::ConfigFile;
    use super::*;
    use crate::control::ControlPosition;
    use crate::coord::{LatLng, LatLngBounds};
    use tempfile::TempDir;

    #[test]
    fn test_default_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let config = ConfigFile::default();
        config.save_to(&config_path).unwrap();

        let loaded = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_and_load_custom_values() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.layer.url_template = "https://tiles.example.org/{z}/{x}/{-y}.png".to_string();
        config.layer.subdomains = Vec::new();
        config.cache.backend = CacheBackend::Memory;
        config.cache.directory = temp_dir.path().join("store");
        config.download.timeout = 15;
        config.save.zoom_levels = Some(vec![3, 4]);
        config.save.bounds = Some(
            LatLngBounds::new(LatLng::new(52.3, 4.8), LatLng::new(52.4, 4.95)).unwrap(),
        );
        config.control.position = ControlPosition::TopRight;

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_written_file_has_every_section() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[layer]", "[cache]", "[download]", "[save]", "[control]", "[logging]"] {
            assert!(content.contains(section), "missing {}", section);
        }
        assert!(content.contains("{s}"));
    }
}
