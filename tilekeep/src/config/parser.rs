//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::{CacheBackend, ConfigFile};
use crate::coord::{LatLngBounds, MAX_ZOOM};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [layer] section
    if let Some(section) = ini.section(Some("layer")) {
        if let Some(v) = section.get("url_template") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("layer", "url_template", v, "must not be empty"));
            }
            config.layer.url_template = v.to_string();
        }
        if let Some(v) = section.get("subdomains") {
            config.layer.subdomains = parse_list(v);
        }
        if let Some(v) = section.get("tile_size") {
            let size: u32 = parse_number("layer", "tile_size", v, "must be a positive integer (pixels)")?;
            if size == 0 {
                return Err(invalid("layer", "tile_size", v, "must be greater than zero"));
            }
            config.layer.tile_size = size;
        }
        if let Some(v) = section.get("retina") {
            config.layer.retina = parse_bool(v);
        }
        if let Some(v) = section.get("tms") {
            config.layer.tms = parse_bool(v);
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("backend") {
            let v = v.trim().to_lowercase();
            config.cache.backend = match v.as_str() {
                "memory" => CacheBackend::Memory,
                "disk" => CacheBackend::Disk,
                _ => return Err(invalid("cache", "backend", &v, "must be 'memory' or 'disk'")),
            };
        }
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_number(
                "download",
                "timeout",
                v,
                "must be a non-negative integer (seconds, 0 for none)",
            )?;
        }
    }

    // [save] section
    if let Some(section) = ini.section(Some("save")) {
        if let Some(v) = section.get("max_zoom") {
            config.save.max_zoom = parse_zoom("save", "max_zoom", v)?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.save.min_zoom = parse_zoom("save", "min_zoom", v)?;
        }
        if let Some(v) = section.get("save_what_you_see") {
            config.save.save_what_you_see = parse_bool(v);
        }
        if let Some(v) = section.get("zoom_levels") {
            let items = parse_list(v);
            config.save.zoom_levels = if items.is_empty() {
                None
            } else {
                Some(
                    items
                        .iter()
                        .map(|item| parse_zoom("save", "zoom_levels", item))
                        .collect::<Result<_, _>>()?,
                )
            };
        }
        if let Some(v) = section.get("bounds") {
            let v = v.trim();
            config.save.bounds = if v.is_empty() {
                None
            } else {
                Some(LatLngBounds::from_str(v).map_err(|e| {
                    invalid("save", "bounds", v, &e.to_string())
                })?)
            };
        }
    }

    // [control] section
    if let Some(section) = ini.section(Some("control")) {
        if let Some(v) = section.get("position") {
            config.control.position = v
                .parse()
                .map_err(|reason: String| invalid("control", "position", v, &reason))?;
        }
        if let Some(v) = section.get("save_text") {
            config.control.save_text = v.to_string();
        }
        if let Some(v) = section.get("remove_text") {
            config.control.remove_text = v.to_string();
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_zoom(section: &str, key: &str, value: &str) -> Result<u8, ConfigFileError> {
    let zoom: u8 = parse_number(section, key, value, "must be a zoom level between 0 and 30")?;
    if zoom > MAX_ZOOM {
        return Err(invalid(section, key, value, "must be a zoom level between 0 and 30"));
    }
    Ok(zoom)
}

/// Split a comma-separated list, dropping empty items.
pub(super) fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlPosition;
    use crate::coord::LatLng;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_layer_section() {
        let config = load(
            r#"
[layer]
url_template = https://{s}.tiles.example.org/{z}/{x}/{y}{r}.png
subdomains = 1, 2, 3, 4
tile_size = 512
retina = yes
tms = false
"#,
        )
        .unwrap();

        assert_eq!(
            config.layer.url_template,
            "https://{s}.tiles.example.org/{z}/{x}/{y}{r}.png"
        );
        assert_eq!(config.layer.subdomains, vec!["1", "2", "3", "4"]);
        assert_eq!(config.layer.tile_size, 512);
        assert!(config.layer.retina);
        assert!(!config.layer.tms);
    }

    #[test]
    fn test_save_section() {
        let config = load(
            r#"
[save]
max_zoom = 16
min_zoom = 3
save_what_you_see = true
zoom_levels = 3,4
bounds = 52.3,4.8,52.4,4.95
"#,
        )
        .unwrap();

        assert_eq!(config.save.max_zoom, 16);
        assert_eq!(config.save.min_zoom, 3);
        assert!(config.save.save_what_you_see);
        assert_eq!(config.save.zoom_levels, Some(vec![3, 4]));
        let bounds = config.save.bounds.unwrap();
        assert_eq!(bounds.south_west(), LatLng::new(52.3, 4.8));
    }

    #[test]
    fn test_empty_optional_values_are_none() {
        let config = load(
            r#"
[save]
zoom_levels =
bounds =
"#,
        )
        .unwrap();
        assert!(config.save.zoom_levels.is_none());
        assert!(config.save.bounds.is_none());
    }

    #[test]
    fn test_invalid_backend() {
        let err = load("[cache]\nbackend = cloud\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "cache");
                assert_eq!(key, "backend");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_zoom() {
        assert!(load("[save]\nmax_zoom = 40\n").is_err());
        assert!(load("[save]\nzoom_levels = 3,x\n").is_err());
    }

    #[test]
    fn test_invalid_bounds() {
        let err = load("[save]\nbounds = 1,2,3\n").unwrap_err();
        assert!(err.to_string().contains("save.bounds"));
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        assert!(load("[layer]\ntile_size = 0\n").is_err());
    }

    #[test]
    fn test_control_section() {
        let config = load(
            r#"
[control]
position = bottomright
save_text = Save
remove_text = Remove
"#,
        )
        .unwrap();
        assert_eq!(config.control.position, ControlPosition::BottomRight);
        assert_eq!(config.control.save_text, "Save");
        assert_eq!(config.control.remove_text, "Remove");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("YES"));
        assert!(parse_bool("1"));
        assert!(parse_bool(" on "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("nope"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x"), home.join("x"));
        }
    }
}
