//! Layer options that influence URL rendering.

use std::collections::BTreeMap;

/// Subdomains used when a layer does not configure its own.
pub const DEFAULT_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Value of `{r}` on high-DPI layers.
pub const RETINA_SUFFIX: &str = "@2x";

/// Options of a tile layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayerOptions {
    /// Subdomains rotated through by `{s}`
    pub subdomains: Vec<String>,
    /// Tile edge in pixels
    pub tile_size: u32,
    /// Request high-DPI tiles (`{r}` renders as `@2x`)
    pub retina: bool,
    /// Rows are numbered from the south edge (`{y}` renders inverted)
    pub tms: bool,
    /// Values for custom placeholders such as `{apikey}`
    pub extra: BTreeMap<String, String>,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self {
            subdomains: DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
            tile_size: DEFAULT_TILE_SIZE,
            retina: false,
            tms: false,
            extra: BTreeMap::new(),
        }
    }
}

impl TileLayerOptions {
    /// Replace the subdomain list.
    ///
    /// Accepts either a list or a single string whose characters are the
    /// subdomains (`"abc"`), the two shapes layer options come in.
    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    /// Subdomains given as one string of single-character names.
    pub fn with_subdomain_chars(self, chars: &str) -> Self {
        self.with_subdomains(chars.chars().map(String::from))
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_retina(mut self, retina: bool) -> Self {
        self.retina = retina;
        self
    }

    pub fn with_tms(mut self, tms: bool) -> Self {
        self.tms = tms;
        self
    }

    /// Add a value for a custom placeholder.
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TileLayerOptions::default();
        assert_eq!(options.subdomains, vec!["a", "b", "c"]);
        assert_eq!(options.tile_size, 256);
        assert!(!options.retina);
        assert!(!options.tms);
    }

    #[test]
    fn test_subdomain_chars() {
        let options = TileLayerOptions::default().with_subdomain_chars("1234");
        assert_eq!(options.subdomains, vec!["1", "2", "3", "4"]);
    }
}
