//! Storage key and fetch URL derivation for one layer.

use crate::coord::{PixelBounds, TileCoord};
use crate::tile::TileDescriptor;

use super::options::TileLayerOptions;
use super::parser::UrlTemplate;
use super::TemplateError;

/// Derives storage keys, fetch URLs and descriptor grids for a layer.
///
/// The storage key of a tile is rendered with the first subdomain; the
/// fetch URL with the subdomain picked by `(x + y) mod len`. The key is
/// thus stable across subdomain rotation.
#[derive(Debug, Clone)]
pub struct TileUrlDeriver {
    template: UrlTemplate,
    options: TileLayerOptions,
}

impl TileUrlDeriver {
    pub fn new(template: &str, options: TileLayerOptions) -> Result<Self, TemplateError> {
        if options.tile_size == 0 {
            return Err(TemplateError::InvalidTileSize);
        }
        let template = UrlTemplate::parse(template, &options)?;
        Ok(Self { template, options })
    }

    /// The template string, which identifies the layer in the store.
    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    pub fn options(&self) -> &TileLayerOptions {
        &self.options
    }

    pub fn tile_size(&self) -> u32 {
        self.options.tile_size
    }

    /// Subdomain the tile is downloaded from. Empty when none are configured.
    pub fn subdomain_for(&self, coord: &TileCoord) -> &str {
        let subdomains = &self.options.subdomains;
        if subdomains.is_empty() {
            return "";
        }
        let index = (coord.x as u64 + coord.y as u64) % subdomains.len() as u64;
        &subdomains[index as usize]
    }

    /// Key under which the tile is stored.
    pub fn storage_key(&self, coord: &TileCoord) -> String {
        let first = self
            .options
            .subdomains
            .first()
            .map(String::as_str)
            .unwrap_or("");
        self.template.render(coord, first, &self.options)
    }

    /// URL the tile is fetched from.
    pub fn tile_url(&self, coord: &TileCoord) -> String {
        self.template
            .render(coord, self.subdomain_for(coord), &self.options)
    }

    /// Full descriptor of one tile.
    pub fn descriptor(&self, coord: &TileCoord) -> TileDescriptor {
        TileDescriptor {
            key: self.storage_key(coord),
            url: self.tile_url(coord),
            url_template: self.template().to_string(),
            x: coord.x,
            y: coord.y,
            z: coord.z,
        }
    }

    /// Descriptors of every tile covering `bounds` at `zoom`.
    ///
    /// Edges are inclusive. Rows are the outer loop and columns the inner
    /// one, so the list reads north to south, west to east.
    pub fn tile_descriptors(&self, bounds: &PixelBounds, zoom: u8) -> Vec<TileDescriptor> {
        let range = bounds.tile_range(zoom, self.options.tile_size);
        let mut descriptors = Vec::with_capacity(range.len().min(1 << 20) as usize);
        descriptors.extend(range.iter().map(|coord| self.descriptor(&coord)));
        descriptors
    }

    /// Number of parallel downloads the layer supports: one per subdomain.
    pub fn simultaneous(&self) -> usize {
        self.options.subdomains.len().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{project_bounds, LatLng, LatLngBounds, PixelPoint};
    use proptest::prelude::*;
    use std::collections::HashSet;

    const OSM: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

    fn deriver() -> TileUrlDeriver {
        TileUrlDeriver::new(OSM, TileLayerOptions::default()).unwrap()
    }

    #[test]
    fn test_subdomain_rotation() {
        let d = deriver();
        assert_eq!(d.subdomain_for(&TileCoord::new(0, 0, 1)), "a");
        assert_eq!(d.subdomain_for(&TileCoord::new(1, 0, 1)), "b");
        assert_eq!(d.subdomain_for(&TileCoord::new(1, 1, 1)), "c");
        assert_eq!(d.subdomain_for(&TileCoord::new(2, 1, 2)), "a");
    }

    #[test]
    fn test_key_uses_first_subdomain() {
        let d = deriver();
        let coord = TileCoord::new(16, 10, 5);
        assert_eq!(
            d.storage_key(&coord),
            "https://a.tile.openstreetmap.org/5/16/10.png"
        );
        assert_eq!(d.tile_url(&coord), "https://c.tile.openstreetmap.org/5/16/10.png");
    }

    #[test]
    fn test_empty_subdomains() {
        let options = TileLayerOptions::default().with_subdomains(Vec::<String>::new());
        let d = TileUrlDeriver::new("https://tiles{s}.example.org/{z}/{x}/{y}.png", options).unwrap();
        let coord = TileCoord::new(3, 4, 5);
        assert_eq!(d.storage_key(&coord), "https://tiles.example.org/5/3/4.png");
        assert_eq!(d.tile_url(&coord), d.storage_key(&coord));
        assert_eq!(d.simultaneous(), 1);
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let options = TileLayerOptions::default().with_tile_size(0);
        assert_eq!(
            TileUrlDeriver::new(OSM, options).unwrap_err(),
            TemplateError::InvalidTileSize
        );
    }

    #[test]
    fn test_simultaneous_is_subdomain_count() {
        assert_eq!(deriver().simultaneous(), 3);
        let d = TileUrlDeriver::new(
            OSM,
            TileLayerOptions::default().with_subdomain_chars("1234"),
        )
        .unwrap();
        assert_eq!(d.simultaneous(), 4);
    }

    #[test]
    fn test_descriptors_row_major_inclusive() {
        let d = deriver();
        // Pixel bounds spanning tiles x 1..=2, y 3..=4 at 256px
        let bounds = PixelBounds::from_corners(
            PixelPoint::new(256.0, 768.0),
            PixelPoint::new(767.0, 1279.0),
        );
        let tiles = d.tile_descriptors(&bounds, 4);
        let coords: Vec<_> = tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(coords, vec![(1, 3), (2, 3), (1, 4), (2, 4)]);
        assert!(tiles.iter().all(|t| t.z == 4 && t.url_template == OSM));
    }

    #[test]
    fn test_descriptors_for_geographic_area() {
        let d = deriver();
        let bounds = LatLngBounds::new(LatLng::new(52.35, 4.85), LatLng::new(52.38, 4.92)).unwrap();
        let tiles = d.tile_descriptors(&project_bounds(&bounds, 12), 12);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.key.starts_with("https://a.")));
    }

    #[test]
    fn test_descriptors_divide_by_layer_tile_size() {
        let d = TileUrlDeriver::new(OSM, TileLayerOptions::default().with_tile_size(512)).unwrap();
        let bounds = PixelBounds::from_corners(PixelPoint::new(0.0, 0.0), PixelPoint::new(1023.0, 511.0));
        let tiles = d.tile_descriptors(&bounds, 2);
        let coords: Vec<_> = tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0)]);
    }

    proptest! {
        #[test]
        fn prop_key_independent_of_subdomain_choice(
            x in 0u32..1024,
            y in 0u32..1024,
            rotate in 0usize..3,
        ) {
            let coord = TileCoord::new(x, y, 10);
            let base = deriver();

            let mut subdomains = vec!["a".to_string(), "b".to_string(), "c".to_string()];
            subdomains[1..].rotate_left(rotate % 2);
            let shuffled = TileUrlDeriver::new(
                OSM,
                TileLayerOptions::default().with_subdomains(subdomains),
            ).unwrap();

            prop_assert_eq!(base.storage_key(&coord), shuffled.storage_key(&coord));
            let expected = format!("https://{}.tile.openstreetmap.org/10/{}/{}.png",
                base.subdomain_for(&coord), x, y);
            prop_assert_eq!(base.tile_url(&coord), expected);
        }

        #[test]
        fn prop_descriptor_grid_complete_and_unique(
            x0 in 0.0f64..2000.0,
            y0 in 0.0f64..2000.0,
            w in 0.0f64..1500.0,
            h in 0.0f64..1500.0,
        ) {
            let d = deriver();
            let bounds = PixelBounds::from_corners(
                PixelPoint::new(x0, y0),
                PixelPoint::new(x0 + w, y0 + h),
            );
            let tiles = d.tile_descriptors(&bounds, 4);

            let cols = ((x0 + w) / 256.0).floor() as usize - (x0 / 256.0).floor() as usize + 1;
            let rows = ((y0 + h) / 256.0).floor() as usize - (y0 / 256.0).floor() as usize + 1;
            prop_assert_eq!(tiles.len(), cols * rows);

            let keys: HashSet<_> = tiles.iter().map(|t| t.key.clone()).collect();
            prop_assert_eq!(keys.len(), tiles.len());
        }
    }
}
