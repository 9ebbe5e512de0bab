//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! CRS pixel space and slippy map tile coordinates (spherical Web Mercator).

mod types;

pub use types::{
    world_tiles, CoordError, LatLng, LatLngBounds, PixelBounds, PixelPoint, TileCoord, TileRange,
    CRS_TILE_SIZE, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Scale of the whole world in CRS pixels at `zoom`.
#[inline]
fn crs_scale(zoom: u8) -> f64 {
    CRS_TILE_SIZE as f64 * 2.0_f64.powi(zoom as i32)
}

/// Projects a geographic position to CRS pixel coordinates at `zoom`.
///
/// Latitude is clamped to the Web Mercator range, so the poles project onto
/// the top and bottom world edges instead of infinity.
#[inline]
pub fn project(latlng: LatLng, zoom: u8) -> PixelPoint {
    let scale = crs_scale(zoom);
    let lat = latlng.lat.clamp(MIN_LAT, MAX_LAT);
    let lat_rad = lat * PI / 180.0;

    let x = scale * (latlng.lng + 180.0) / 360.0;
    let y = scale * (1.0 - lat_rad.tan().asinh() / PI) / 2.0;

    PixelPoint::new(x, y)
}

/// Inverse of [`project`].
#[inline]
pub fn unproject(point: PixelPoint, zoom: u8) -> LatLng {
    let scale = crs_scale(zoom);

    let lng = point.x / scale * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * point.y / scale)).sinh().atan();

    LatLng::new(lat_rad * 180.0 / PI, lng)
}

/// Pixel bounds of a geographic rectangle at `zoom`, built from the
/// north-west and south-east corners.
pub fn project_bounds(bounds: &LatLngBounds, zoom: u8) -> PixelBounds {
    PixelBounds::from_corners(
        project(bounds.north_west(), zoom),
        project(bounds.south_east(), zoom),
    )
}

/// Converts geographic coordinates to the 256px tile containing them.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.0511287798 to 85.0511287798)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 30)
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(CoordError::NonFinite);
    }
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let point = project(LatLng::new(lat, lon), zoom);
    let range = PixelBounds::from_corners(point, point).tile_range(zoom, CRS_TILE_SIZE);

    Ok(TileCoord::new(range.min_x, range.min_y, zoom))
}

/// Returns the latitude/longitude of a tile's north-west corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord, tile_size: u32) -> LatLng {
    let point = PixelPoint::new(
        tile.x as f64 * tile_size as f64,
        tile.y as f64 * tile_size as f64,
    );
    unproject(point, tile.z)
}

/// Closed polygon ring of a tile as `[lng, lat]` pairs.
///
/// Order: north-west, north-east, south-east, south-west, north-west.
pub fn tile_polygon(tile: &TileCoord, tile_size: u32) -> [[f64; 2]; 5] {
    let size = tile_size as f64;
    let top_left = PixelPoint::new(tile.x as f64 * size, tile.y as f64 * size);
    let bottom_right = PixelPoint::new(top_left.x + size, top_left.y + size);

    let nw = unproject(top_left, tile.z);
    let se = unproject(bottom_right, tile.z);

    [
        [nw.lng, nw.lat],
        [se.lng, nw.lat],
        [se.lng, se.lat],
        [nw.lng, se.lat],
        [nw.lng, nw.lat],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let result = to_tile_coords(40.7128, -74.0060, 16);
        assert!(result.is_ok(), "Valid coordinates should not error");

        let tile = result.unwrap();
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.z, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile_coords(0.0, 0.0, 31);
        assert!(matches!(result, Err(CoordError::InvalidZoom(31))));
    }

    #[test]
    fn test_project_origin_is_world_center() {
        let p = project(LatLng::new(0.0, 0.0), 0);
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_clamps_poles() {
        let north = project(LatLng::new(90.0, 0.0), 3);
        let south = project(LatLng::new(-90.0, 0.0), 3);
        assert!(north.y.abs() < 1e-6);
        assert!((south.y - 2048.0).abs() < 1e-6);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let original = LatLng::new(52.3676, 4.9041);
        let back = unproject(project(original, 12), 12);
        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lng - original.lng).abs() < 1e-9);
    }

    #[test]
    fn test_tile_to_lat_lon_northwest_corner() {
        let tile = TileCoord::new(19295, 24640, 16);
        let nw = tile_to_lat_lon(&tile, 256);

        assert!((nw.lat - 40.713).abs() < 0.01);
        assert!((nw.lng - (-74.007)).abs() < 0.01);
    }

    #[test]
    fn test_tile_to_lat_lon_at_equator() {
        let tile = TileCoord::new(512, 512, 10);
        let nw = tile_to_lat_lon(&tile, 256);

        assert!(nw.lat.abs() < 1e-9, "Should be on the equator");
        assert!(nw.lng.abs() < 1e-9, "Should be on the prime meridian");
    }

    #[test]
    fn test_tile_polygon_is_closed() {
        let ring = tile_polygon(&TileCoord::new(1, 1, 2), 256);
        assert_eq!(ring[0], ring[4]);
        // West edge left of east edge, north edge above south edge
        assert!(ring[0][0] < ring[1][0]);
        assert!(ring[0][1] > ring[2][1]);
    }

    #[test]
    fn test_project_bounds_orders_corners() {
        let bounds = LatLngBounds::new(LatLng::new(10.0, 20.0), LatLng::new(-10.0, -20.0)).unwrap();
        let px = project_bounds(&bounds, 4);
        assert!(px.min.x < px.max.x);
        assert!(px.min.y < px.max.y);
    }

    #[test]
    fn test_tile_range_clamps_world_edge() {
        let bounds = LatLngBounds::new(LatLng::new(-85.0, -180.0), LatLng::new(85.0, 180.0)).unwrap();
        let range = project_bounds(&bounds, 2).tile_range(2, 256);
        assert_eq!((range.min_x, range.max_x), (0, 3));
        assert_eq!((range.min_y, range.max_y), (0, 3));
        assert_eq!(range.len(), 16);
    }

    #[test]
    fn test_tile_range_for_larger_tiles() {
        let bounds = LatLngBounds::new(LatLng::new(-85.0, -180.0), LatLng::new(85.0, 180.0)).unwrap();
        let range = project_bounds(&bounds, 2).tile_range(2, 512);
        assert_eq!(range.max_x, 1);
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_tile_range_iter_row_major() {
        let range = TileRange {
            min_x: 3,
            min_y: 7,
            max_x: 4,
            max_y: 8,
            zoom: 5,
        };
        let tiles: Vec<_> = range.iter().collect();
        assert_eq!(
            tiles,
            vec![
                TileCoord::new(3, 7, 5),
                TileCoord::new(4, 7, 5),
                TileCoord::new(3, 8, 5),
                TileCoord::new(4, 8, 5),
            ]
        );
    }

    #[test]
    fn test_bounds_from_str() {
        let bounds: LatLngBounds = "52.3, 4.8, 52.4, 4.95".parse().unwrap();
        assert_eq!(bounds.south_west(), LatLng::new(52.3, 4.8));
        assert_eq!(bounds.north_east(), LatLng::new(52.4, 4.95));
        assert!(bounds.contains(LatLng::new(52.35, 4.9)));
    }

    #[test]
    fn test_bounds_from_str_rejects_garbage() {
        assert!(matches!(
            "1,2,3".parse::<LatLngBounds>(),
            Err(CoordError::InvalidBounds(_))
        ));
        assert!(matches!(
            "a,b,c,d".parse::<LatLngBounds>(),
            Err(CoordError::InvalidBounds(_))
        ));
    }

    #[test]
    fn test_inverted_y() {
        let tile = TileCoord::new(0, 0, 3);
        assert_eq!(tile.inverted_y(256), 7);
    }
}
