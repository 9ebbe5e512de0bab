//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.0511287798;
pub const MAX_LAT: f64 = 85.0511287798;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported zoom range
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 30;

/// Pixel size of one tile in the reference CRS.
///
/// Projection always scales by `256 * 2^zoom`; layers with a different
/// tile size divide pixel bounds by their own size.
pub const CRS_TILE_SIZE: u32 = 256;

/// Tile coordinates in the slippy map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column (east-west), 0 at the antimeridian
    pub x: u32,
    /// Row (north-south), 0 at the north edge
    pub y: u32,
    /// Zoom level
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Row counted from the south edge (TMS numbering).
    #[inline]
    pub fn inverted_y(&self, tile_size: u32) -> u32 {
        world_tiles(self.z, tile_size)
            .saturating_sub(1)
            .saturating_sub(self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom` for a layer with `tile_size`.
#[inline]
pub fn world_tiles(zoom: u8, tile_size: u32) -> u32 {
    let world_px = (CRS_TILE_SIZE as u64) << zoom.min(MAX_ZOOM);
    let tiles = world_px / tile_size.max(1) as u64;
    tiles.clamp(1, u32::MAX as u64) as u32
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geographic rectangle.
///
/// Corners are normalized on construction so `south_west` always holds the
/// minimum latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    south_west: LatLng,
    north_east: LatLng,
}

impl LatLngBounds {
    /// Build bounds from any two opposite corners.
    pub fn new(a: LatLng, b: LatLng) -> Result<Self, CoordError> {
        for p in [a, b] {
            if !p.lat.is_finite() || !p.lng.is_finite() {
                return Err(CoordError::NonFinite);
            }
        }
        Ok(Self {
            south_west: LatLng::new(a.lat.min(b.lat), a.lng.min(b.lng)),
            north_east: LatLng::new(a.lat.max(b.lat), a.lng.max(b.lng)),
        })
    }

    pub fn south_west(&self) -> LatLng {
        self.south_west
    }

    pub fn north_east(&self) -> LatLng {
        self.north_east
    }

    pub fn north_west(&self) -> LatLng {
        LatLng::new(self.north_east.lat, self.south_west.lng)
    }

    pub fn south_east(&self) -> LatLng {
        LatLng::new(self.south_west.lat, self.north_east.lng)
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&p.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&p.lng)
    }
}

impl fmt::Display for LatLngBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.south_west.lat, self.south_west.lng, self.north_east.lat, self.north_east.lng
        )
    }
}

/// Parses `south,west,north,east` in degrees.
impl FromStr for LatLngBounds {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| CoordError::InvalidBounds(s.to_string()))?;

        match parts.as_slice() {
            [south, west, north, east] => Self::new(
                LatLng::new(*south, *west),
                LatLng::new(*north, *east),
            ),
            _ => Err(CoordError::InvalidBounds(s.to_string())),
        }
    }
}

/// Point in CRS pixel space at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBounds {
    pub min: PixelPoint,
    pub max: PixelPoint,
}

impl PixelBounds {
    /// Smallest bounds containing both points.
    pub fn from_corners(a: PixelPoint, b: PixelPoint) -> Self {
        Self {
            min: PixelPoint::new(a.x.min(b.x), a.y.min(b.y)),
            max: PixelPoint::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Tiles covering these bounds, edges inclusive.
    ///
    /// Divides by `tile_size` and floors, then clamps into the tile grid so
    /// a corner sitting exactly on the east or south world edge does not
    /// produce a tile outside the world.
    pub fn tile_range(&self, zoom: u8, tile_size: u32) -> TileRange {
        let size = tile_size.max(1) as f64;
        let last = world_tiles(zoom, tile_size) - 1;
        let to_index = |v: f64| -> u32 { ((v / size).floor().max(0.0) as u32).min(last) };

        TileRange {
            min_x: to_index(self.min.x),
            min_y: to_index(self.min.y),
            max_x: to_index(self.max.x),
            max_y: to_index(self.max.y),
            zoom,
        }
    }
}

/// Inclusive rectangle of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub zoom: u8,
}

impl TileRange {
    pub fn width(&self) -> u64 {
        (self.max_x - self.min_x) as u64 + 1
    }

    pub fn height(&self) -> u64 {
        (self.max_y - self.min_y) as u64 + 1
    }

    /// Number of tiles in the range.
    pub fn len(&self) -> u64 {
        self.width() * self.height()
    }

    /// A range always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate tiles row by row (north to south, west to east).
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.min_y..=self.max_y)
            .flat_map(move |y| (self.min_x..=self.max_x).map(move |x| TileCoord::new(x, y, self.zoom)))
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -85.0511287798 and 85.0511287798)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (must be between 0 and 30)")]
    InvalidZoom(u8),

    #[error("Coordinates must be finite numbers")]
    NonFinite,

    #[error("Invalid bounds '{0}': expected south,west,north,east in degrees")]
    InvalidBounds(String),
}
