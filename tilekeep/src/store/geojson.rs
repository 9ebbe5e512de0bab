//! GeoJSON export of stored tiles.

use serde_json::{json, Value};

use crate::coord::tile_polygon;
use crate::tile::StoredTile;

/// Build a `FeatureCollection` with one polygon per tile.
///
/// Each feature carries the stored descriptor as its `properties`.
pub fn tiles_to_geojson(tiles: &[StoredTile], tile_size: u32) -> Value {
    let features: Vec<Value> = tiles
        .iter()
        .map(|tile| {
            let ring = tile_polygon(&tile.descriptor.coord(), tile_size);
            json!({
                "type": "Feature",
                "properties": tile,
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [ring],
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
