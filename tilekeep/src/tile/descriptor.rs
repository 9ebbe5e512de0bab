//! Tile descriptor records.
//!
//! A `TileDescriptor` names one tile of one layer: its storage key, the URL
//! it is downloaded from and its coordinates. Once saved it becomes a
//! `StoredTile` carrying the save timestamp.
//!
//! Both serialize to the JSON record kept in the metadata namespace:
//!
//! ```text
//! {"key": "...", "url": "...", "urlTemplate": "...", "x": 1, "y": 2, "z": 3, "createdAt": 1700000000000}
//! ```

use serde::{Deserialize, Serialize};

use crate::coord::TileCoord;

/// Descriptor of a tile that can be downloaded and stored.
///
/// `key` is derived with the first configured subdomain and is therefore the
/// same whichever subdomain `url` points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDescriptor {
    /// Storage key (subdomain-normalized)
    pub key: String,
    /// Resolved fetch URL (subdomain-specific)
    pub url: String,
    /// Template the tile was derived from; identifies the layer
    pub url_template: String,
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileDescriptor {
    /// Coordinates of the tile.
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y, self.z)
    }
}

/// Descriptor persisted alongside a tile blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTile {
    #[serde(flatten)]
    pub descriptor: TileDescriptor,
    /// Save time in milliseconds since the Unix epoch
    pub created_at: i64,
}

impl StoredTile {
    pub fn new(descriptor: TileDescriptor, created_at: i64) -> Self {
        Self {
            descriptor,
            created_at,
        }
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }
}
