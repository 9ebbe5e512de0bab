//! Tile URL templates and storage key derivation.
//!
//! A layer is described by a URL template such as
//! `https://{s}.tile.openstreetmap.org/{z}/{x}/{y}{r}.png` plus a handful of
//! [`TileLayerOptions`]. From these, [`TileUrlDeriver`] produces:
//!
//! - the fetch URL of a tile, using the subdomain picked by rotation
//! - the storage key of a tile, using the first subdomain regardless of
//!   rotation, so a tile downloaded from `b.` is found again when the layer
//!   would have asked `c.`
//! - the descriptors of every tile covering some pixel bounds
//!
//! # Placeholders
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{x}`, `{z}` | tile column, zoom |
//! | `{y}` | tile row (inverted when the layer is TMS) |
//! | `{-y}` | tile row counted from the south edge |
//! | `{s}` | subdomain |
//! | `{r}` | `@2x` on high-DPI layers, otherwise empty |
//! | `{name}` | value of `name` in [`TileLayerOptions::extra`] |
//!
//! Unknown placeholders are rejected when the template is parsed, so
//! rendering never fails.
//!
//! # Example
//!
//! ```
//! use tilekeep::coord::TileCoord;
//! use tilekeep::template::{TileLayerOptions, TileUrlDeriver};
//!
//! let deriver = TileUrlDeriver::new(
//!     "https://{s}.tile.example.org/{z}/{x}/{y}.png",
//!     TileLayerOptions::default(),
//! )
//! .unwrap();
//!
//! let tile = TileCoord::new(1, 2, 3);
//! assert_eq!(deriver.storage_key(&tile), "https://a.tile.example.org/3/1/2.png");
//! assert_eq!(deriver.tile_url(&tile), "https://a.tile.example.org/3/1/2.png");
//!
//! let other = TileCoord::new(2, 2, 3);
//! assert_eq!(deriver.storage_key(&other), "https://a.tile.example.org/3/2/2.png");
//! assert_eq!(deriver.tile_url(&other), "https://b.tile.example.org/3/2/2.png");
//! ```

mod deriver;
mod options;
mod parser;

pub use deriver::TileUrlDeriver;
pub use options::{TileLayerOptions, DEFAULT_SUBDOMAINS, DEFAULT_TILE_SIZE, RETINA_SUFFIX};
pub use parser::{Placeholder, UrlTemplate};

use thiserror::Error;

/// Errors raised while parsing a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template string was empty.
    #[error("URL template is empty")]
    Empty,

    /// A placeholder has no known value.
    #[error("No value provided for placeholder '{{{name}}}' in template '{template}'")]
    UnknownPlaceholder { name: String, template: String },

    /// Tile size must be positive.
    #[error("Tile size must be greater than zero")]
    InvalidTileSize,
}
