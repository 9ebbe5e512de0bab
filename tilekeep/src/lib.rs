//! Tilekeep - offline caching for slippy-map tile layers
//!
//! Tiles of a web map layer are addressed by a URL template. Tilekeep
//! downloads the tiles covering an area over a range of zoom levels, keeps
//! them in a persistent store keyed by a subdomain-independent URL, and
//! serves them back to the map instead of the network.
//!
//! - [`template`] derives storage keys and download URLs from a template
//! - [`store`] persists tile blobs and their descriptors
//! - [`provider`] fetches tiles over HTTP
//! - [`layer`] resolves a tile to stored bytes or its online URL
//! - [`control`] runs bulk save and remove operations with progress events
//! - [`app`] wires everything from an [`app::AppConfig`]

pub mod app;
pub mod cache;
pub mod config;
pub mod control;
pub mod coord;
pub mod layer;
pub mod logging;
pub mod provider;
#[cfg(feature = "tile-server")]
pub mod server;
pub mod store;
pub mod template;
pub mod tile;
