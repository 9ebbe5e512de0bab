//! CLI command implementations.
//!
//! - [`init`] - Configuration initialization
//! - [`save`] - Bulk save of an area
//! - [`remove`] - Removal of all or one stored tile
//! - [`tiles`] - Stats, listing and single-tile retrieval
//! - [`serve`] - HTTP tile server

pub mod common;
pub mod init;
pub mod remove;
pub mod save;
pub mod serve;
pub mod tiles;
