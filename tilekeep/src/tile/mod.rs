//! Tile records shared by the deriver, the store and the save orchestrator.

mod descriptor;

pub use descriptor::{StoredTile, TileDescriptor};
