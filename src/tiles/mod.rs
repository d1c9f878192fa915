pub mod chunk;
pub mod codec;
pub mod constants;
pub mod regions;
pub mod registry;
pub mod types;

// Shared test data
#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used items
pub use chunk::{TileCell, TileGrid};
pub use codec::{decode, encode, RunEntry, RunList, RunUnit};
pub use constants::*;
pub use regions::{find_connected_regions, Region};
pub use registry::{MountainTile, PlainTile, TileKind, TileRegistry, TilesetUv};
pub use types::ChunkPos;
