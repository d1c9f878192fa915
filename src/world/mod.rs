pub mod builder;
pub mod chunk_map;
pub mod config;
pub mod factory;
pub mod serialization;
pub mod store;
pub mod streaming;

// Re-export commonly used items
pub use builder::{build_chunk, plan_spawns, BuildError, BuildOutcome, BuiltChunk};
pub use chunk_map::{ChunkLayout, ChunkMap, ChunkMapEntry, ObjectPlacement, SpriteAnimation, SpritePlacement};
pub use config::StreamingConfig;
pub use factory::{SpawnRequest, TileFactory, TileFactoryError, TileSpawn};
pub use serialization::ChunkDataError;
pub use store::ChunkStore;
pub use streaming::{SlotState, StreamingCache, StreamingStats, WindowChange};
