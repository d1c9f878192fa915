use super::chunk_map::{ObjectPlacement, SpritePlacement};
use crate::tiles::{ChunkPos, TileKind};
use bevy::math::Vec3;
use std::fmt;
use std::future::Future;

/// One tile cell to place
#[derive(Debug, Clone, PartialEq)]
pub struct TileSpawn {
    pub chunk: ChunkPos,
    pub tag: String,
    pub kind: TileKind,
    /// Local cell inside the chunk
    pub local_x: usize,
    pub local_y: usize,
    pub height: i32,
}

impl TileSpawn {
    /// World position of the cell's corner; local y runs along world z
    pub fn world_position(&self, chunk_world_size: f32) -> Vec3 {
        let origin = self.chunk.to_world(chunk_world_size);
        Vec3::new(
            origin.x + self.local_x as f32,
            self.height as f32,
            origin.y + self.local_y as f32,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    Tile(TileSpawn),
    Object {
        chunk: ChunkPos,
        placement: ObjectPlacement,
    },
    Sprite {
        chunk: ChunkPos,
        placement: SpritePlacement,
    },
}

impl SpawnRequest {
    pub fn chunk(&self) -> ChunkPos {
        match self {
            SpawnRequest::Tile(tile) => tile.chunk,
            SpawnRequest::Object { chunk, .. } | SpawnRequest::Sprite { chunk, .. } => *chunk,
        }
    }
}

/// Error reported by a factory while producing an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileFactoryError {
    AssetLoad { asset: String, reason: String },
    Unsupported(String),
}

impl fmt::Display for TileFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileFactoryError::AssetLoad { asset, reason } => {
                write!(f, "Failed to load asset {}: {}", asset, reason)
            }
            TileFactoryError::Unsupported(what) => write!(f, "Unsupported request: {}", what),
        }
    }
}

impl std::error::Error for TileFactoryError {}

/// Produces scene entities for chunk contents.
///
/// Builders describe every piece a chunk needs as a [`SpawnRequest`]. The
/// factory owns asset loading and scene state; the streaming cache only holds
/// the opaque entities it gets back and hands them to [`TileFactory::release`].
///
/// `produce_entity` may suspend (asset loads); it runs on the async compute
/// pool, never on the tick thread. `release` is called on the tick thread
/// once for every entity the cache receives. Builds still running when a cache
/// is dropped without [`clear`](crate::world::StreamingCache::clear) are
/// detached, and their entities are dropped without a `release`.
pub trait TileFactory: Send + Sync + 'static {
    type Entity: Send + Sync + 'static;

    fn produce_entity(
        &self,
        request: SpawnRequest,
    ) -> impl Future<Output = Result<Self::Entity, TileFactoryError>> + Send;

    fn release(&self, entity: Self::Entity);
}
