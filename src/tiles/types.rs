use bevy::math::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Chunk position in chunk coordinates (not world/tile coordinates).
/// `z` follows the world's depth axis, which is the row index of the chunk map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Convert from a world-space position on the ground plane to chunk position
    pub fn from_world(world_x: f32, world_z: f32, chunk_world_size: f32) -> Self {
        Self {
            x: (world_x / chunk_world_size).floor() as i32,
            z: (world_z / chunk_world_size).floor() as i32,
        }
    }

    /// Get world position of the chunk's origin corner, as (x, z)
    pub fn to_world(&self, chunk_world_size: f32) -> Vec2 {
        Vec2::new(
            self.x as f32 * chunk_world_size,
            self.z as f32 * chunk_world_size,
        )
    }

    /// Get all chunks in a square radius around this chunk, row by row
    pub fn chunks_in_radius(&self, radius: i32) -> Vec<ChunkPos> {
        let radius = radius.max(0);
        let side = 2 * radius as usize + 1;
        let mut chunks = Vec::with_capacity(side * side);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                chunks.push(ChunkPos::new(self.x + dx, self.z + dz));
            }
        }
        chunks
    }

    /// Chebyshev distance (square/max distance) between two chunk positions.
    /// A chunk is inside a window of radius `r` iff this distance is at most `r`.
    pub fn chebyshev_distance(&self, other: &ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl std::fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from((x, z): (i32, i32)) -> Self {
        Self::new(x, z)
    }
}

impl From<IVec2> for ChunkPos {
    fn from(v: IVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<ChunkPos> for IVec2 {
    fn from(pos: ChunkPos) -> Self {
        IVec2::new(pos.x, pos.z)
    }
}
