/// Size of each chunk in tiles (width and height)
pub const CHUNK_SIZE: usize = 16;

/// Total number of tiles in a chunk
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE; // 256 tiles

/// Size of each chunk as i32 for coordinate calculations
pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;

/// Edge length of a chunk in world units (one tile = one world unit)
pub const CHUNK_WORLD_SIZE: f32 = CHUNK_SIZE as f32;

/// Tileset image is an 8x8 grid of tile cells
pub const TILESET_SIZE: f32 = 8.0;

/// Sentinel tag for empty cells
pub const TILE_NONE: &str = "none";

/// Sentinel chunk name in the chunk map for "no terrain here"
pub const EMPTY_CHUNK: &str = "empty_chunk";

/// Radius of chunks to keep materialized around the focal chunk (7x7 = 49 chunks)
pub const CHUNK_LOAD_RADIUS: i32 = 3;
