use super::chunk::TileGrid;
use super::codec::RunList;
use super::constants::CHUNK_SIZE;

/// A full 256-cell chunk: tree rows, a raised mountain ring, a path strip and grass.
pub const MEADOW_JSON: &str = r#"[
    16, "none",
    1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none",
    1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none",
    16, "none",
    1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none",
    1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none", 1, "tree", 1, "none",
    2, "grass", 12, "mount_d", 2, "grass",
    1, "grass", 1, "mount_l", [2, 1], "grass", 2, "none",
    [1, 1], "grass", [6, 1], "mount_d", [1, 1], "grass", 1, "mount_r", 1, "grass",
    1, "grass", 1, "mount_l", [2, 1], "grass", [1, 1], "tree", 1, "none",
    [1, 1], "mount_l", [6, 2], "grass", [1, 1], "mount_r", 1, "mount_r", 1, "grass",
    1, "grass", 1, "mount_l", [5, 1], "grass",
    [6, 1], "mount_u", [1, 1], "grass", 1, "mount_r", 1, "grass",
    2, "grass", 12, "mount_u", 2, "grass",
    1, "path_ul", 14, "path_u", 1, "path_ur",
    1, "path_l", 14, "path", 1, "path_r",
    1, "path_l", 14, "path", 1, "path_r",
    1, "path_dl", 14, "path_d", 1, "path_dr",
    48, "grass"
]"#;

pub fn meadow_runs() -> RunList {
    serde_json::from_str(MEADOW_JSON).expect("meadow fixture parses")
}

/// Deterministic pseudo-random grid over a handful of tags and heights
pub fn scrambled_grid(seed: u32) -> TileGrid {
    const TAGS: [&str; 4] = ["grass", "path", "tree", "none"];
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let mut grid = TileGrid::empty();
    for y in 0..CHUNK_SIZE as i32 {
        for x in 0..CHUNK_SIZE as i32 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let tag = TAGS[((state >> 16) % 4) as usize];
            let height = ((state >> 20) % 3) as i32;
            grid.set_tile(x, y, tag, height);
        }
    }
    grid
}
