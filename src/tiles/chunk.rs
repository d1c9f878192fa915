use super::constants::*;
use bevy::log::warn;

/// One cell of a chunk: a tile tag plus its terrain height
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileCell {
    pub tile: String,
    pub height: i32,
}

impl TileCell {
    pub fn new(tile: impl Into<String>, height: i32) -> Self {
        Self {
            tile: tile.into(),
            height,
        }
    }

    /// The sentinel cell ("none", height 0)
    pub fn none() -> Self {
        Self::new(TILE_NONE, 0)
    }

    pub fn is_none(&self) -> bool {
        self.tile == TILE_NONE
    }
}

impl Default for TileCell {
    fn default() -> Self {
        Self::none()
    }
}

/// Decoded chunk terrain: a fixed 16x16 grid stored row-major.
///
/// The cell vector is private so the grid can never be anything but
/// `CHUNK_AREA` cells long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    cells: Vec<TileCell>,
}

impl TileGrid {
    /// Create a grid with every cell set to the sentinel tile
    pub fn empty() -> Self {
        Self::filled(TILE_NONE, 0)
    }

    /// Create a grid with every cell set to `tile` at `height`
    pub fn filled(tile: &str, height: i32) -> Self {
        Self {
            cells: vec![TileCell::new(tile, height); CHUNK_AREA],
        }
    }

    /// Row-major index of a local cell
    pub const fn index(x: usize, y: usize) -> usize {
        y * CHUNK_SIZE + x
    }

    /// Borrow a cell at local coordinates (0-15, 0-15)
    pub fn cell(&self, x: usize, y: usize) -> Option<&TileCell> {
        if x >= CHUNK_SIZE || y >= CHUNK_SIZE {
            return None;
        }
        self.cells.get(Self::index(x, y))
    }

    /// Get the tile at local coordinates.
    /// Reads outside the grid return the sentinel tile at height 0.
    pub fn get_tile(&self, x: i32, y: i32) -> TileCell {
        match local_index(x, y) {
            Some((x, y)) => self.cells[Self::index(x, y)].clone(),
            None => TileCell::none(),
        }
    }

    /// Set the tile at local coordinates.
    /// Writes outside the grid are ignored with a warning; returns whether the write happened.
    pub fn set_tile(&mut self, x: i32, y: i32, tile: &str, height: i32) -> bool {
        let Some((x, y)) = local_index(x, y) else {
            warn!("Attempted to set tile outside grid bounds: ({}, {})", x, y);
            return false;
        };
        self.cells[Self::index(x, y)] = TileCell::new(tile, height);
        true
    }

    /// Whether the cell at local coordinates carries `tile`
    pub fn tile_matches(&self, x: usize, y: usize, tile: &str) -> bool {
        self.cell(x, y).is_some_and(|cell| cell.tile == tile)
    }

    /// Overwrite the cell at a row-major index. Callers guarantee `index < CHUNK_AREA`.
    pub(crate) fn place(&mut self, index: usize, tile: &str, height: i32) {
        let cell = &mut self.cells[index];
        if cell.tile != tile {
            cell.tile = tile.to_string();
        }
        cell.height = height;
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[TileCell] {
        &self.cells
    }

    /// Distinct non-sentinel tile tags, in first-seen row-major order
    pub fn tile_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for cell in &self.cells {
            if !cell.is_none() && !types.contains(&cell.tile.as_str()) {
                types.push(cell.tile.as_str());
            }
        }
        types
    }

    /// Render the grid as rows of debug symbols (one row per line)
    pub fn ascii(&self) -> String {
        let mut out = String::with_capacity(CHUNK_AREA * 3);
        for row in self.cells.chunks(CHUNK_SIZE) {
            let symbols: Vec<String> = row.iter().map(tile_symbol).collect();
            out.push_str(&symbols.join(" "));
            out.push('\n');
        }
        out
    }
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::empty()
    }
}

fn local_index(x: i32, y: i32) -> Option<(usize, usize)> {
    if x < 0 || y < 0 || x >= CHUNK_SIZE_I32 || y >= CHUNK_SIZE_I32 {
        return None;
    }
    Some((x as usize, y as usize))
}

fn tile_symbol(cell: &TileCell) -> String {
    let symbol = match cell.tile.as_str() {
        "grass" if cell.height > 0 => return format!("G{}", cell.height),
        "grass" => "g",
        "tree" => "T",
        "path" => "P",
        "path_u" => "U",
        "path_d" => "D",
        "path_l" => "L",
        "path_r" => "R",
        "path_ul" => "1",
        "path_ur" => "2",
        "path_dl" => "3",
        "path_dr" => "4",
        "mount_u" => "M",
        "mount_d" => "m",
        "mount_l" => "<",
        "mount_r" => ">",
        TILE_NONE => ".",
        _ => "?",
    };
    symbol.to_string()
}

/// Helper functions for tile coordinate conversions
pub mod coords {
    use super::*;

    /// Convert a world position on the ground plane to the local tile within its chunk (0-15, 0-15)
    pub fn world_to_local_tile(world_x: f32, world_z: f32) -> (usize, usize) {
        let tile_x = world_x.floor() as i32;
        let tile_z = world_z.floor() as i32;
        let local_x = tile_x.rem_euclid(CHUNK_SIZE_I32) as usize;
        let local_z = tile_z.rem_euclid(CHUNK_SIZE_I32) as usize;
        (local_x, local_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_get_set() {
        let mut grid = TileGrid::empty();
        assert_eq!(grid.cells().len(), CHUNK_AREA);

        assert!(grid.set_tile(5, 10, "grass", 2));
        assert_eq!(grid.get_tile(5, 10), TileCell::new("grass", 2));
        assert_eq!(grid.cell(5, 10).map(|c| c.height), Some(2));

        // Out of bounds reads return the sentinel
        assert_eq!(grid.get_tile(16, 0), TileCell::none());
        assert_eq!(grid.get_tile(-1, 3), TileCell::none());
        assert_eq!(grid.cell(0, 16), None);

        // Out of bounds writes are no-ops
        assert!(!grid.set_tile(0, 16, "tree", 0));
        assert!(!grid.set_tile(-1, 0, "tree", 0));
        assert!(grid.cells().iter().all(|c| c.tile != "tree"));
    }

    #[test]
    fn test_tile_types_first_seen_order() {
        let mut grid = TileGrid::empty();
        grid.set_tile(3, 0, "path", 0);
        grid.set_tile(0, 1, "grass", 0);
        grid.set_tile(1, 1, "path", 0);
        grid.set_tile(15, 15, "tree", 0);
        assert_eq!(grid.tile_types(), vec!["path", "grass", "tree"]);
        assert!(TileGrid::empty().tile_types().is_empty());
    }

    #[test]
    fn test_ascii_symbols() {
        let mut grid = TileGrid::empty();
        grid.set_tile(0, 0, "grass", 0);
        grid.set_tile(1, 0, "grass", 1);
        grid.set_tile(2, 0, "tree", 0);
        grid.set_tile(3, 0, "lava", 0);
        let ascii = grid.ascii();
        let first_row = ascii.lines().next().unwrap_or_default();
        assert!(first_row.starts_with("g G1 T ? . "));
        assert_eq!(ascii.lines().count(), CHUNK_SIZE);
    }

    #[test]
    fn test_world_to_local_tile() {
        assert_eq!(coords::world_to_local_tile(20.5, 3.0), (4, 3));

        // Negative positions wrap into the previous chunk
        assert_eq!(coords::world_to_local_tile(-0.5, -1.0), (15, 15));
    }
}
