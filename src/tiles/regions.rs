use super::chunk::TileGrid;
use super::constants::CHUNK_SIZE;

/// Axis-aligned rectangle of one tile type inside a chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub tile: String,
}

impl Region {
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Local cells covered by the rectangle, row by row
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| (x, y)))
    }
}

/// Partition the cells bearing `tile` into rectangles.
///
/// Rectangles grow from the first unvisited matching cell in row-major order,
/// first down the start column and then right along every covered row. The
/// width is the widest of those rows, and every cell inside the rectangle is
/// marked visited whether or not it matches, so a rectangle may swallow other
/// tiles and overlap an earlier one. Consumers rely on this exact partition.
pub fn find_connected_regions(grid: &TileGrid, tile: &str) -> Vec<Region> {
    let mut visited = [[false; CHUNK_SIZE]; CHUNK_SIZE];
    let mut regions = Vec::new();

    for y in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            if visited[y][x] || !grid.tile_matches(x, y, tile) {
                continue;
            }
            regions.push(expand_region(grid, x, y, tile, &mut visited));
        }
    }

    regions
}

fn expand_region(
    grid: &TileGrid,
    start_x: usize,
    start_y: usize,
    tile: &str,
    visited: &mut [[bool; CHUNK_SIZE]; CHUNK_SIZE],
) -> Region {
    let height = (start_y..CHUNK_SIZE)
        .take_while(|&y| grid.tile_matches(start_x, y, tile))
        .count();

    let width = (start_y..start_y + height)
        .map(|y| {
            (start_x..CHUNK_SIZE)
                .take_while(|&x| grid.tile_matches(x, y, tile))
                .count()
        })
        .max()
        .unwrap_or(0);

    for row in &mut visited[start_y..start_y + height] {
        for cell in &mut row[start_x..start_x + width] {
            *cell = true;
        }
    }

    Region {
        x: start_x,
        y: start_y,
        width,
        height,
        tile: tile.to_string(),
    }
}
