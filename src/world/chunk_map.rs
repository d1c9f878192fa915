use crate::tiles::{ChunkPos, EMPTY_CHUNK};
use serde::{Deserialize, Serialize};

/// Object model placed inside a chunk (towers, props)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPlacement {
    #[serde(rename = "type")]
    pub kind: String,
    /// Local position within the chunk (0-15)
    pub x: f32,
    pub y: f32,
    /// Rotation in radians
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteAnimation {
    pub frames: u32,
    pub speed: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
}

/// 2D billboard placed inside a chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpritePlacement {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    /// 0 = background, 1 = mid, 2 = foreground
    #[serde(default)]
    pub layer: u8,
    #[serde(default)]
    pub animation: Option<SpriteAnimation>,
}

/// Terrain reference plus the extra layers a chunk may carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkLayout {
    pub terrain: String,
    #[serde(default)]
    pub objects: Vec<ObjectPlacement>,
    #[serde(default)]
    pub sprites: Vec<SpritePlacement>,
}

/// One chunk map cell: either a bare chunk name or a full layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkMapEntry {
    Name(String),
    Layout(ChunkLayout),
}

impl ChunkMapEntry {
    /// Name of the terrain chunk in the chunk store
    pub fn terrain(&self) -> &str {
        match self {
            ChunkMapEntry::Name(name) => name,
            ChunkMapEntry::Layout(layout) => &layout.terrain,
        }
    }

    pub fn objects(&self) -> &[ObjectPlacement] {
        match self {
            ChunkMapEntry::Name(_) => &[],
            ChunkMapEntry::Layout(layout) => &layout.objects,
        }
    }

    pub fn sprites(&self) -> &[SpritePlacement] {
        match self {
            ChunkMapEntry::Name(_) => &[],
            ChunkMapEntry::Layout(layout) => &layout.sprites,
        }
    }

    /// No terrain to build here
    pub fn is_empty(&self) -> bool {
        let terrain = self.terrain();
        terrain.is_empty() || terrain == EMPTY_CHUNK
    }
}

impl From<&str> for ChunkMapEntry {
    fn from(name: &str) -> Self {
        ChunkMapEntry::Name(name.to_string())
    }
}

/// World layout: a 2D grid of chunk entries, rows = z, columns = x
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkMap {
    rows: Vec<Vec<ChunkMapEntry>>,
}

impl ChunkMap {
    pub fn new(rows: Vec<Vec<ChunkMapEntry>>) -> Self {
        Self { rows }
    }

    /// Build a map of bare chunk names
    pub fn from_names(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|&name| ChunkMapEntry::from(name)).collect())
                .collect(),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Number of chunk rows (z extent)
    pub fn depth(&self) -> usize {
        self.rows.len()
    }

    /// Number of chunk columns (x extent of the first row)
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Whether the position lies on the map at all
    pub fn contains(&self, pos: &ChunkPos) -> bool {
        self.cell(pos).is_some()
    }

    /// The entry to build at `pos`; `None` off the map and for empty chunks
    pub fn entry(&self, pos: &ChunkPos) -> Option<&ChunkMapEntry> {
        self.cell(pos).filter(|entry| !entry.is_empty())
    }

    /// On-map coordinates within Chebyshev `radius` of `center`, row by row.
    /// The window is clipped to the map before it is walked, so the cost is
    /// bounded by the map size whatever the radius.
    pub fn cells_within(&self, center: ChunkPos, radius: i32) -> Vec<ChunkPos> {
        let radius = i64::from(radius.max(0));
        let (cx, cz) = (i64::from(center.x), i64::from(center.z));
        let z_min = (cz - radius).max(0);
        let z_max = (cz + radius).min(self.rows.len() as i64 - 1);

        let mut cells = Vec::new();
        for z in z_min..=z_max {
            let row_len = self.rows[z as usize].len() as i64;
            let x_min = (cx - radius).max(0);
            let x_max = (cx + radius).min(row_len - 1);
            for x in x_min..=x_max {
                cells.push(ChunkPos::new(x as i32, z as i32));
            }
        }
        cells
    }

    fn cell(&self, pos: &ChunkPos) -> Option<&ChunkMapEntry> {
        if pos.x < 0 || pos.z < 0 {
            return None;
        }
        self.rows.get(pos.z as usize)?.get(pos.x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_sentinels() {
        let map = ChunkMap::from_names(&[
            &["meadow", "empty_chunk", "field"],
            &["field", "", "meadow"],
        ]);
        assert_eq!(map.width(), 3);
        assert_eq!(map.depth(), 2);

        assert_eq!(map.entry(&ChunkPos::new(0, 0)).map(|e| e.terrain()), Some("meadow"));
        assert_eq!(map.entry(&ChunkPos::new(2, 1)).map(|e| e.terrain()), Some("meadow"));

        // Sentinels are on the map but have nothing to build
        assert!(map.contains(&ChunkPos::new(1, 0)));
        assert!(map.entry(&ChunkPos::new(1, 0)).is_none());
        assert!(map.entry(&ChunkPos::new(1, 1)).is_none());

        // Off the map
        assert!(!map.contains(&ChunkPos::new(3, 0)));
        assert!(!map.contains(&ChunkPos::new(0, 2)));
        assert!(!map.contains(&ChunkPos::new(-1, 0)));
        assert!(map.entry(&ChunkPos::new(0, -1)).is_none());
    }

    #[test]
    fn test_cells_within_clips_to_map() {
        let map = ChunkMap::from_names(&[
            &["a", "b", "c", "d"],
            &["e", "f", "g", "h"],
            &["i", "j"],
        ]);

        let corner = map.cells_within(ChunkPos::new(0, 0), 1);
        assert_eq!(
            corner,
            vec![ChunkPos::new(0, 0), ChunkPos::new(1, 0), ChunkPos::new(0, 1), ChunkPos::new(1, 1)]
        );

        // Short rows are respected
        let all = map.cells_within(ChunkPos::new(2, 1), 3);
        assert_eq!(all.len(), 10);
        assert!(all.iter().all(|pos| map.contains(pos)));

        // A radius far larger than the map still yields only its cells
        assert_eq!(map.cells_within(ChunkPos::new(1, 1), i32::MAX).len(), 10);
        assert!(map.cells_within(ChunkPos::new(50, 50), 3).is_empty());
        assert_eq!(map.cells_within(ChunkPos::new(1, 1), -2), vec![ChunkPos::new(1, 1)]);
    }

    #[test]
    fn test_layout_cells_from_json() {
        let json = r#"[
            ["meadow", {
                "terrain": "field",
                "objects": [{ "type": "Burned_Tower", "x": 4, "y": 7.5, "rotation": 1.57 }],
                "sprites": [{ "type": "butterfly", "x": 2, "y": 3, "layer": 2,
                              "animation": { "frames": 4, "speed": 0.2, "loop": true } }]
            }]
        ]"#;
        let map = ChunkMap::from_json_str(json).unwrap();
        assert_eq!(map.width(), 2);

        let plain = map.entry(&ChunkPos::new(0, 0)).unwrap();
        assert!(plain.objects().is_empty());

        let layout = map.entry(&ChunkPos::new(1, 0)).unwrap();
        assert_eq!(layout.terrain(), "field");
        assert_eq!(layout.objects()[0].kind, "Burned_Tower");
        assert_eq!(layout.objects()[0].scale, 1.0);
        assert_eq!(layout.sprites()[0].layer, 2);
        assert!(layout.sprites()[0].animation.as_ref().is_some_and(|a| a.looping));
    }
}
