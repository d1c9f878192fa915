use super::constants::TILESET_SIZE;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI};

/// Texture window on the tileset image for one placed tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilesetUv {
    /// Lower-left corner in normalized tileset coordinates
    pub offset: Vec2,
    /// Size of the window in normalized tileset coordinates
    pub repeat: Vec2,
    /// Texture rotation in radians
    pub rotation: f32,
}

/// Flat ground tile: a (possibly repeating) patch of the tileset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainTile {
    /// Offset on the tileset image, in tiles
    pub x: u32,
    pub y: u32,
    /// Repetition period in tiles
    pub rep_x: u32,
    pub rep_y: u32,
    /// Rotation in quarter turns
    pub rot: u8,
    /// Transparent texels are cut out
    pub trans: bool,
}

impl PlainTile {
    /// Texture window for this tile placed at local cell (x, y)
    pub fn tileset_uv(&self, x: u32, y: u32) -> TilesetUv {
        let rep_x = self.rep_x.max(1);
        let rep_y = self.rep_y.max(1);
        let (mut tx, mut ty) = (self.x + x % rep_x, self.y + y % rep_y);
        let mut rotation = 0.0;

        match self.rot {
            1 => {
                tx = self.x + y % rep_x;
                ty = self.y + x % rep_y + 1;
                rotation = FRAC_PI_2;
            }
            2 => {
                tx += 1;
                ty += 1;
                rotation = PI;
            }
            3 => {
                tx = self.x + y % rep_x + 1;
                ty = self.y + x % rep_y;
                rotation = -FRAC_PI_2;
            }
            _ => {}
        }

        TilesetUv {
            offset: Vec2::new(tx as f32, ty as f32) / TILESET_SIZE,
            repeat: Vec2::splat(1.0 / TILESET_SIZE),
            rotation,
        }
    }
}

/// Sloped mountain edge, built from a separate mesh and rotated as a whole
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountainTile {
    pub x: u32,
    pub y: u32,
    pub rep_x: u32,
    pub rep_y: u32,
    /// Mesh yaw in quarter turns
    pub rot: u8,
    /// 1 selects the corner mesh, anything else the straight edge
    pub corner_type: u8,
}

impl MountainTile {
    pub fn tileset_uv(&self, x: u32, y: u32) -> TilesetUv {
        let tx = self.x + x % self.rep_x.max(1);
        let ty = self.y + y % self.rep_y.max(1);
        TilesetUv {
            offset: Vec2::new(tx as f32, ty as f32) / TILESET_SIZE,
            repeat: Vec2::splat(1.0 / TILESET_SIZE),
            rotation: 0.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        f32::from(self.rot) * FRAC_PI_2
    }

    pub fn is_corner(&self) -> bool {
        self.corner_type == 1
    }
}

/// Tree billboard region on the tileset, in tiles: offset (4, 5), size 4x3
pub const TREE_SPRITE_OFFSET: (u32, u32) = (4, 5);
pub const TREE_SPRITE_SIZE: (u32, u32) = (4, 3);

/// Stump tiles placed around a tree's cell, as (tag, dx, dy)
pub const TREE_STUMPS: [(&str, i32, i32); 4] = [
    ("stump_ul", 0, -1),
    ("stump_ur", 1, -1),
    ("stump_dl", 0, 0),
    ("stump_dr", 1, 0),
];

/// Texture window of the tree billboard
pub fn tree_sprite_uv() -> TilesetUv {
    TilesetUv {
        offset: Vec2::new(TREE_SPRITE_OFFSET.0 as f32, TREE_SPRITE_OFFSET.1 as f32) / TILESET_SIZE,
        repeat: Vec2::new(TREE_SPRITE_SIZE.0 as f32, TREE_SPRITE_SIZE.1 as f32) / TILESET_SIZE,
        rotation: 0.0,
    }
}

/// Placement parameters of a tile tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TileKind {
    #[serde(rename = "Tile")]
    Plain(PlainTile),
    #[serde(rename = "TreeTile")]
    Tree,
    #[serde(rename = "MountainTile")]
    Mountain(MountainTile),
}

/// Immutable tile tag -> kind table.
/// Built once by the composition root and shared with whoever places tiles.
#[derive(Debug, Clone, Default)]
pub struct TileRegistry {
    tiles: HashMap<String, TileKind>,
}

impl TileRegistry {
    pub fn from_definitions(tiles: HashMap<String, TileKind>) -> Self {
        Self { tiles }
    }

    /// Parse a tile-definition table such as `tiles.json`
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::from_definitions)
    }

    pub fn get(&self, tag: &str) -> Option<&TileKind> {
        self.tiles.get(tag)
    }

    /// Check if a tile tag is registered
    pub fn is_valid_tile(&self, tag: &str) -> bool {
        self.tiles.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tiles.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}
