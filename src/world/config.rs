use crate::tiles::{CHUNK_LOAD_RADIUS, CHUNK_WORLD_SIZE};
use serde::{Deserialize, Serialize};

/// Streaming window settings, read from `streaming.json` when present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius of the window, in chunks
    pub load_radius: i32,
    /// Edge length of a chunk in world units
    pub chunk_world_size: f32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius: CHUNK_LOAD_RADIUS,
            chunk_world_size: CHUNK_WORLD_SIZE,
        }
    }
}

impl StreamingConfig {
    /// Number of chunks in a full window
    pub fn window_area(&self) -> usize {
        let side = 2 * self.load_radius.max(0) as usize + 1;
        side.saturating_mul(side)
    }

    pub fn is_valid(&self) -> bool {
        self.load_radius >= 0 && self.chunk_world_size.is_finite() && self.chunk_world_size > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamingConfig::default();
        assert_eq!(config.load_radius, 3);
        assert_eq!(config.chunk_world_size, 16.0);
        assert_eq!(config.window_area(), 49);
        assert!(config.is_valid());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: StreamingConfig = serde_json::from_str(r#"{ "load_radius": 1 }"#).unwrap();
        assert_eq!(config.load_radius, 1);
        assert_eq!(config.chunk_world_size, 16.0);
        assert_eq!(config.window_area(), 9);
    }

    #[test]
    fn test_invalid_values() {
        let config = StreamingConfig {
            chunk_world_size: 0.0,
            ..Default::default()
        };
        assert!(!config.is_valid());
        assert!(!StreamingConfig { load_radius: -1, ..Default::default() }.is_valid());
    }

    #[test]
    fn test_huge_radius_window_area() {
        let config = StreamingConfig {
            load_radius: 40_000,
            ..Default::default()
        };
        assert!(config.is_valid());
        assert_eq!(config.window_area(), 80_001 * 80_001);

        let widest = StreamingConfig {
            load_radius: i32::MAX,
            ..Default::default()
        };
        assert!(widest.window_area() > 0);
    }
}
