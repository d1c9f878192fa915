use super::chunk_map::ChunkMapEntry;
use super::factory::{SpawnRequest, TileFactory, TileFactoryError, TileSpawn};
use super::store::ChunkStore;
use crate::tiles::{decode, find_connected_regions, ChunkPos, TileGrid, TileRegistry, CHUNK_SIZE};
use bevy::log::{debug, warn};
use std::fmt;
use std::sync::Arc;

/// A chunk whose entities have all been produced
#[derive(Debug)]
pub struct BuiltChunk<E> {
    pub position: ChunkPos,
    /// Terrain chunk name from the chunk map
    pub name: String,
    pub entities: Vec<E>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The chunk map names a chunk the store doesn't have
    UnknownChunk { position: ChunkPos, name: String },
    Factory {
        position: ChunkPos,
        source: TileFactoryError,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownChunk { position, name } => {
                write!(f, "Chunk {} references unknown chunk '{}'", position, name)
            }
            BuildError::Factory { position, source } => {
                write!(f, "Factory failed for chunk {}: {}", position, source)
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Factory { source, .. } => Some(source),
            BuildError::UnknownChunk { .. } => None,
        }
    }
}

pub type BuildOutcome<E> = Result<BuiltChunk<E>, BuildError>;

/// Build one chunk: resolve its run list, decode, decompose and ask the
/// factory for every piece. Any factory error releases what was already
/// produced for this chunk.
pub async fn build_chunk<F: TileFactory>(
    store: Arc<ChunkStore>,
    registry: Arc<TileRegistry>,
    factory: Arc<F>,
    position: ChunkPos,
    entry: ChunkMapEntry,
) -> BuildOutcome<F::Entity> {
    let name = entry.terrain().to_string();
    let Some(runs) = store.get(&name) else {
        warn!("Chunk data not found: {} (at {})", name, position);
        return Err(BuildError::UnknownChunk { position, name });
    };

    let grid = decode(runs);
    let requests = plan_spawns(&grid, &registry, position, &entry);
    debug!("Building chunk {} '{}' with {} entities", position, name, requests.len());

    let mut entities = Vec::with_capacity(requests.len());
    for request in requests {
        match factory.produce_entity(request).await {
            Ok(entity) => entities.push(entity),
            Err(source) => {
                for entity in entities {
                    factory.release(entity);
                }
                return Err(BuildError::Factory { position, source });
            }
        }
    }

    Ok(BuiltChunk {
        position,
        name,
        entities,
    })
}

/// Every spawn request for a decoded chunk.
///
/// Tiles come per tile type in first-seen order, one request per cell of each
/// region, carrying that cell's own height. Tags the registry doesn't know
/// are skipped, as are placements outside the chunk.
pub fn plan_spawns(
    grid: &TileGrid,
    registry: &TileRegistry,
    position: ChunkPos,
    entry: &ChunkMapEntry,
) -> Vec<SpawnRequest> {
    let mut requests = Vec::new();

    for tag in grid.tile_types() {
        let Some(kind) = registry.get(tag) else {
            warn!("Tile type not found: {}", tag);
            continue;
        };

        for region in find_connected_regions(grid, tag) {
            for (x, y) in region.cells() {
                let height = grid.cell(x, y).map_or(0, |cell| cell.height);
                requests.push(SpawnRequest::Tile(TileSpawn {
                    chunk: position,
                    tag: tag.to_string(),
                    kind: kind.clone(),
                    local_x: x,
                    local_y: y,
                    height,
                }));
            }
        }
    }

    for placement in entry.objects() {
        if !in_chunk(placement.x, placement.y) {
            warn!("Object {} outside chunk {}, skipping", placement.kind, position);
            continue;
        }
        requests.push(SpawnRequest::Object {
            chunk: position,
            placement: placement.clone(),
        });
    }

    for placement in entry.sprites() {
        if !in_chunk(placement.x, placement.y) {
            warn!("Sprite {} outside chunk {}, skipping", placement.kind, position);
            continue;
        }
        requests.push(SpawnRequest::Sprite {
            chunk: position,
            placement: placement.clone(),
        });
    }

    requests
}

fn in_chunk(x: f32, y: f32) -> bool {
    let size = CHUNK_SIZE as f32;
    (0.0..size).contains(&x) && (0.0..size).contains(&y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{fixtures, RunList, TileKind};
    use crate::world::chunk_map::{ChunkLayout, ObjectPlacement, SpritePlacement};
    use bevy::tasks::block_on;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn registry(tags: &[&str]) -> TileRegistry {
        TileRegistry::from_definitions(
            tags.iter()
                .map(|tag| (tag.to_string(), TileKind::Tree))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn store() -> ChunkStore {
        let mut chunks = HashMap::new();
        chunks.insert("meadow".to_string(), fixtures::meadow_runs());
        chunks.insert(
            "field".to_string(),
            serde_json::from_str::<RunList>(r#"[256, "grass"]"#).unwrap(),
        );
        ChunkStore::new(chunks)
    }

    /// Hands out tags as entities; fails on a chosen tag
    #[derive(Default)]
    struct TagFactory {
        fail_on: Option<&'static str>,
        released: Mutex<Vec<String>>,
        produced: AtomicUsize,
    }

    impl TileFactory for TagFactory {
        type Entity = String;

        fn produce_entity(
            &self,
            request: SpawnRequest,
        ) -> impl std::future::Future<Output = Result<String, TileFactoryError>> + Send {
            let result = match request {
                SpawnRequest::Tile(tile) if Some(tile.tag.as_str()) == self.fail_on => {
                    Err(TileFactoryError::Unsupported(tile.tag))
                }
                SpawnRequest::Tile(tile) => Ok(tile.tag),
                SpawnRequest::Object { placement, .. } => Ok(placement.kind),
                SpawnRequest::Sprite { placement, .. } => Ok(placement.kind),
            };
            if result.is_ok() {
                self.produced.fetch_add(1, Ordering::Relaxed);
            }
            async move { result }
        }

        fn release(&self, entity: String) {
            self.released.lock().unwrap().push(entity);
        }
    }

    #[test]
    fn test_plan_uniform_chunk() {
        let grid = TileGrid::filled("grass", 1);
        let requests = plan_spawns(&grid, &registry(&["grass"]), ChunkPos::new(1, 2), &"field".into());
        assert_eq!(requests.len(), 256);
        match &requests[17] {
            SpawnRequest::Tile(tile) => {
                assert_eq!((tile.local_x, tile.local_y), (1, 1));
                assert_eq!(tile.height, 1);
                assert_eq!(tile.chunk, ChunkPos::new(1, 2));
            }
            other => panic!("expected tile, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_skips_unknown_tags() {
        let grid = decode(&fixtures::meadow_runs());
        let requests = plan_spawns(&grid, &registry(&["tree", "path"]), ChunkPos::new(0, 0), &"meadow".into());
        // 17 single trees plus the 14x2 path strip
        assert_eq!(requests.len(), 17 + 28);
        assert!(requests.iter().all(|r| matches!(
            r,
            SpawnRequest::Tile(tile) if tile.tag == "tree" || tile.tag == "path"
        )));
    }

    #[test]
    fn test_plan_uses_cell_heights() {
        let grid = decode(&fixtures::meadow_runs());
        let requests = plan_spawns(&grid, &registry(&["grass"]), ChunkPos::new(0, 0), &"meadow".into());
        let height_at = |x, y| {
            requests.iter().find_map(|r| match r {
                SpawnRequest::Tile(t) if t.local_x == x && t.local_y == y => Some(t.height),
                _ => None,
            })
        };
        assert_eq!(height_at(6, 5), Some(1));
        assert_eq!(height_at(7, 6), Some(2));
        assert_eq!(height_at(15, 15), Some(0));
    }

    #[test]
    fn test_plan_layout_placements() {
        let entry = ChunkMapEntry::Layout(ChunkLayout {
            terrain: "field".to_string(),
            objects: vec![
                ObjectPlacement {
                    kind: "Burned_Tower".to_string(),
                    x: 4.0,
                    y: 7.5,
                    rotation: 0.0,
                    scale: 1.0,
                },
                ObjectPlacement {
                    kind: "Stray".to_string(),
                    x: 16.0,
                    y: 0.0,
                    rotation: 0.0,
                    scale: 1.0,
                },
            ],
            sprites: vec![SpritePlacement {
                kind: "butterfly".to_string(),
                x: 2.0,
                y: 3.0,
                layer: 1,
                animation: None,
            }],
        });
        let grid = TileGrid::filled("grass", 0);
        let requests = plan_spawns(&grid, &registry(&["grass"]), ChunkPos::new(0, 0), &entry);
        assert_eq!(requests.len(), 256 + 2);
        assert!(matches!(&requests[256], SpawnRequest::Object { placement, .. } if placement.kind == "Burned_Tower"));
        assert!(matches!(&requests[257], SpawnRequest::Sprite { placement, .. } if placement.kind == "butterfly"));
    }

    #[test]
    fn test_build_chunk() {
        let factory = Arc::new(TagFactory::default());
        let outcome = block_on(build_chunk(
            Arc::new(store()),
            Arc::new(registry(&["grass"])),
            Arc::clone(&factory),
            ChunkPos::new(3, 4),
            "field".into(),
        ));
        let chunk = outcome.unwrap();
        assert_eq!(chunk.position, ChunkPos::new(3, 4));
        assert_eq!(chunk.name, "field");
        assert_eq!(chunk.entities.len(), 256);
    }

    #[test]
    fn test_build_unknown_chunk() {
        let factory = Arc::new(TagFactory::default());
        let outcome = block_on(build_chunk(
            Arc::new(store()),
            Arc::new(registry(&["grass"])),
            factory,
            ChunkPos::new(0, 0),
            "mystery".into(),
        ));
        assert!(matches!(outcome, Err(BuildError::UnknownChunk { name, .. }) if name == "mystery"));
    }

    #[test]
    fn test_factory_failure_releases_partial_build() {
        let factory = Arc::new(TagFactory {
            fail_on: Some("path"),
            ..Default::default()
        });
        let outcome = block_on(build_chunk(
            Arc::new(store()),
            Arc::new(registry(&["tree", "path"])),
            Arc::clone(&factory),
            ChunkPos::new(0, 0),
            "meadow".into(),
        ));

        let err = outcome.unwrap_err();
        assert!(matches!(err, BuildError::Factory { .. }));
        // Trees come first in the meadow, so all 17 were produced then released
        let released = factory.released.lock().unwrap();
        assert_eq!(released.len(), 17);
        assert_eq!(factory.produced.load(Ordering::Relaxed), 17);
        assert!(released.iter().all(|tag| tag == "tree"));
    }
}
