use bevy::{
    app::ScheduleRunnerPlugin,
    log::LogPlugin,
    prelude::*,
};
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tilestream::tiles::{
    chunk::coords,
    decode,
    registry::{tree_sprite_uv, TREE_STUMPS},
    TileKind, TilesetUv,
};
use tilestream::world::{
    serialization, SpawnRequest, StreamingCache, TileFactory, TileFactoryError,
};

const MAP_DATA_DIR: &str = "assets/map_data";

// Focal point movement, in world units per tick
const WALK_SPEED: f32 = 6.0;

// Ticks before the demo tears the window down and exits
const DEMO_TICKS: u32 = 900;

const TICK_RATE_HZ: f64 = 60.0;

/// What the demo factory hands back for each placement
#[derive(Debug)]
enum PlacedPiece {
    Tile {
        tag: String,
        position: Vec3,
        uv: TilesetUv,
        /// Stump decals around a tree trunk
        stumps: Vec<(&'static str, Vec3)>,
    },
    Object {
        kind: String,
        position: Vec3,
    },
    Sprite {
        kind: String,
        position: Vec3,
        layer: u8,
    },
}

impl PlacedPiece {
    fn label(&self) -> &str {
        match self {
            PlacedPiece::Tile { tag, .. } => tag,
            PlacedPiece::Object { kind, .. } | PlacedPiece::Sprite { kind, .. } => kind,
        }
    }
}

/// Stands in for a renderer: resolves positions and texture windows and
/// counts what is alive
struct LoggingFactory {
    chunk_world_size: f32,
    live: Arc<AtomicUsize>,
}

impl TileFactory for LoggingFactory {
    type Entity = PlacedPiece;

    fn produce_entity(
        &self,
        request: SpawnRequest,
    ) -> impl Future<Output = Result<PlacedPiece, TileFactoryError>> + Send {
        let size = self.chunk_world_size;
        let live = Arc::clone(&self.live);
        async move {
            let piece = match request {
                SpawnRequest::Tile(tile) => {
                    let (x, y) = (tile.local_x as u32, tile.local_y as u32);
                    let position = tile.world_position(size);
                    let (uv, stumps) = match &tile.kind {
                        TileKind::Plain(plain) => (plain.tileset_uv(x, y), Vec::new()),
                        TileKind::Mountain(mountain) => (mountain.tileset_uv(x, y), Vec::new()),
                        TileKind::Tree => {
                            let stumps = TREE_STUMPS
                                .iter()
                                .map(|&(tag, dx, dz)| {
                                    (tag, position + Vec3::new(dx as f32, 0.0, dz as f32))
                                })
                                .collect();
                            (tree_sprite_uv(), stumps)
                        }
                    };
                    PlacedPiece::Tile {
                        tag: tile.tag,
                        position,
                        uv,
                        stumps,
                    }
                }
                SpawnRequest::Object { chunk, placement } => {
                    let origin = chunk.to_world(size);
                    PlacedPiece::Object {
                        position: Vec3::new(origin.x + placement.x, 0.0, origin.y + placement.y),
                        kind: placement.kind,
                    }
                }
                SpawnRequest::Sprite { chunk, placement } => {
                    let origin = chunk.to_world(size);
                    PlacedPiece::Sprite {
                        position: Vec3::new(origin.x + placement.x, 0.0, origin.y + placement.y),
                        kind: placement.kind,
                        layer: placement.layer,
                    }
                }
            };
            live.fetch_add(1, Ordering::Relaxed);
            Ok(piece)
        }
    }

    fn release(&self, entity: PlacedPiece) {
        self.live.fetch_sub(1, Ordering::Relaxed);
        match &entity {
            PlacedPiece::Tile { stumps, .. } if !stumps.is_empty() => {
                trace!("Released {} with {} stumps", entity.label(), stumps.len());
            }
            PlacedPiece::Tile { .. } => {}
            PlacedPiece::Object { position, .. } | PlacedPiece::Sprite { position, .. } => {
                debug!("Released {} at {}", entity.label(), position);
            }
        }
    }
}

#[derive(Resource)]
struct StreamingWorld {
    cache: StreamingCache<LoggingFactory>,
    live: Arc<AtomicUsize>,
}

/// Focal point bouncing around the map
#[derive(Resource)]
struct Walker {
    position: Vec2,
    heading: Vec2,
    bounds: Vec2,
    ticks: u32,
}

fn main() {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / TICK_RATE_HZ,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .add_systems(Startup, setup_streaming)
        .add_systems(
            Update,
            (
                walk_focal_point,
                update_streaming.after(walk_focal_point),
                finish_demo.after(update_streaming),
            )
                .run_if(resource_exists::<StreamingWorld>),
        )
        .run();
}

fn setup_streaming(mut commands: Commands, mut exit: MessageWriter<AppExit>) {
    let dir = Path::new(MAP_DATA_DIR);

    // Prefer a prebuilt bundle over the JSON table
    let bundle = dir.join("chunks.tscb");
    let chunks_path = if bundle.exists() {
        bundle
    } else {
        dir.join("chunks.json")
    };

    let loaded = serialization::load_chunks(&chunks_path).and_then(|store| {
        Ok((
            store,
            serialization::load_chunk_map(dir.join("chunk_map.json"))?,
            serialization::load_tile_registry(dir.join("tiles.json"))?,
            serialization::load_streaming_config(dir.join("streaming.json"))?,
        ))
    });

    let (store, chunk_map, registry, config) = match loaded {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to load map data from {}: {}", MAP_DATA_DIR, e);
            exit.write(AppExit::error());
            return;
        }
    };

    info!(
        "Loaded {} chunks, {} tile types, {}x{} chunk map",
        store.len(),
        registry.len(),
        chunk_map.width(),
        chunk_map.depth()
    );
    for name in store.names() {
        if let Some(runs) = store.get(name) {
            debug!("Chunk '{}':\n{}", name, decode(runs).ascii());
        }
    }

    let bounds = Vec2::new(
        chunk_map.width() as f32 * config.chunk_world_size,
        chunk_map.depth() as f32 * config.chunk_world_size,
    );
    let live = Arc::new(AtomicUsize::new(0));
    let factory = LoggingFactory {
        chunk_world_size: config.chunk_world_size,
        live: Arc::clone(&live),
    };

    commands.insert_resource(Walker {
        position: bounds * 0.5,
        heading: Vec2::new(1.0, 0.6).normalize(),
        bounds,
        ticks: 0,
    });
    commands.insert_resource(StreamingWorld {
        cache: StreamingCache::new(
            config,
            chunk_map,
            Arc::new(store),
            Arc::new(registry),
            Arc::new(factory),
        ),
        live,
    });
}

fn walk_focal_point(mut walker: ResMut<Walker>) {
    let Walker {
        position,
        heading,
        bounds,
        ticks,
    } = &mut *walker;

    *position += *heading * WALK_SPEED;
    if position.x < 0.0 || position.x > bounds.x {
        heading.x = -heading.x;
    }
    if position.y < 0.0 || position.y > bounds.y {
        heading.y = -heading.y;
    }
    *position = position.clamp(Vec2::ZERO, *bounds);
    *ticks += 1;
}

fn update_streaming(walker: Res<Walker>, mut world: ResMut<StreamingWorld>) {
    let change = world.cache.update(walker.position.x, walker.position.y);
    if let Some(focal) = change.focal_chunk {
        let (tile_x, tile_z) = coords::world_to_local_tile(walker.position.x, walker.position.y);
        debug!(
            "Window moved to {} (entered at tile {}, {}): +{} -{}",
            focal,
            tile_x,
            tile_z,
            change.requested.len(),
            change.released.len()
        );
    }

    let loaded = world.cache.poll_builds();
    if loaded > 0 {
        debug!("{} chunks finished loading", loaded);
    }
}

fn finish_demo(
    walker: Res<Walker>,
    mut world: ResMut<StreamingWorld>,
    mut exit: MessageWriter<AppExit>,
) {
    if walker.ticks % 120 == 0 {
        info!(
            "{} | Live entities: {}",
            world.cache.stats(),
            world.live.load(Ordering::Relaxed)
        );
    }

    if walker.ticks < DEMO_TICKS {
        return;
    }

    info!("{}", world.cache.window_grid());
    world.cache.clear();
    let live = world.live.load(Ordering::Relaxed);
    if live == 0 {
        info!("Demo finished, all entities released");
        exit.write(AppExit::Success);
    } else {
        error!("Demo finished with {} entities still alive", live);
        exit.write(AppExit::error());
    }
}
