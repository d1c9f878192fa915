use super::builder::{build_chunk, BuildOutcome, BuiltChunk};
use super::chunk_map::{ChunkMap, ChunkMapEntry};
use super::config::StreamingConfig;
use super::factory::TileFactory;
use super::store::ChunkStore;
use crate::tiles::{ChunkPos, TileRegistry};
use bevy::log::{debug, info, warn};
use bevy::tasks::{block_on, AsyncComputeTaskPool, Task, TaskPool};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub enum ChunkSlot<E> {
    Pending(Task<BuildOutcome<E>>),
    Loaded(BuiltChunk<E>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Loaded,
}

/// What a call to [`StreamingCache::update`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowChange {
    /// Focal chunk after the update; `None` when nothing changed
    pub focal_chunk: Option<ChunkPos>,
    /// Coordinates that got a build task, in window order
    pub requested: Vec<ChunkPos>,
    /// Coordinates dropped from the window, sorted
    pub released: Vec<ChunkPos>,
}

impl WindowChange {
    pub fn is_empty(&self) -> bool {
        self.focal_chunk.is_none() && self.requested.is_empty() && self.released.is_empty()
    }
}

/// Window of materialized chunks around a moving focal point.
///
/// Each chunk coordinate is absent, `Pending` (a build task is in flight) or
/// `Loaded`. Only the tick thread touches the slot table; builds run on the
/// async compute pool and are applied by [`StreamingCache::poll_builds`].
pub struct StreamingCache<F: TileFactory> {
    config: StreamingConfig,
    chunk_map: ChunkMap,
    store: Arc<ChunkStore>,
    registry: Arc<TileRegistry>,
    factory: Arc<F>,

    slots: HashMap<ChunkPos, ChunkSlot<F::Entity>>,

    /// Builds whose coordinate left the window; released once they finish
    retiring: Vec<(ChunkPos, Task<BuildOutcome<F::Entity>>)>,

    desired: HashSet<ChunkPos>,
    focal_chunk: Option<ChunkPos>,
}

impl<F: TileFactory> StreamingCache<F> {
    pub fn new(
        config: StreamingConfig,
        chunk_map: ChunkMap,
        store: Arc<ChunkStore>,
        registry: Arc<TileRegistry>,
        factory: Arc<F>,
    ) -> Self {
        Self {
            config,
            chunk_map,
            store,
            registry,
            factory,
            slots: HashMap::new(),
            retiring: Vec::new(),
            desired: HashSet::new(),
            focal_chunk: None,
        }
    }

    /// Move the focal point; releases chunks that left the window and starts
    /// builds for chunks that entered it. A move within the same chunk is a
    /// no-op.
    pub fn update(&mut self, focal_x: f32, focal_z: f32) -> WindowChange {
        let focal = ChunkPos::from_world(focal_x, focal_z, self.config.chunk_world_size);
        if self.focal_chunk == Some(focal) {
            return WindowChange::default();
        }

        self.focal_chunk = Some(focal);
        let window = self.chunk_map.cells_within(focal, self.config.load_radius);
        self.desired = window.iter().copied().collect();

        let mut change = WindowChange {
            focal_chunk: Some(focal),
            ..Default::default()
        };

        // Unload first
        let leaving: Vec<ChunkPos> = self
            .slots
            .keys()
            .filter(|pos| !self.desired.contains(*pos))
            .copied()
            .collect();
        for pos in leaving {
            match self.slots.remove(&pos) {
                Some(ChunkSlot::Loaded(chunk)) => self.release_chunk(chunk),
                Some(ChunkSlot::Pending(task)) => self.retiring.push((pos, task)),
                None => continue,
            }
            change.released.push(pos);
        }
        change.released.sort_unstable();

        for pos in window {
            if self.slots.contains_key(&pos) {
                continue;
            }
            let Some(entry) = self.chunk_map.entry(&pos).cloned() else {
                continue;
            };
            let task = self.spawn_build(pos, entry);
            self.slots.insert(pos, ChunkSlot::Pending(task));
            change.requested.push(pos);
        }

        info!(
            "Focal chunk {}: requested {}, released {}",
            focal,
            change.requested.len(),
            change.released.len()
        );

        #[cfg(feature = "debug_chunks")]
        info!("{}", self.window_grid());

        change
    }

    fn spawn_build(&self, position: ChunkPos, entry: ChunkMapEntry) -> Task<BuildOutcome<F::Entity>> {
        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.registry);
        let factory = Arc::clone(&self.factory);
        AsyncComputeTaskPool::get_or_init(TaskPool::new)
            .spawn(build_chunk(store, registry, factory, position, entry))
    }

    /// Apply every finished build. Returns how many chunks became loaded.
    pub fn poll_builds(&mut self) -> usize {
        let finished: Vec<ChunkPos> = self
            .slots
            .iter()
            .filter_map(|(pos, slot)| match slot {
                ChunkSlot::Pending(task) if task.is_finished() => Some(*pos),
                _ => None,
            })
            .collect();

        let mut loaded = 0;
        for pos in finished {
            let Some(ChunkSlot::Pending(task)) = self.slots.remove(&pos) else {
                continue;
            };
            // Slots only ever hold coordinates inside the window
            match block_on(task) {
                Ok(chunk) => {
                    debug!("Loaded chunk {} ('{}', {} entities)", pos, chunk.name, chunk.entities.len());
                    self.slots.insert(pos, ChunkSlot::Loaded(chunk));
                    loaded += 1;
                }
                Err(err) => warn!("Failed to build chunk {}: {}", pos, err),
            }
        }

        let retiring = std::mem::take(&mut self.retiring);
        for (pos, task) in retiring {
            if !task.is_finished() {
                self.retiring.push((pos, task));
                continue;
            }
            match block_on(task) {
                Ok(chunk) => {
                    debug!("Discarding chunk {} built after it left the window", pos);
                    self.release_chunk(chunk);
                }
                Err(err) => debug!("Build for chunk {} failed after it left the window: {}", pos, err),
            }
        }

        loaded
    }

    fn release_chunk(&self, chunk: BuiltChunk<F::Entity>) {
        for entity in chunk.entities {
            self.factory.release(entity);
        }
    }

    /// Release everything, waiting for in-flight builds to finish.
    ///
    /// Dropping the cache does not wait: builds still running at that point
    /// are detached and whatever they produce is never released.
    pub fn clear(&mut self) {
        let slots = std::mem::take(&mut self.slots);
        let retiring = std::mem::take(&mut self.retiring);

        let in_flight = slots
            .into_values()
            .filter_map(|slot| match slot {
                ChunkSlot::Loaded(chunk) => {
                    self.release_chunk(chunk);
                    None
                }
                ChunkSlot::Pending(task) => Some(task),
            })
            .collect::<Vec<_>>();

        for task in in_flight.into_iter().chain(retiring.into_iter().map(|(_, task)| task)) {
            match block_on(task) {
                Ok(chunk) => self.release_chunk(chunk),
                Err(err) => debug!("In-flight build failed during clear: {}", err),
            }
        }

        self.desired.clear();
        self.focal_chunk = None;
        info!("Streaming cache cleared");
    }

    pub fn get_loaded_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, ChunkSlot::Loaded(_)))
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.slots.len() - self.get_loaded_count()
    }

    /// Builds still running for coordinates that already left the window
    pub fn retiring_count(&self) -> usize {
        self.retiring.len()
    }

    /// `None` means absent
    pub fn slot_state(&self, pos: &ChunkPos) -> Option<SlotState> {
        self.slots.get(pos).map(|slot| match slot {
            ChunkSlot::Pending(_) => SlotState::Pending,
            ChunkSlot::Loaded(_) => SlotState::Loaded,
        })
    }

    pub fn is_loaded(&self, pos: &ChunkPos) -> bool {
        self.slot_state(pos) == Some(SlotState::Loaded)
    }

    /// Get a loaded chunk
    pub fn loaded_chunk(&self, pos: &ChunkPos) -> Option<&BuiltChunk<F::Entity>> {
        match self.slots.get(pos) {
            Some(ChunkSlot::Loaded(chunk)) => Some(chunk),
            _ => None,
        }
    }

    /// Loaded coordinates, sorted
    pub fn loaded_positions(&self) -> Vec<ChunkPos> {
        let mut positions: Vec<ChunkPos> = self
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, ChunkSlot::Loaded(_)))
            .map(|(pos, _)| *pos)
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn focal_chunk(&self) -> Option<ChunkPos> {
        self.focal_chunk
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Get statistics about the streaming state
    pub fn stats(&self) -> StreamingStats {
        StreamingStats {
            loaded_chunks: self.get_loaded_count(),
            pending_chunks: self.pending_count(),
            retiring_builds: self.retiring.len(),
            focal_chunk: self.focal_chunk,
        }
    }

    /// ASCII view of the window around the focal chunk
    pub fn window_grid(&self) -> String {
        let Some(focal) = self.focal_chunk else {
            return "No focal chunk yet\n".to_string();
        };

        // One ring past the load radius shows what was just dropped
        let load_radius = self.config.load_radius.max(0);
        let view_radius = i64::from(load_radius) + 1;

        // Clipped to the map plus that ring, always keeping the focal chunk
        let columns = view_span(focal.x, view_radius, self.chunk_map.width());
        let rows = view_span(focal.z, view_radius, self.chunk_map.depth());

        let mut grid = String::new();
        grid.push_str("\n╔═══════════ Chunk Window ═══════════╗\n");

        grid.push_str("    ");
        for x in columns.clone() {
            grid.push_str(&format!("{:3}", x));
        }
        grid.push('\n');

        // Rows run down the chunk map, so z grows downwards
        for z in rows {
            grid.push_str(&format!("{:4}", z));
            for x in columns.clone() {
                let pos = ChunkPos::new(x, z);
                let symbol = if pos == focal {
                    " @ "
                } else if !self.chunk_map.contains(&pos) {
                    "   "
                } else {
                    match self.slot_state(&pos) {
                        Some(SlotState::Loaded) => " █ ",
                        Some(SlotState::Pending) => " ░ ",
                        None if self.desired.contains(&pos) => " · ",
                        None => " . ",
                    }
                };
                grid.push_str(symbol);
            }
            grid.push('\n');
        }

        grid.push_str("╚════════════════════════════════════╝\n");
        grid.push_str("Legend: @ = Focal  █ = Loaded  ░ = Pending  · = Empty  . = Outside window\n");
        grid.push_str(&format!("{} | Load Radius: {}\n", self.stats(), load_radius));
        grid
    }
}

impl<F: TileFactory> Drop for StreamingCache<F> {
    fn drop(&mut self) {
        let mut tasks = Vec::new();
        for slot in std::mem::take(&mut self.slots).into_values() {
            match slot {
                ChunkSlot::Loaded(chunk) => self.release_chunk(chunk),
                ChunkSlot::Pending(task) => tasks.push(task),
            }
        }
        tasks.extend(std::mem::take(&mut self.retiring).into_iter().map(|(_, task)| task));

        let mut detached = 0;
        for task in tasks {
            if !task.is_finished() {
                task.detach();
                detached += 1;
                continue;
            }
            if let Ok(chunk) = block_on(task) {
                self.release_chunk(chunk);
            }
        }
        if detached > 0 {
            warn!("Streaming cache dropped with {} builds in flight; detached them", detached);
        }
    }
}

/// Statistics about the current streaming state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingStats {
    pub loaded_chunks: usize,
    pub pending_chunks: usize,
    pub retiring_builds: usize,
    pub focal_chunk: Option<ChunkPos>,
}

impl std::fmt::Display for StreamingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Loaded: {}, Pending: {}, Retiring: {}, Focal: {:?}",
            self.loaded_chunks, self.pending_chunks, self.retiring_builds, self.focal_chunk
        )
    }
}

fn view_span(center: i32, radius: i64, extent: usize) -> std::ops::RangeInclusive<i32> {
    let center = i64::from(center);
    let extent = extent as i64;
    let start = (center - radius).max(center.min(-1));
    let end = (center + radius).min(center.max(extent));
    start.max(i64::from(i32::MIN)) as i32..=end.min(i64::from(i32::MAX)) as i32
}
