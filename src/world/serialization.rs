use super::chunk_map::ChunkMap;
use super::config::StreamingConfig;
use super::store::ChunkStore;
use crate::tiles::{RunEntry, RunList, RunUnit, TileRegistry};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

/// Magic number for chunk bundles ("TSCB" in ASCII)
const MAGIC_NUMBER: [u8; 4] = [b'T', b'S', b'C', b'B'];

/// Current bundle format version
const VERSION: u16 = 1;

/// Error type for loading data tables and bundles
#[derive(Debug)]
pub enum ChunkDataError {
    Io(io::Error),
    Json(serde_json::Error),
    Encoding(bincode::Error),
    InvalidMagicNumber,
    InvalidVersion(u16),
    InvalidChecksum,
    InvalidConfig(String),
}

impl From<io::Error> for ChunkDataError {
    fn from(err: io::Error) -> Self {
        ChunkDataError::Io(err)
    }
}

impl From<serde_json::Error> for ChunkDataError {
    fn from(err: serde_json::Error) -> Self {
        ChunkDataError::Json(err)
    }
}

impl From<bincode::Error> for ChunkDataError {
    fn from(err: bincode::Error) -> Self {
        ChunkDataError::Encoding(err)
    }
}

impl std::fmt::Display for ChunkDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkDataError::Io(e) => write!(f, "IO error: {}", e),
            ChunkDataError::Json(e) => write!(f, "JSON error: {}", e),
            ChunkDataError::Encoding(e) => write!(f, "Bundle encoding error: {}", e),
            ChunkDataError::InvalidMagicNumber => write!(f, "Invalid magic number"),
            ChunkDataError::InvalidVersion(v) => write!(f, "Invalid version: {}", v),
            ChunkDataError::InvalidChecksum => write!(f, "Checksum mismatch"),
            ChunkDataError::InvalidConfig(reason) => write!(f, "Invalid config: {}", reason),
        }
    }
}

impl std::error::Error for ChunkDataError {}

/// Load the chunk definition table (`chunks.json`)
pub fn load_chunk_store<P: AsRef<Path>>(path: P) -> Result<ChunkStore, ChunkDataError> {
    let json = fs::read_to_string(path)?;
    Ok(ChunkStore::from_json_str(&json)?)
}

/// Load the world layout (`chunk_map.json`)
pub fn load_chunk_map<P: AsRef<Path>>(path: P) -> Result<ChunkMap, ChunkDataError> {
    let json = fs::read_to_string(path)?;
    Ok(ChunkMap::from_json_str(&json)?)
}

/// Load the tile definitions (`tiles.json`)
pub fn load_tile_registry<P: AsRef<Path>>(path: P) -> Result<TileRegistry, ChunkDataError> {
    let json = fs::read_to_string(path)?;
    Ok(TileRegistry::from_json_str(&json)?)
}

/// Load streaming settings, falling back to defaults when the file is absent
pub fn load_streaming_config<P: AsRef<Path>>(path: P) -> Result<StreamingConfig, ChunkDataError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(StreamingConfig::default());
    }

    let config: StreamingConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
    if !config.is_valid() {
        return Err(ChunkDataError::InvalidConfig(format!(
            "load_radius {} / chunk_world_size {}",
            config.load_radius, config.chunk_world_size
        )));
    }
    Ok(config)
}

/// Bundle record: chunk name and its runs as (count, height, tag)
type BundleRecord = (String, Vec<(u32, i32, String)>);

fn to_records(store: &ChunkStore) -> Vec<BundleRecord> {
    let mut records: Vec<BundleRecord> = store
        .iter()
        .map(|(name, runs)| {
            let entries = runs
                .iter()
                .map(|entry| (entry.count(), entry.height(), entry.tile.clone()))
                .collect();
            (name.to_string(), entries)
        })
        .collect();
    // Stable byte output for the same table
    records.sort_by(|a, b| a.0.cmp(&b.0));
    records
}

fn from_records(records: Vec<BundleRecord>) -> ChunkStore {
    let chunks: HashMap<String, RunList> = records
        .into_iter()
        .map(|(name, entries)| {
            let runs = entries
                .into_iter()
                .map(|(count, height, tile)| {
                    let unit = if height == 0 {
                        RunUnit::Count(count)
                    } else {
                        RunUnit::CountWithHeight(count, height)
                    };
                    RunEntry::new(unit, tile)
                })
                .collect::<Vec<_>>();
            (name, RunList::from(runs))
        })
        .collect();
    ChunkStore::new(chunks)
}

/// Save a chunk table to disk as a checksummed binary bundle
pub fn save_bundle<P: AsRef<Path>>(store: &ChunkStore, path: P) -> Result<(), ChunkDataError> {
    // Ensure directory exists
    if let Some(parent) = path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = bincode::serialize(&to_records(store))?;
    let mut file = File::create(path)?;

    // Header
    file.write_all(&MAGIC_NUMBER)?;
    file.write_all(&VERSION.to_le_bytes())?;
    file.write_all(&(payload.len() as u32).to_le_bytes())?;

    file.write_all(&payload)?;

    let checksum = crc32fast::hash(&payload);
    file.write_all(&checksum.to_le_bytes())?;

    file.sync_all()?;
    Ok(())
}

/// Load a chunk table bundle written by [`save_bundle`]
pub fn load_bundle<P: AsRef<Path>>(path: P) -> Result<ChunkStore, ChunkDataError> {
    let mut file = File::open(path)?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;
    if magic != MAGIC_NUMBER {
        return Err(ChunkDataError::InvalidMagicNumber);
    }

    let mut version_bytes = [0u8; 2];
    file.read_exact(&mut version_bytes)?;
    let version = u16::from_le_bytes(version_bytes);
    if version != VERSION {
        return Err(ChunkDataError::InvalidVersion(version));
    }

    let mut len_bytes = [0u8; 4];
    file.read_exact(&mut len_bytes)?;
    let mut payload = vec![0u8; u32::from_le_bytes(len_bytes) as usize];
    file.read_exact(&mut payload)?;

    let mut checksum_bytes = [0u8; 4];
    file.read_exact(&mut checksum_bytes)?;
    if crc32fast::hash(&payload) != u32::from_le_bytes(checksum_bytes) {
        return Err(ChunkDataError::InvalidChecksum);
    }

    let records: Vec<BundleRecord> = bincode::deserialize(&payload)?;
    Ok(from_records(records))
}

/// Load chunk definitions from a bundle or a JSON table, by extension
pub fn load_chunks<P: AsRef<Path>>(path: P) -> Result<ChunkStore, ChunkDataError> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_chunk_store(path),
        _ => load_bundle(path),
    }
}
