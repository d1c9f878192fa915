use super::chunk::{TileCell, TileGrid};
use super::constants::CHUNK_AREA;
use bevy::log::warn;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Count part of a run, decided at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunUnit {
    Count(u32),
    CountWithHeight(u32, i32),
}

impl RunUnit {
    pub fn count(&self) -> u32 {
        match *self {
            RunUnit::Count(count) | RunUnit::CountWithHeight(count, _) => count,
        }
    }

    pub fn height(&self) -> i32 {
        match *self {
            RunUnit::Count(_) => 0,
            RunUnit::CountWithHeight(_, height) => height,
        }
    }
}

/// One encoded run: a unit followed by the tile tag it repeats
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEntry {
    pub unit: RunUnit,
    pub tile: String,
}

impl RunEntry {
    pub fn new(unit: RunUnit, tile: impl Into<String>) -> Self {
        Self {
            unit,
            tile: tile.into(),
        }
    }

    /// Canonical entry for a run of `count` copies of `cell`:
    /// height 0 encodes as a bare count, anything else as a pair.
    pub fn for_run(cell: &TileCell, count: u32) -> Self {
        let unit = if cell.height == 0 {
            RunUnit::Count(count)
        } else {
            RunUnit::CountWithHeight(count, cell.height)
        };
        Self::new(unit, cell.tile.clone())
    }

    pub fn count(&self) -> u32 {
        self.unit.count()
    }

    pub fn height(&self) -> i32 {
        self.unit.height()
    }
}

/// Ordered list of runs describing one chunk.
///
/// On the wire a run list is a flat JSON array alternating a run unit and a
/// tile tag: `[16, "none", [2, 1], "grass", ...]`. A unit is either a bare
/// count (height 0) or a `[count, height]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunList(Vec<RunEntry>);

impl RunList {
    pub fn new(entries: Vec<RunEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[RunEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all run counts, including any placements past grid capacity
    pub fn total_count(&self) -> u64 {
        self.0.iter().map(|entry| u64::from(entry.count())).sum()
    }
}

impl From<Vec<RunEntry>> for RunList {
    fn from(entries: Vec<RunEntry>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a RunList {
    type Item = &'a RunEntry;
    type IntoIter = std::slice::Iter<'a, RunEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for RunList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len() * 2))?;
        for entry in &self.0 {
            seq.serialize_element(&entry.unit)?;
            seq.serialize_element(&entry.tile)?;
        }
        seq.end()
    }
}

struct RunListVisitor;

impl<'de> Visitor<'de> for RunListVisitor {
    type Value = RunList;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a flat list alternating run counts and tile tags")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RunList, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0) / 2);
        while let Some(unit) = seq.next_element::<RunUnit>()? {
            let tile = seq.next_element::<String>()?.ok_or_else(|| {
                de::Error::custom(format!("run {} has a count but no tile tag", entries.len()))
            })?;
            entries.push(RunEntry { unit, tile });
        }
        Ok(RunList(entries))
    }
}

impl<'de> Deserialize<'de> for RunList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(RunListVisitor)
    }
}

/// Expand a run list into a 16x16 grid.
///
/// Runs fill cells in row-major order. Placements past the grid's capacity are
/// dropped with a warning; cells no run reaches keep the sentinel tile.
pub fn decode(runs: &RunList) -> TileGrid {
    let mut grid = TileGrid::empty();
    let mut index = 0usize;

    for entry in runs {
        let height = entry.height();
        for _ in 0..entry.count() {
            if index >= CHUNK_AREA {
                warn!("Chunk data overflow at index {}", index);
                break;
            }
            grid.place(index, &entry.tile, height);
            index += 1;
        }
    }

    grid
}

/// Compress a grid into its canonical run list.
/// The counts of the result always sum to `CHUNK_AREA`.
pub fn encode(grid: &TileGrid) -> RunList {
    let cells = grid.cells();
    let mut entries = Vec::new();
    let mut current = &cells[0];
    let mut count = 0u32;

    for cell in cells {
        if cell == current {
            count += 1;
        } else {
            entries.push(RunEntry::for_run(current, count));
            current = cell;
            count = 1;
        }
    }
    if count > 0 {
        entries.push(RunEntry::for_run(current, count));
    }

    RunList(entries)
}
