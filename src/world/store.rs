use crate::tiles::RunList;
use std::collections::HashMap;

/// Read-only chunk definition table: chunk name -> run list.
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkStore {
    chunks: HashMap<String, RunList>,
}

impl ChunkStore {
    pub fn new(chunks: HashMap<String, RunList>) -> Self {
        Self { chunks }
    }

    /// Parse a chunk definition table such as `chunks.json`
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    /// Look up a chunk's run list by name
    pub fn get(&self, name: &str) -> Option<&RunList> {
        self.chunks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chunks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chunks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RunList)> {
        self.chunks.iter().map(|(name, runs)| (name.as_str(), runs))
    }
}
