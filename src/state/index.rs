use std::sync::{Arc, RwLock};

use indexmap::IndexMap;

use super::block::{BlockKey, MinimapBlock};

/// A block shared between the index and its readers
pub type SharedBlock = Arc<RwLock<MinimapBlock>>;

/// Blocks of one elevation layer, keyed by block coordinates.
///
/// Insertion order is kept so that saves are deterministic.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    blocks: IndexMap<BlockKey, SharedBlock, ahash::RandomState>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, key: BlockKey) -> bool {
        self.blocks.contains_key(&key)
    }

    pub fn get(&self, key: BlockKey) -> Option<&SharedBlock> {
        self.blocks.get(&key)
    }

    pub fn get_or_create(&mut self, key: BlockKey) -> &SharedBlock {
        self.blocks.entry(key).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockKey, &SharedBlock)> {
        self.blocks.iter().map(|(k, b)| (*k, b))
    }

    /// Remove every block, handing them back for cleanup
    pub fn drain(&mut self) -> Vec<SharedBlock> {
        self.blocks.drain(..).map(|(_, b)| b).collect()
    }
}
