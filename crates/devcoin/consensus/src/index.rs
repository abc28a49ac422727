//! Block index arena
//!
//! Connected blocks live in an append-only arena. Each entry refers to its
//! predecessor by [`IndexId`], so traversal never owns or borrows across
//! entries and a linked entry is never mutated.

use crate::header::BlockHeader;
use alloy_primitives::B256;
use std::{collections::HashMap, ops::Deref};

/// Number of trailing blocks in the median-time-past window
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Stable handle of an entry in a [`ChainIndex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexId(usize);

/// Chain position of a connected block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndex {
    /// Block hash
    pub hash: B256,
    /// Height in the chain
    pub height: u64,
    /// Compact target of the block
    pub bits: u32,
    /// Block timestamp
    pub time: u32,
    prev: Option<IndexId>,
}

impl BlockIndex {
    /// Timestamp widened for timespan arithmetic
    pub const fn block_time(&self) -> i64 {
        self.time as i64
    }

    /// Handle of the predecessor, `None` for the first indexed block
    pub const fn prev_id(&self) -> Option<IndexId> {
        self.prev
    }
}

/// Append-only arena of [`BlockIndex`] entries
#[derive(Debug, Clone, Default)]
pub struct ChainIndex {
    blocks: Vec<BlockIndex>,
    by_hash: HashMap<B256, IndexId>,
    start_height: u64,
    tip: Option<IndexId>,
}

impl ChainIndex {
    /// Create an empty index starting at genesis
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index whose first block sits at `height`.
    ///
    /// Used for views that do not reach back to genesis.
    pub fn with_start_height(height: u64) -> Self {
        Self { start_height: height, ..Self::default() }
    }

    /// Number of indexed blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no block has been indexed
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Current best tip
    pub fn tip(&self) -> Option<BlockRef<'_>> {
        self.tip.and_then(|id| self.block(id))
    }

    /// Look up an entry by handle
    pub fn block(&self, id: IndexId) -> Option<BlockRef<'_>> {
        self.blocks.get(id.0).map(|_| BlockRef { index: self, id })
    }

    /// Look up an entry by block hash
    pub fn find(&self, hash: &B256) -> Option<BlockRef<'_>> {
        self.by_hash.get(hash).and_then(|id| self.block(*id))
    }

    /// Append a block on top of the current tip
    pub fn push(&mut self, hash: B256, bits: u32, time: u32) -> IndexId {
        let prev = self.tip;
        let height = prev.map_or(self.start_height, |id| self.blocks[id.0].height + 1);
        let id = self.append(BlockIndex { hash, height, bits, time, prev });
        self.tip = Some(id);
        id
    }

    /// Append a header on top of the current tip
    pub fn push_header(&mut self, header: &BlockHeader) -> IndexId {
        self.push(header.block_hash(), header.bits, header.time)
    }

    /// Index a block on top of `prev` without moving the tip.
    ///
    /// Returns `None` if `prev` does not belong to this index.
    pub fn insert(&mut self, prev: IndexId, hash: B256, bits: u32, time: u32) -> Option<IndexId> {
        let height = self.blocks.get(prev.0)?.height + 1;
        Some(self.append(BlockIndex { hash, height, bits, time, prev: Some(prev) }))
    }

    /// Make `id` the best tip
    pub fn set_tip(&mut self, id: IndexId) -> bool {
        if id.0 < self.blocks.len() {
            self.tip = Some(id);
            return true
        }
        false
    }

    fn append(&mut self, block: BlockIndex) -> IndexId {
        let id = IndexId(self.blocks.len());
        self.by_hash.insert(block.hash, id);
        self.blocks.push(block);
        id
    }
}

/// Borrowed cursor over an entry of a [`ChainIndex`]
#[derive(Debug, Clone, Copy)]
pub struct BlockRef<'a> {
    index: &'a ChainIndex,
    id: IndexId,
}

impl<'a> BlockRef<'a> {
    /// Handle of this entry
    pub const fn id(&self) -> IndexId {
        self.id
    }

    /// Predecessor entry
    pub fn prev(&self) -> Option<Self> {
        self.prev_id().and_then(|id| self.index.block(id))
    }

    /// This entry followed by each predecessor, newest first
    pub fn ancestors(self) -> impl Iterator<Item = BlockRef<'a>> + 'a {
        std::iter::successors(Some(self), |block| block.prev())
    }

    /// Ancestor at `height`, or this entry if `height` is its own
    pub fn ancestor(&self, height: u64) -> Option<Self> {
        if height > self.height {
            return None
        }
        self.ancestors().find(|block| block.height == height)
    }

    /// Median timestamp of this block and up to ten predecessors
    pub fn median_time_past(&self) -> i64 {
        let mut times: Vec<i64> =
            self.ancestors().take(MEDIAN_TIME_SPAN).map(|block| block.block_time()).collect();
        times.sort_unstable();
        times[times.len() / 2]
    }
}

impl Deref for BlockRef<'_> {
    type Target = BlockIndex;

    fn deref(&self) -> &BlockIndex {
        &self.index.blocks[self.id.0]
    }
}
