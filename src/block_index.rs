//! In-memory block-index nodes and the chain-work model.
//!
//! The index is an arena of nodes addressed by integer handle rather than a
//! graph of raw back-pointers, so that it can be owned independently of
//! whatever storage backend the caller uses — see the design note on the
//! cyclic/back-pointer graph of block indices in this engine's
//! specification.

use primitive_types::{U256, U512};

use crate::work::difficulty::ExpandedDifficulty;

/// A handle into a [`BlockIndexArena`]. Cheap to copy; meaningless outside
/// the arena that produced it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BlockIndexHandle(usize);

/// A single node in the block index.
///
/// `height == 0` iff `prev.is_none()`; `chain_work` is the cumulative sum of
/// [`crate::work::difficulty::block_proof`] from genesis through this block,
/// inclusive.
#[derive(Clone, Copy, Debug)]
pub struct BlockIndex {
    pub height: u32,
    pub time: i64,
    pub bits: u32,
    pub hash_randomx: Option<[u8; 32]>,
    prev: Option<BlockIndexHandle>,
    skip: Option<BlockIndexHandle>,
    chain_work: U512,
}

impl BlockIndex {
    pub fn prev(&self) -> Option<BlockIndexHandle> {
        self.prev
    }

    pub fn skip(&self) -> Option<BlockIndexHandle> {
        self.skip
    }

    pub fn chain_work(&self) -> U512 {
        self.chain_work
    }
}

/// An arena owning a chain of [`BlockIndex`] nodes.
///
/// This is a convenience for tests and small tools; production callers
/// typically already have a block-index graph backed by their own storage
/// and only need the free functions in [`crate::work`], which operate on
/// anything implementing the handful of accessors used here.
#[derive(Default)]
pub struct BlockIndexArena {
    nodes: Vec<BlockIndex>,
}

impl BlockIndexArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn get(&self, handle: BlockIndexHandle) -> &BlockIndex {
        &self.nodes[handle.0]
    }

    /// Appends the genesis block (height 0, no predecessor).
    pub fn push_genesis(&mut self, time: i64, bits: u32, hash_randomx: Option<[u8; 32]>) -> BlockIndexHandle {
        assert!(self.nodes.is_empty(), "genesis must be the first node pushed");
        let node = BlockIndex {
            height: 0,
            time,
            bits,
            hash_randomx,
            prev: None,
            skip: None,
            chain_work: block_proof_u512(bits),
        };
        self.nodes.push(node);
        BlockIndexHandle(0)
    }

    /// Appends a block whose predecessor is `prev`.
    pub fn push(
        &mut self,
        prev: BlockIndexHandle,
        time: i64,
        bits: u32,
        hash_randomx: Option<[u8; 32]>,
    ) -> BlockIndexHandle {
        let prev_node = self.get(prev);
        let height = prev_node.height + 1;
        let chain_work = prev_node.chain_work + block_proof_u512(bits);
        let skip_height = skip_height(height);
        let skip = self.ancestor(prev, skip_height);

        let node = BlockIndex {
            height,
            time,
            bits,
            hash_randomx,
            prev: Some(prev),
            skip,
            chain_work,
        };
        let handle = BlockIndexHandle(self.nodes.len());
        self.nodes.push(node);
        handle
    }

    /// Returns the ancestor of `from` at `height`, or `None` if `height`
    /// exceeds `from`'s height. Uses the skip pointers to run in O(log n).
    pub fn ancestor(&self, from: BlockIndexHandle, height: u32) -> Option<BlockIndexHandle> {
        let node = self.get(from);
        if height > node.height {
            return None;
        }

        let mut current = from;
        loop {
            let node = self.get(current);
            if node.height == height {
                return Some(current);
            }
            match (node.skip, node.prev) {
                (Some(skip), _) if self.get(skip).height >= height => current = skip,
                (_, Some(prev)) => current = prev,
                _ => return Some(current),
            }
        }
    }
}

/// Bitcoin Core's deterministic skip-pointer height function
/// (`CBlockIndex::GetSkipHeight`): a pure function of `height` that yields an
/// ancestor height strictly less than `height` (or `0`/none for low
/// heights), chosen so repeated skip-hops approximate a binary search.
pub fn skip_height(height: u32) -> u32 {
    if height < 2 {
        return 0;
    }
    if height & 1 == 1 {
        invert_lowest_one(invert_lowest_one(height - 1)) + 1
    } else {
        invert_lowest_one(height)
    }
}

fn invert_lowest_one(n: u32) -> u32 {
    n & n.wrapping_sub(1)
}

/// `floor(2^256 / (target + 1))`, accumulated in 512 bits so it doesn't
/// overflow near `powLimit` on RandomX chains with very large targets.
pub(crate) fn block_proof_u512(bits: u32) -> U512 {
    let target = ExpandedDifficulty::from_compact_saturating(bits);
    let target512 = U512::from(target.as_u256());
    (U512::from(U256::MAX) - target512) / (target512 + U512::one()) + U512::one()
}
