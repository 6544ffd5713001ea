//! Top-level retarget dispatch, the permitted-transition sanity predicate,
//! and work-equivalent time.
//!
//! [`next_work_required`] is the one entry point most callers want: given a
//! predecessor and the consensus parameters, it picks the legacy or ASERT
//! rule (or no retarget at all) the way the reference dispatcher does.

use std::sync::Mutex;

use primitive_types::U256;
use tracing::debug;

use crate::block_index::{BlockIndex, BlockIndexArena, BlockIndexHandle};
use crate::parameters::{AsertAnchor, ConsensusParams};
use crate::work::difficulty::{self, CompactDifficulty, ExpandedDifficulty};
use crate::work::{asert, legacy};
use crate::work::legacy::RetargetBlock;

impl RetargetBlock for BlockIndex {
    fn height(&self) -> u32 {
        self.height
    }
    fn time(&self) -> i64 {
        self.time
    }
    fn bits(&self) -> u32 {
        self.bits
    }
}

/// A block-index graph dispatch operates over: random access by handle,
/// ancestor-by-height lookup, and one step to a node's predecessor.
/// [`BlockIndexArena`] implements this below; a caller backed by its own
/// storage implements it the same way instead of adopting the arena.
pub trait BlockSource {
    type Handle: Copy;
    type Node: RetargetBlock + Copy;

    fn node(&self, handle: Self::Handle) -> Self::Node;
    fn ancestor(&self, from: Self::Handle, height: u32) -> Option<Self::Handle>;
    fn parent(&self, handle: Self::Handle) -> Option<Self::Handle>;
}

impl BlockSource for BlockIndexArena {
    type Handle = BlockIndexHandle;
    type Node = BlockIndex;

    fn node(&self, handle: BlockIndexHandle) -> BlockIndex {
        *BlockIndexArena::get(self, handle)
    }

    fn ancestor(&self, from: BlockIndexHandle, height: u32) -> Option<BlockIndexHandle> {
        BlockIndexArena::ancestor(self, from, height)
    }

    fn parent(&self, handle: BlockIndexHandle) -> Option<BlockIndexHandle> {
        BlockIndexArena::get(self, handle).prev()
    }
}

/// Caches the dynamically-discovered ASERT anchor so repeated
/// [`next_work_required`] calls on the same chain don't re-walk the index
/// every time. Unused when [`ConsensusParams::asert_anchor`] is configured
/// directly — that path needs no discovery at all.
#[derive(Default)]
pub struct AsertAnchorCache(Mutex<Option<AsertAnchor>>);

impl AsertAnchorCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_discover(&self, discover: impl FnOnce() -> AsertAnchor) -> AsertAnchor {
        let mut guard = self.0.lock().expect("asert anchor cache mutex poisoned");
        if let Some(anchor) = *guard {
            return anchor;
        }
        let anchor = discover();
        *guard = Some(anchor);
        anchor
    }
}

fn resolve_asert_anchor<S: BlockSource>(
    source: &S,
    prev: S::Handle,
    params: &ConsensusParams,
    cache: &AsertAnchorCache,
) -> AsertAnchor {
    if let Some(anchor) = params.asert_anchor {
        return anchor;
    }

    cache.get_or_discover(|| {
        let anchor_handle = source
            .ancestor(prev, params.asert_activation_height)
            .expect("prev must already be at or past the ASERT activation height");
        let anchor_node = source.node(anchor_handle);
        // The dispatcher must never read the anchor's own `prev.bits` (it
        // predates activation and is meaningless); only its parent's time
        // is needed, and a genesis anchor simply has no schedule to
        // deviate from yet.
        let parent_time = match source.parent(anchor_handle) {
            Some(parent) => source.node(parent).time(),
            None => anchor_node.time(),
        };
        AsertAnchor {
            height: anchor_node.height(),
            bits: anchor_node.bits(),
            parent_time,
        }
    })
}

/// Computes the next block's `nBits` given its predecessor.
///
/// `anchor_cache` is consulted only when `params.asert_anchor` is unset;
/// pass a fresh [`AsertAnchorCache`] per chain tracked, not per call.
pub fn next_work_required<S: BlockSource>(
    source: &S,
    prev: S::Handle,
    params: &ConsensusParams,
    anchor_cache: &AsertAnchorCache,
) -> u32 {
    let prev_node = source.node(prev);

    if params.pow_no_retargeting {
        return prev_node.bits();
    }

    let next_height = prev_node.height() + 1;

    if next_height >= params.asert_activation_height {
        debug!(next_height, "asert retarget selected");
        let anchor = resolve_asert_anchor(source, prev, params, anchor_cache);
        return asert::next_work_required(&prev_node, &anchor, params);
    }

    if legacy::is_retarget_height(prev_node.height(), params) {
        debug!(next_height, "legacy retarget selected");
        let interval = params.legacy_retarget_interval() as u32;
        let first_height = next_height - interval;
        let first_handle = source
            .ancestor(prev, first_height)
            .expect("legacy retarget window's first block must be reachable from prev");
        let first_block = source.node(first_handle);
        return legacy::legacy_next_work(&prev_node, &first_block, params);
    }

    prev_node.bits()
}

/// Whether `next_bits` is a transition the rules allow at `height`, given
/// only `prev_bits` — without recomputing a whole legacy window or walking
/// back to an ASERT anchor. `height` is the candidate block's height (the
/// predecessor's height plus one), matching the reference's own signature.
///
/// At a non-retarget legacy height, or once `pow_no_retargeting` applies,
/// the only permitted transition is equality. At a legacy retarget height
/// this enforces the same 4x/0.25x clamp `legacy_next_work` computes, but
/// against `prev_bits`'s target directly rather than the window's actual
/// timespan — a caller without the window handy still rejects anything
/// outside the clamp's reach. Once ASERT has activated, every height can
/// retarget; lacking the anchor here, this predicate falls back to the
/// same clamp as a conservative bound rather than ASERT's exact
/// prescription, which only a full [`next_work_required`] call can verify.
pub fn permitted_transition(params: &ConsensusParams, height: u32, prev_bits: u32, next_bits: u32) -> bool {
    if params.pow_no_retargeting {
        return next_bits == prev_bits;
    }

    let is_asert = height >= params.asert_activation_height;
    let is_legacy_retarget = height % (params.legacy_retarget_interval() as u32) == 0;

    if !is_asert && !is_legacy_retarget {
        return next_bits == prev_bits;
    }

    let prev_decoded = CompactDifficulty::new(prev_bits).decode();
    let next_decoded = CompactDifficulty::new(next_bits).decode();
    if prev_decoded.negative || prev_decoded.overflow || next_decoded.negative || next_decoded.overflow {
        return false;
    }

    let next_target = next_decoded.target.as_u256();
    if next_target.is_zero() || next_target > params.pow_limit {
        return false;
    }

    let prev_target = prev_decoded.target.as_u256();
    let upper = (prev_target * U256::from(4u8)).min(params.pow_limit);
    let lower = (prev_target / U256::from(4u8)).max(U256::one());

    // Round both bounds through a compact re-encoding, matching the
    // reference's comparison against normalized (not raw) targets.
    let upper = ExpandedDifficulty::from_u256(upper).to_compact().decode().target.as_u256();
    let lower = ExpandedDifficulty::from_u256(lower).to_compact().decode().target.as_u256();

    next_target <= upper && next_target >= lower
}

/// The signed time offset that, given the tip's observed work rate, would
/// account for the chain-work difference between `a` and `b`:
/// `(a.chainWork - b.chainWork) * spacing / tip's work-per-block`.
pub fn get_block_proof_equivalent_time(
    a: &BlockIndex,
    b: &BlockIndex,
    tip: &BlockIndex,
    params: &ConsensusParams,
) -> i64 {
    let (diff, sign) = if a.chain_work() >= b.chain_work() {
        (a.chain_work() - b.chain_work(), 1i64)
    } else {
        (b.chain_work() - a.chain_work(), -1i64)
    };

    let tip_target = ExpandedDifficulty::from_compact_saturating(tip.bits);
    let tip_proof = difficulty::block_proof(tip_target);
    if tip_proof.is_zero() {
        return 0;
    }

    let scaled = diff * primitive_types::U512::from(params.pow_target_spacing.unsigned_abs()) / tip_proof;
    if scaled.bits() > 63 {
        return sign.saturating_mul(i64::MAX);
    }
    sign * (scaled.low_u64() as i64)
}
