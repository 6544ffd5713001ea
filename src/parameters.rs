//! Consensus parameters consumed by the proof-of-work engine.
//!
//! The concrete per-chain parameter *tables* (which constants `main` vs.
//! `scashx` use) are an external collaborator — this module only defines the
//! shape of the struct callers populate and pass in.

use primitive_types::U256;

/// The ASERT anchor block, as configured directly rather than discovered by
/// walking back the chain.
///
/// Only the anchor's height, `nBits`, and its *parent's* time are needed —
/// ASERT's absolute formulation measures schedule deviation from the
/// anchor's parent, not the anchor itself (see
/// [`crate::work::asert::next_work_required`]).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AsertAnchor {
    pub height: u32,
    pub bits: u32,
    pub parent_time: i64,
}

/// Consensus parameters read by the retarget/PoW core.
///
/// This is plain data: there is no loader, no file format, and no
/// validation beyond what [`crate::work`] enforces at the point of use — the
/// chain-parameter tables that populate it live outside this crate.
#[derive(Clone, Debug)]
pub struct ConsensusParams {
    /// The maximum allowed target. No block's target may exceed this.
    pub pow_limit: U256,

    /// Desired seconds between blocks.
    pub pow_target_spacing: i64,

    /// Legacy retarget window, in seconds. Must be an integer multiple of
    /// `pow_target_spacing`.
    pub pow_target_timespan: i64,

    /// If true, the target never changes: every `next_work_required` call
    /// returns the predecessor's `nBits` unconditionally.
    pub pow_no_retargeting: bool,

    /// The first height at which ASERT applies instead of the legacy rule.
    pub asert_activation_height: u32,

    /// If present, used directly as the ASERT anchor instead of being
    /// discovered by walking back the chain to `asert_activation_height`.
    pub asert_anchor: Option<AsertAnchor>,

    /// Seconds after which a consistent one-spacing schedule deviation
    /// halves or doubles the ASERT target.
    pub asert_half_life: i64,

    /// Seconds per RandomX key epoch.
    pub randomx_epoch_duration: i64,

    /// Domain-separation prefix for RandomX seed-hash derivation (see
    /// [`crate::work::randomx::seed_hash`]).
    pub randomx_seed_prefix: &'static [u8],

    /// Whether this chain uses RandomX as its proof-of-work algorithm.
    pub is_randomx_chain: bool,

    /// Disables the RandomX fast-mode cache (>=2GB). Intended for
    /// constrained environments (including, notably, test suites).
    pub randomx_fast_mode: bool,
}

impl ConsensusParams {
    /// `powTargetTimespan / powTargetSpacing`: the number of blocks in one
    /// legacy retarget window.
    pub fn legacy_retarget_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }
}
