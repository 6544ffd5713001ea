//! Proof-of-work verification and difficulty retarget.
//!
//! Submodules split along the same lines as the reference: [`difficulty`]
//! owns the compact/expanded target types shared by everything else,
//! [`classic`] and [`randomx`] own the two verification algorithms, and
//! [`legacy`]/[`asert`] own the two retarget rules. [`dispatch`] is the
//! glue a caller actually calls: it picks which retarget rule applies to a
//! given height and resolves the ASERT anchor.

pub mod asert;
pub mod classic;
pub mod difficulty;
pub mod dispatch;
pub mod legacy;
pub mod randomx;

pub use difficulty::{block_proof, CompactDifficulty, ExpandedDifficulty};
pub use dispatch::{
    get_block_proof_equivalent_time, next_work_required, permitted_transition, AsertAnchorCache,
    BlockSource,
};
