//! Proof-of-work and difficulty-retarget engine for the ScashX chain family.
//!
//! This crate evaluates whether a block header satisfies a chain's
//! proof-of-work target (classic hash comparison, or RandomX commitment
//! verification) and computes the next block's target using either the
//! classical Bitcoin 2016-block retarget rule or the ASERT
//! (Absolutely Scheduled Exponentially Rising Targets) algorithm.
//!
//! Block storage, networking, the mempool, wallet, RPC surface, and the
//! concrete per-chain parameter tables all live outside this crate; it only
//! defines the shapes those collaborators feed in ([`ConsensusParams`],
//! [`BlockHeader`], [`BlockIndex`]) and the pure functions that operate on
//! them.

pub mod block;
pub mod block_index;
pub mod chain_type;
pub mod compat;
pub mod error;
pub mod parameters;
pub mod work;

pub use block::BlockHeader;
pub use block_index::BlockIndex;
pub use chain_type::ChainType;
pub use error::PowError;
pub use parameters::{AsertAnchor, ConsensusParams};
