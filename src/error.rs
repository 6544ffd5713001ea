//! Error types for the proof-of-work engine.
//!
//! Verification predicates ([`crate::work::classic::check_pow_classic`],
//! [`crate::work::randomx::check_pow_randomx`]) never return `Err` on
//! well-formed input: an invalid target or a failing hash comparison is
//! reported as `false`, per the propagation policy in the engine's
//! specification. `PowError` is reserved for programmer errors (misusing the
//! mining API) and for transient RandomX resource failures.

use randomx_rs::RandomXError;

/// Errors raised by the proof-of-work engine's fallible entry points.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PowError {
    /// [`crate::work::randomx::VerifyMode::Mining`] was used without supplying
    /// an `out_hash` sink. This is a programmer error: the mining mode's
    /// entire purpose is to report the freshly computed RandomX hash back to
    /// the caller.
    #[error("RandomX mining verification requires an out_hash sink")]
    InvalidArgument,

    /// Failed to construct a RandomX cache for the requested epoch key.
    #[error("failed to create RandomX cache: {0}")]
    CacheCreation(RandomXError),

    /// Failed to construct a RandomX VM bound to a cache.
    #[error("failed to create RandomX VM: {0}")]
    VmCreation(RandomXError),

    /// Failed to compute a RandomX hash with an initialized VM.
    #[error("failed to calculate RandomX hash: {0}")]
    HashCalculation(RandomXError),
}

impl From<RandomXError> for PowError {
    fn from(err: RandomXError) -> Self {
        PowError::HashCalculation(err)
    }
}
