//! RandomX proof-of-work integration: epoch/seed derivation, commitment
//! computation, and the three verification modes.
//!
//! The RandomX VM itself is treated as an opaque primitive (`randomx-rs`);
//! this module owns only the epoch-keyed cache/VM lifecycle and the
//! consensus-facing verification contract.

use std::collections::VecDeque;
use std::sync::Mutex;

use randomx_rs::{RandomXCache, RandomXFlag, RandomXVM};
use tracing::{debug, trace};

use crate::block::{sha256d, BlockHeader};
use crate::error::PowError;
use crate::parameters::ConsensusParams;
use crate::work::difficulty::{CompactDifficulty, ExpandedDifficulty};

/// How a RandomX-bearing header is checked against its target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VerifyMode {
    /// Trust `header.hash_randomx`; only recompute and check the
    /// commitment. Safe only for headers already known-good (e.g. read
    /// back from a validated chain) — a crafted `hash_randomx` can pass
    /// commitment verification while not actually satisfying the VM.
    CommitmentOnly,
    /// Recompute `hash_randomx` from the VM and require it to match the
    /// header's claimed value, then check the commitment.
    Full,
    /// Always recompute `hash_randomx`, write it to `out_hash`, then check
    /// the commitment. Used when mining: the header's own field is
    /// whatever placeholder the caller is trying.
    Mining,
}

/// `floor(time / duration)`: the RandomX key-rotation epoch for a block
/// timestamp.
pub fn epoch(time: i64, duration: i64) -> i64 {
    time.div_euclid(duration)
}

/// `sha256d(prefix || decimal_ascii(epoch))`, the domain-separated seed
/// hash from which the RandomX cache key for an epoch is derived.
pub fn seed_hash(prefix: &[u8], epoch: i64) -> [u8; 32] {
    let mut input = Vec::with_capacity(prefix.len() + 20);
    input.extend_from_slice(prefix);
    input.extend_from_slice(epoch.to_string().as_bytes());
    sha256d(&input)
}

/// A small LRU cache of RandomX VMs keyed by epoch.
///
/// Construction is blocking and, in fast mode, allocates multiple
/// gigabytes; callers needing verification during construction simply
/// wait, matching the reference implementation's synchronous cache
/// lifecycle.
pub struct EpochCache {
    capacity: usize,
    entries: Mutex<VecDeque<(i64, RandomXVM)>>,
}

impl EpochCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Runs `f` with the VM for `epoch`, constructing it (and evicting the
    /// least-recently-used entry if the cache is full) if necessary.
    fn with_vm<R>(
        &self,
        epoch: i64,
        prefix: &[u8],
        fast_mode: bool,
        f: impl FnOnce(&RandomXVM) -> R,
    ) -> Result<R, PowError> {
        let mut entries = self.entries.lock().expect("epoch cache mutex poisoned");

        if let Some(pos) = entries.iter().position(|(e, _)| *e == epoch) {
            trace!(epoch, "randomx cache hit");
            let entry = entries.remove(pos).expect("position came from iter");
            entries.push_back(entry);
            let result = f(&entries.back().expect("just pushed").1);
            return Ok(result);
        }

        trace!(epoch, "randomx cache miss, constructing VM");
        let key = seed_hash(prefix, epoch);
        let flags = if fast_mode {
            RandomXFlag::get_recommended_flags() | RandomXFlag::FLAG_FULL_MEM
        } else {
            RandomXFlag::get_recommended_flags()
        };
        let cache = RandomXCache::new(flags, &key).map_err(PowError::CacheCreation)?;
        let vm = RandomXVM::new(flags, Some(cache), None).map_err(PowError::VmCreation)?;

        if entries.len() >= self.capacity {
            let evicted = entries.pop_front();
            if let Some((evicted_epoch, _)) = evicted {
                debug!(evicted_epoch, "evicted randomx cache entry");
            }
        }
        entries.push_back((epoch, vm));
        let result = f(&entries.back().expect("just pushed").1);
        Ok(result)
    }
}

impl Default for EpochCache {
    /// The reference cache holds the current and previous epoch.
    fn default() -> Self {
        Self::new(2)
    }
}

/// Computes the commitment binding a header (with `hash_randomx` zeroed)
/// and a RandomX hash, using `rx_hash` in place of the header's own field
/// when provided.
pub fn get_randomx_commitment(
    header: &BlockHeader,
    rx_hash_override: Option<[u8; 32]>,
    cache: &EpochCache,
    params: &ConsensusParams,
) -> Result<[u8; 32], PowError> {
    let rx_hash = rx_hash_override
        .or(header.hash_randomx)
        .ok_or(PowError::InvalidArgument)?;
    let header_bytes = header.serialize_with_zeroed_randomx();
    let e = epoch(header.time.into(), params.randomx_epoch_duration);

    cache.with_vm(e, params.randomx_seed_prefix, params.randomx_fast_mode, |vm| {
        vm.calculate_commitment(&header_bytes, &rx_hash)
            .map(|commitment| {
                let mut out = [0u8; 32];
                out.copy_from_slice(&commitment[..32]);
                out
            })
            .map_err(PowError::HashCalculation)
    })?
}

/// Verifies a RandomX-chain header's proof of work.
///
/// `out_hash`, when provided, receives the freshly computed `hash_randomx`
/// on success. In [`VerifyMode::Mining`] it is always written with whatever
/// hash was computed, even along a failing path; callers must not rely on
/// its value after a failed mining call.
pub fn check_pow_randomx(
    header: &BlockHeader,
    params: &ConsensusParams,
    mode: VerifyMode,
    cache: &EpochCache,
    mut out_hash: Option<&mut [u8; 32]>,
) -> Result<bool, PowError> {
    if mode == VerifyMode::Mining && out_hash.is_none() {
        return Err(PowError::InvalidArgument);
    }

    let decoded = CompactDifficulty::new(header.bits).decode();
    if decoded.negative || decoded.overflow {
        return Ok(false);
    }
    let target = decoded.target.as_u256();
    if target.is_zero() || target > params.pow_limit {
        return Ok(false);
    }

    let effective_hash = match mode {
        VerifyMode::CommitmentOnly => match header.hash_randomx {
            Some(hash) => hash,
            None => return Ok(false),
        },
        VerifyMode::Full | VerifyMode::Mining => {
            let header_bytes = header.serialize_with_zeroed_randomx();
            let e = epoch(header.time.into(), params.randomx_epoch_duration);
            let computed = cache.with_vm(
                e,
                params.randomx_seed_prefix,
                params.randomx_fast_mode,
                |vm| {
                    vm.calculate_hash(&header_bytes).map(|hash| {
                        let mut out = [0u8; 32];
                        out.copy_from_slice(&hash[..32]);
                        out
                    })
                },
            )??;

            if mode == VerifyMode::Full {
                match header.hash_randomx {
                    Some(claimed) if claimed == computed => {}
                    _ => return Ok(false),
                }
            }
            computed
        }
    };

    if mode == VerifyMode::Mining {
        if let Some(out) = out_hash.as_deref_mut() {
            *out = effective_hash;
        }
    }

    let commitment = get_randomx_commitment(header, Some(effective_hash), cache, params)?;
    let commitment = ExpandedDifficulty::from_little_endian_hash(&commitment);
    let passed = commitment.as_u256() <= target;

    if passed && mode != VerifyMode::Mining {
        if let Some(out) = out_hash.as_deref_mut() {
            *out = effective_hash;
        }
    }
    Ok(passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_matches_literal_vectors() {
        assert_eq!(epoch(1_707_328_799, 3600), 474_257);
        assert_eq!(epoch(1_707_328_800, 3600), 474_258);
    }

    #[test]
    fn seed_hash_matches_literal_vectors() {
        let prefix = b"ScashX/RandomX/Epoch/";
        assert_eq!(
            hex::encode(seed_hash(prefix, 1)),
            "00dbf089477a1cd4ac7d64a81595ab22fe1e0e045954d0635f4b954bc3b3df00"
        );
        assert_eq!(
            hex::encode(seed_hash(prefix, 999)),
            "82107e0e65b970e0287a89f1afa78cc95a78bd755813ee481214152e295d634c"
        );
    }

    #[test]
    fn mining_without_out_hash_is_invalid_argument() {
        let header = BlockHeader {
            version: 1,
            hash_prev_block: [0; 32],
            hash_merkle_root: [0; 32],
            time: 0,
            bits: 0x207f_ffff,
            nonce: 0,
            hash_randomx: Some([0; 32]),
        };
        let params = ConsensusParams {
            pow_limit: CompactDifficulty::new(0x207f_ffff).decode().target.as_u256(),
            pow_target_spacing: 150,
            pow_target_timespan: 14 * 24 * 60 * 60,
            pow_no_retargeting: false,
            asert_activation_height: 0,
            asert_anchor: None,
            asert_half_life: 2 * 24 * 60 * 60,
            randomx_epoch_duration: 3600,
            randomx_seed_prefix: b"ScashX/RandomX/Epoch/",
            is_randomx_chain: true,
            randomx_fast_mode: false,
        };
        let cache = EpochCache::default();
        let result = check_pow_randomx(&header, &params, VerifyMode::Mining, &cache, None);
        assert!(matches!(result, Err(PowError::InvalidArgument)));
    }

    #[test]
    fn commitment_only_requires_a_hash() {
        let header = BlockHeader {
            version: 1,
            hash_prev_block: [0; 32],
            hash_merkle_root: [0; 32],
            time: 0,
            bits: 0x207f_ffff,
            nonce: 0,
            hash_randomx: None,
        };
        let params = ConsensusParams {
            pow_limit: CompactDifficulty::new(0x207f_ffff).decode().target.as_u256(),
            pow_target_spacing: 150,
            pow_target_timespan: 14 * 24 * 60 * 60,
            pow_no_retargeting: false,
            asert_activation_height: 0,
            asert_anchor: None,
            asert_half_life: 2 * 24 * 60 * 60,
            randomx_epoch_duration: 3600,
            randomx_seed_prefix: b"ScashX/RandomX/Epoch/",
            is_randomx_chain: true,
            randomx_fast_mode: false,
        };
        let cache = EpochCache::default();
        let result = check_pow_randomx(&header, &params, VerifyMode::CommitmentOnly, &cache, None);
        assert!(matches!(result, Ok(false)));
    }
}
