//! Classic (non-RandomX) proof-of-work verification.

use primitive_types::U256;
use tracing::trace;

use crate::parameters::ConsensusParams;
use crate::work::difficulty::CompactDifficulty;

/// Checks that `hash`, read as a little-endian 256-bit integer, satisfies
/// the target encoded by `bits`.
///
/// Returns `false` (never an error) for a negative, overflowing, zero, or
/// above-`powLimit` target — an invalid target fails the check rather than
/// propagating, matching the "invalid target" error kind.
pub fn check_pow_classic(hash: &[u8; 32], bits: u32, params: &ConsensusParams) -> bool {
    let decoded = CompactDifficulty::new(bits).decode();
    if decoded.negative || decoded.overflow {
        trace!(bits, "rejecting negative or overflowing compact target");
        return false;
    }
    let target = decoded.target.as_u256();
    if target.is_zero() || target > params.pow_limit {
        trace!(bits, "rejecting zero or above-limit target");
        return false;
    }

    let hash = U256::from_little_endian(hash);
    hash <= target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConsensusParams {
        ConsensusParams {
            pow_limit: CompactDifficulty::new(0x207f_ffff).decode().target.as_u256(),
            pow_target_spacing: 150,
            pow_target_timespan: 14 * 24 * 60 * 60,
            pow_no_retargeting: false,
            asert_activation_height: u32::MAX,
            asert_anchor: None,
            asert_half_life: 2 * 24 * 60 * 60,
            randomx_epoch_duration: 3600,
            randomx_seed_prefix: b"ScashX/RandomX/Epoch/",
            is_randomx_chain: false,
            randomx_fast_mode: true,
        }
    }

    #[test]
    fn hash_at_or_below_target_passes() {
        let params = params();
        let hash = [0u8; 32];
        assert!(check_pow_classic(&hash, 0x207f_ffff, &params));
    }

    #[test]
    fn hash_above_target_fails() {
        let params = params();
        let hash = [0xffu8; 32];
        assert!(!check_pow_classic(&hash, 0x1d00_ffff, &params));
    }

    #[test]
    fn negative_bits_always_fail() {
        let params = params();
        assert!(!check_pow_classic(&[0u8; 32], 0x0180_0000, &params));
    }

    #[test]
    fn overflowing_bits_fail() {
        let params = params();
        assert!(!check_pow_classic(&[0u8; 32], 0x2300_0001, &params));
    }
}
