//! The classic Bitcoin 2016-block retarget rule.

use primitive_types::U256;
use tracing::debug;

use crate::parameters::ConsensusParams;
use crate::work::difficulty::{CompactDifficulty, ExpandedDifficulty};

/// A view onto the handful of fields the legacy retarget rule needs from a
/// block index node, so this module doesn't depend on any particular
/// storage representation (see [`crate::block_index`]).
pub trait RetargetBlock {
    fn height(&self) -> u32;
    fn time(&self) -> i64;
    fn bits(&self) -> u32;
}

/// Computes the next `nBits` under the legacy rule, given the predecessor
/// and the first block of its retarget window.
///
/// `first_block` must be the ancestor of `prev` at height
/// `prev.height() + 1 - interval`, i.e. the first block of the window that
/// just closed. Callers obtain it via the block index's ancestor lookup.
pub fn legacy_next_work(
    prev: &impl RetargetBlock,
    first_block: &impl RetargetBlock,
    params: &ConsensusParams,
) -> u32 {
    let actual_timespan = prev.time() - first_block.time();
    let min_timespan = params.pow_target_timespan / 4;
    let max_timespan = params.pow_target_timespan * 4;
    let clamped = actual_timespan.clamp(min_timespan, max_timespan);

    let prev_target = CompactDifficulty::new(prev.bits()).decode().target.as_u256();
    let new_target = prev_target * U256::from(clamped.unsigned_abs())
        / U256::from(params.pow_target_timespan.unsigned_abs());

    let new_target = new_target.min(params.pow_limit);
    debug!(
        actual_timespan,
        clamped, "legacy retarget window closed, new target computed"
    );
    ExpandedDifficulty::from_u256(new_target).to_compact().bits()
}

/// Whether `prev.height() + 1` is a legacy retarget boundary.
pub fn is_retarget_height(prev_height: u32, params: &ConsensusParams) -> bool {
    (prev_height as u64 + 1) % params.legacy_retarget_interval() as u64 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Block {
        height: u32,
        time: i64,
        bits: u32,
    }

    impl RetargetBlock for Block {
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

    fn params() -> ConsensusParams {
        ConsensusParams {
            pow_limit: CompactDifficulty::new(0x1d00_ffff).decode().target.as_u256(),
            pow_target_spacing: 10 * 60,
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
    fn no_constraint_retarget() {
        let prev = Block { height: 32255, time: 1262152739, bits: 0x1d00_ffff };
        let first = Block { height: 30240, time: 1261130161, bits: 0x1d00_ffff };
        assert_eq!(legacy_next_work(&prev, &first, &params()), 0x1d00_d86a);
    }

    #[test]
    fn pow_limit_clamp() {
        let prev = Block { height: 2015, time: 1233061996, bits: 0x1d00_ffff };
        let first = Block { height: 0, time: 1231006505, bits: 0x1d00_ffff };
        assert_eq!(legacy_next_work(&prev, &first, &params()), 0x1d00_ffff);
    }

    #[test]
    fn lower_clamp_fast_window() {
        let prev = Block { height: 68543, time: 1279297671, bits: 0x1c05_a3f4 };
        let first = Block { height: 66528, time: 1279008237, bits: 0x1c05_a3f4 };
        assert_eq!(legacy_next_work(&prev, &first, &params()), 0x1c01_68fd);
    }

    #[test]
    fn upper_clamp_slow_window() {
        let prev = Block { height: 46367, time: 1269211443, bits: 0x1c38_7f6f };
        let first = Block { height: 44352, time: 1263163443, bits: 0x1c38_7f6f };
        assert_eq!(legacy_next_work(&prev, &first, &params()), 0x1d00_e1fd);
    }

    #[test]
    fn retarget_height_detection() {
        let params = params();
        let interval = params.legacy_retarget_interval() as u32;
        assert!(is_retarget_height(interval - 1, &params));
        assert!(!is_retarget_height(interval, &params));
    }
}
