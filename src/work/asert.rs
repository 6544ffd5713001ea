//! ASERT (Absolutely Scheduled Exponentially Rising Targets) retarget.
//!
//! Every block's target is set so that, had the chain been exactly on
//! schedule since the anchor, the target would equal the anchor's; observed
//! schedule deviation raises or lowers it exponentially with a configured
//! half-life. The cubic fixed-point approximation below is consensus, not
//! an implementation detail — do not replace it with a floating-point
//! computation, even though the reference tests check it against one.

use primitive_types::{U256, U512};
use tracing::trace;

use crate::parameters::{AsertAnchor, ConsensusParams};
use crate::work::difficulty::{CompactDifficulty, ExpandedDifficulty};
pub use crate::work::legacy::RetargetBlock;

/// Computes the ASERT-prescribed target directly, matching the reference
/// `CalculateASERT(refTarget, targetSpacing, timeDiff, heightDiff, powLimit, halfLife)`
/// signature — most callers want [`next_work_required`] instead, which
/// derives `timeDiff`/`heightDiff` from an anchor and a predecessor.
pub fn calculate_asert(
    ref_target: ExpandedDifficulty,
    target_spacing: i64,
    time_diff: i64,
    height_diff: i64,
    pow_limit: U256,
    half_life: i64,
) -> ExpandedDifficulty {
    let exponent = ((time_diff - target_spacing * (height_diff + 1)) * 65536) / half_life;
    let mut shifts = exponent >> 16;
    let frac = exponent & 0xffff;

    let frac = frac as i128;
    let factor = (195_766_423_245_049i128 * frac
        + 971_821_376i128 * frac * frac
        + 5127i128 * frac * frac * frac
        + (1i128 << 47))
        >> 48;
    // factor is in [0, 2^16): the approximation of 2^(frac/2^16) * 2^16 - 2^16.
    let multiplier = U512::from(65536u64 + factor as u64);

    let ref_target: U512 = U512::from(ref_target.as_u256());
    let mut next_target = ref_target * multiplier;
    shifts -= 16;

    let overflowed = if shifts >= 0 {
        let shift = shifts as u32;
        if bit_length_512(next_target) as u32 + shift > 512 {
            true
        } else {
            next_target <<= shift;
            false
        }
    } else {
        next_target >>= (-shifts) as u32;
        false
    };

    let pow_limit_512 = U512::from(pow_limit);
    if overflowed || next_target > pow_limit_512 {
        trace!("asert target saturated at powLimit");
        return ExpandedDifficulty::from_u256(pow_limit);
    }
    if next_target.is_zero() {
        trace!("asert target saturated at 1");
        return ExpandedDifficulty::from_u256(U256::one());
    }

    ExpandedDifficulty::from_u256(u512_to_u256_saturating(next_target))
}

fn bit_length_512(value: U512) -> usize {
    (512 - value.leading_zeros()) as usize
}

fn u512_to_u256_saturating(value: U512) -> U256 {
    let mut bytes = [0u8; 64];
    value.to_little_endian(&mut bytes);
    U256::from_little_endian(&bytes[..32])
}

/// Computes the next `nBits` from a predecessor and the resolved anchor.
///
/// `anchor` is the anchor block itself; `anchor_parent_time` is its
/// *parent's* time, since ASERT's absolute formulation measures schedule
/// deviation from the anchor's parent, not the anchor.
pub fn next_work_required(
    prev: &impl RetargetBlock,
    anchor: &AsertAnchor,
    params: &ConsensusParams,
) -> u32 {
    let ref_target = CompactDifficulty::new(anchor.bits).decode().target;
    let height_diff = i64::from(prev.height()) - i64::from(anchor.height);
    let time_diff = prev.time() - anchor.parent_time;

    let target = calculate_asert(
        ref_target,
        params.pow_target_spacing,
        time_diff,
        height_diff,
        params.pow_limit,
        params.asert_half_life,
    );
    target.to_compact().bits()
}
