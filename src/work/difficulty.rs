//! Compact (`nBits`) target encoding and the expanded 256-bit target.
//!
//! `CompactDifficulty`/`ExpandedDifficulty` mirror the split the teacher
//! crate uses in its own `work::difficulty` module, with one addition: this
//! crate's retarget rules (legacy and ASERT) produce *new* targets and must
//! re-encode them to compact form, something the teacher's Zcash-derived
//! retarget never needs to do. [`ExpandedDifficulty::to_compact`] supplies
//! that missing direction.

use std::cmp::Ordering;
use std::fmt;

use primitive_types::{U256, U512};

/// A 32-bit "compact bits" value: a floating-point encoding with a 24-bit
/// unsigned mantissa (top bit reserved as a sign flag), an 8-bit exponent,
/// an offset of 3, and a radix of 256.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct CompactDifficulty(pub u32);

impl fmt::Debug for CompactDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompactDifficulty")
            .field(&format_args!("{:#010x}", self.0))
            .finish()
    }
}

/// The result of decoding a [`CompactDifficulty`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DecodeResult {
    pub target: ExpandedDifficulty,
    pub negative: bool,
    pub overflow: bool,
}

impl CompactDifficulty {
    const BASE: u32 = 256;
    const OFFSET: i32 = 3;
    const PRECISION: u32 = 24;
    const SIGN_BIT: u32 = 1 << (CompactDifficulty::PRECISION - 1);
    const UNSIGNED_MANTISSA_MASK: u32 = CompactDifficulty::SIGN_BIT - 1;

    pub const fn new(bits: u32) -> Self {
        CompactDifficulty(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Decodes this value, reporting the `negative`/`overflow` flags
    /// alongside the target rather than collapsing both error cases into
    /// `None` — callers that need PoW-check semantics (reject on either
    /// flag, or on a zero/over-limit target) build that on top; callers
    /// validating consensus parameters need to tell the cases apart.
    pub fn decode(self) -> DecodeResult {
        const SIGN_BIT: u32 = CompactDifficulty::SIGN_BIT;
        const UNSIGNED_MANTISSA_MASK: u32 = CompactDifficulty::UNSIGNED_MANTISSA_MASK;
        const PRECISION: u32 = CompactDifficulty::PRECISION;
        const OFFSET: i32 = CompactDifficulty::OFFSET;

        let mantissa = self.0 & UNSIGNED_MANTISSA_MASK;
        let negative = self.0 & SIGN_BIT == SIGN_BIT && mantissa != 0;
        let exponent = ((self.0 >> PRECISION) as i32) - OFFSET;

        // overflow iff the decoded value would not fit in 256 bits: either
        // the exponent alone pushes it past 2^256, or the top byte carries
        // bits beyond what's representable once normalized.
        let overflow = mantissa != 0
            && (exponent >= 32
                || (exponent == 31 && mantissa > u8::MAX.into())
                || (exponent == 30 && mantissa > u16::MAX.into()));

        if negative || overflow || mantissa == 0 {
            return DecodeResult {
                target: ExpandedDifficulty(U256::zero()),
                negative,
                overflow,
            };
        }

        let (mantissa, exponent) = match (mantissa, exponent) {
            (m, e) if e == 31 => (m << 16, e - 2),
            (m, e) if e == 30 => (m << 8, e - 1),
            (m, e) if e < 0 => (m >> ((e.unsigned_abs()) * 8), 0),
            (m, e) => (m, e),
        };

        let mantissa: U256 = mantissa.into();
        let base: U256 = CompactDifficulty::BASE.into();
        let exponent: U256 = exponent.into();
        let target = mantissa * base.pow(exponent);

        DecodeResult {
            target: ExpandedDifficulty(target),
            negative,
            overflow,
        }
    }
}

/// A 256-bit unsigned target threshold.
///
/// Block hashes, read as little-endian 256-bit integers, must not exceed
/// this value. Only [`ExpandedDifficulty::to_compact`] re-serializes one of
/// these back to an `nBits` value; retarget output always round-trips
/// through this type on its way to a new `CompactDifficulty`.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct ExpandedDifficulty(U256);

impl fmt::Debug for ExpandedDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0; 32];
        self.0.to_little_endian(&mut buf);
        f.debug_tuple("ExpandedDifficulty")
            .field(&hex::encode(buf))
            .finish()
    }
}

impl ExpandedDifficulty {
    pub const fn from_u256(value: U256) -> Self {
        ExpandedDifficulty(value)
    }

    pub const fn as_u256(self) -> U256 {
        self.0
    }

    pub fn from_little_endian_hash(hash: &[u8; 32]) -> Self {
        ExpandedDifficulty(U256::from_little_endian(hash))
    }

    /// Decodes `bits`, treating a negative, overflowing, or zero value as
    /// `powLimit` itself — useful for call sites (chain-work accounting)
    /// that need *some* target rather than a fallible one, matching how the
    /// reference implementation's `GetBlockProof` never fails.
    pub fn from_compact_saturating(bits: u32) -> Self {
        let decoded = CompactDifficulty::new(bits).decode();
        if decoded.negative || decoded.overflow {
            ExpandedDifficulty(U256::zero())
        } else {
            decoded.target
        }
    }

    /// Re-encodes this target to its normalized compact form: `getCompact`
    /// in the original's `arith_uint256`.
    ///
    /// Grounded on the base-256 digit-count/shift approach used by
    /// light-client re-implementations of `GetCompact` (rather than the
    /// teacher's own `difficulty.rs`, which never needs this direction).
    pub fn to_compact(self) -> CompactDifficulty {
        let mut size = ((self.0.bits() as u32) + 7) / 8;
        let mut compact: u32 = if size <= 3 {
            (self.0.low_u32() << (8 * (3 - size))) & 0x00ff_ffff
        } else {
            let shifted = self.0 >> (8 * (size - 3));
            shifted.low_u32() & 0x00ff_ffff
        };

        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }

        compact |= size << 24;
        CompactDifficulty(compact)
    }
}

impl PartialEq<ExpandedDifficulty> for [u8; 32] {
    fn eq(&self, other: &ExpandedDifficulty) -> bool {
        ExpandedDifficulty::from_little_endian_hash(self) == *other
    }
}

impl PartialOrd<ExpandedDifficulty> for [u8; 32] {
    fn partial_cmp(&self, other: &ExpandedDifficulty) -> Option<Ordering> {
        ExpandedDifficulty::from_little_endian_hash(self).partial_cmp(other)
    }
}

/// `floor(2^256 / (target + 1))`: the additive work contribution of a
/// block with the given target, in 512 bits so it cannot overflow near
/// `powLimit` on RandomX chains.
pub fn block_proof(target: ExpandedDifficulty) -> U512 {
    let target512 = U512::from(target.as_u256());
    (U512::from(U256::MAX) - target512) / (target512 + U512::one()) + U512::one()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_bitcoin_genesis_bits() {
        let decoded = CompactDifficulty::new(0x1d00_ffff).decode();
        assert!(!decoded.negative);
        assert!(!decoded.overflow);
        assert_eq!(decoded.target.as_u256(), U256::from(0x00ffffu64) << (8 * (0x1d - 3)));
    }

    #[test]
    fn sign_bit_is_negative() {
        let decoded = CompactDifficulty::new(0x0180_0000).decode();
        assert!(decoded.negative);
    }

    #[test]
    fn zero_mantissa_is_neither_negative_nor_overflow() {
        let decoded = CompactDifficulty::new(0x0480_0000).decode();
        assert!(!decoded.negative);
        assert!(!decoded.overflow);
        assert!(decoded.target.as_u256().is_zero());
    }

    #[test]
    fn large_exponent_overflows() {
        let decoded = CompactDifficulty::new(0x2300_0001).decode();
        assert!(decoded.overflow);
    }

    #[test]
    fn zero_mantissa_with_large_exponent_is_zero_not_overflow() {
        // exponent byte 0x23 decodes to exponent 32, which would overflow
        // `base.pow(exponent)` if the zero-mantissa short circuit didn't
        // run first; a zero mantissa means the overflow flag never fires.
        let decoded = CompactDifficulty::new(0x2300_0000).decode();
        assert!(!decoded.negative);
        assert!(!decoded.overflow);
        assert!(decoded.target.as_u256().is_zero());
    }

    #[test]
    fn round_trips_normalized_compact_values() {
        for bits in [0x1d00_ffffu32, 0x1c05_a3f4, 0x1d00_e1fd, 0x207f_ffff, 0x0300_0001] {
            let decoded = CompactDifficulty::new(bits).decode();
            assert!(!decoded.negative && !decoded.overflow, "bits {bits:#x} must decode cleanly");
            assert_eq!(decoded.target.to_compact().bits(), bits, "round trip for {bits:#x}");
        }
    }

    #[test]
    fn block_proof_of_min_difficulty_is_small() {
        let max_target = CompactDifficulty::new(0x207f_ffff).decode().target;
        let proof = block_proof(max_target);
        assert!(proof > U512::zero());
        assert!(proof < U512::from(u64::MAX));
    }

    proptest! {
        /// Any cleanly-decoding compact value round-trips through
        /// `to_compact`, since `to_compact` always emits the normalized
        /// form `decode` expects.
        #[test]
        fn decode_to_compact_round_trips(bits: CompactDifficulty) {
            let decoded = bits.decode();
            prop_assume!(!decoded.negative && !decoded.overflow);
            let re_encoded = decoded.target.to_compact();
            prop_assert_eq!(re_encoded.decode().target, decoded.target);
        }

        /// `to_compact` never sets the sign bit on a target derived from a
        /// non-negative source, and always normalizes the mantissa so a
        /// second `decode` never reports overflow either.
        #[test]
        fn to_compact_output_never_signals_negative_or_overflow(value: u128) {
            let target = ExpandedDifficulty::from_u256(U256::from(value));
            let redecoded = target.to_compact().decode();
            prop_assert!(!redecoded.negative);
            prop_assert!(!redecoded.overflow);
        }
    }
}
