//! Block header wire format and hashing.
//!
//! On classic chains a header is the familiar 80-byte Bitcoin layout. On
//! RandomX chains it is extended with a 32-byte `hash_randomx` field, and
//! the block hash is computed over all 112 bytes — toggling
//! [`crate::parameters::ConsensusParams::is_randomx_chain`] therefore changes
//! a header's hash, including the genesis header's.

use sha2::{Digest, Sha256};

/// A block header, with an optional RandomX commitment hash.
///
/// `hash_randomx` is `None` on classic chains and `Some` on RandomX chains;
/// which is which is a property of the chain, not of any individual header,
/// so callers are expected to keep this consistent with
/// [`crate::parameters::ConsensusParams::is_randomx_chain`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlockHeader {
    pub version: u32,
    pub hash_prev_block: [u8; 32],
    pub hash_merkle_root: [u8; 32],
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    pub hash_randomx: Option<[u8; 32]>,
}

impl BlockHeader {
    /// The serialized size of a classic (non-RandomX) header.
    pub const CLASSIC_LEN: usize = 4 + 32 + 32 + 4 + 4 + 4;

    /// The serialized size of a RandomX header (classic header plus the
    /// `hash_randomx` field).
    pub const RANDOMX_LEN: usize = Self::CLASSIC_LEN + 32;

    /// Serializes the header to its wire form. `hash_randomx` is included
    /// iff it is `Some`, regardless of what chain the header is destined
    /// for — callers that need the "zeroed RandomX field" form used by
    /// commitment computation should use
    /// [`BlockHeader::serialize_with_zeroed_randomx`] instead.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::RANDOMX_LEN);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.hash_prev_block);
        out.extend_from_slice(&self.hash_merkle_root);
        out.extend_from_slice(&self.time.to_le_bytes());
        out.extend_from_slice(&self.bits.to_le_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        if let Some(hash_randomx) = self.hash_randomx {
            out.extend_from_slice(&hash_randomx);
        }
        out
    }

    /// Serializes the header with its `hash_randomx` field zeroed, as
    /// required when computing a RandomX commitment (the commitment must
    /// bind the hash rather than being circular).
    pub fn serialize_with_zeroed_randomx(&self) -> Vec<u8> {
        let mut zeroed = *self;
        zeroed.hash_randomx = zeroed.hash_randomx.map(|_| [0u8; 32]);
        zeroed.serialize()
    }

    /// The classic block hash: `sha256d` of the serialized header.
    ///
    /// On RandomX chains this includes the `hash_randomx` field, so it
    /// differs from the classic-chain hash of an otherwise-identical header
    /// (including at genesis).
    pub fn hash(&self) -> [u8; 32] {
        sha256d(&self.serialize())
    }
}

/// Double SHA-256, as used throughout the Bitcoin header-hashing and
/// RandomX seed-hash derivation.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}
