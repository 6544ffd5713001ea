//! Compatibility shim for the original implementation's process-global
//! `g_isRandomX` flag.
//!
//! The original node toggles a single mutable global to switch header
//! hashing between the classic and RandomX-extended wire formats. This
//! crate's functions take [`crate::parameters::ConsensusParams::is_randomx_chain`]
//! explicitly instead — prefer that. [`RANDOMX_MODE`] exists only for
//! call sites that cannot yet thread the parameter through; it is not read
//! by anything in this crate.
//!
//! # Safety / happens-before
//!
//! Set this once during chain-parameter initialization, before any thread
//! starts reading header hashes. An `Ordering::SeqCst` store paired with a
//! `SeqCst` load gives every reader a happens-before edge with the most
//! recent write, but does not serialize concurrent writers against each
//! other — don't flip it after startup.

use std::sync::atomic::{AtomicBool, Ordering};

/// Deprecated global RandomX-mode flag. See the module documentation.
pub static RANDOMX_MODE: AtomicBool = AtomicBool::new(false);

/// Sets the compatibility flag.
pub fn set_randomx_mode(enabled: bool) {
    RANDOMX_MODE.store(enabled, Ordering::SeqCst);
}

/// Reads the compatibility flag.
pub fn randomx_mode() -> bool {
    RANDOMX_MODE.load(Ordering::SeqCst)
}
