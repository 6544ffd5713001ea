//! The chain-type tag and its string representation.
//!
//! Mirrors the chain-selection enum every Bitcoin-derived node carries
//! (`ChainType` in the upstream C++ implementation this crate's ASERT and
//! RandomX support were distilled from), extended with the three RandomX
//! chain variants.

use std::fmt;

/// The recognized chains. The RandomX variants (`ScashX*`) are the only ones
/// for which [`crate::parameters::ConsensusParams::is_randomx_chain`] may be
/// `true`; that is a property of the caller's parameter table, not of this
/// enum, so it is not encoded here.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ChainType {
    Main,
    Testnet,
    Testnet4,
    Signet,
    Regtest,
    ScashXMain,
    ScashXTestnet,
    ScashXRegtest,
}

impl ChainType {
    /// All chain types, in the order they're defined.
    pub const ALL: [ChainType; 8] = [
        ChainType::Main,
        ChainType::Testnet,
        ChainType::Testnet4,
        ChainType::Signet,
        ChainType::Regtest,
        ChainType::ScashXMain,
        ChainType::ScashXTestnet,
        ChainType::ScashXRegtest,
    ];

    /// Returns the canonical string for this chain type. Never fails.
    pub const fn as_str(self) -> &'static str {
        match self {
            ChainType::Main => "main",
            ChainType::Testnet => "test",
            ChainType::Testnet4 => "testnet4",
            ChainType::Signet => "signet",
            ChainType::Regtest => "regtest",
            ChainType::ScashXMain => "scashx",
            ChainType::ScashXTestnet => "scashxtestnet",
            ChainType::ScashXRegtest => "scashxregtest",
        }
    }

    /// Parses a chain type from its canonical string. Returns `None` for any
    /// string that isn't one of the recognized chain names, rather than
    /// panicking — this type is reachable from CLI/config input at the
    /// caller, and the only safe behavior at that boundary is to report
    /// "not present", not abort.
    pub fn from_str_opt(chain: &str) -> Option<ChainType> {
        Some(match chain {
            "main" => ChainType::Main,
            "test" => ChainType::Testnet,
            "testnet4" => ChainType::Testnet4,
            "signet" => ChainType::Signet,
            "regtest" => ChainType::Regtest,
            "scashx" => ChainType::ScashXMain,
            "scashxtestnet" => ChainType::ScashXTestnet,
            "scashxregtest" => ChainType::ScashXRegtest,
            _ => return None,
        })
    }

    /// Whether this chain type uses RandomX as its proof-of-work algorithm.
    pub const fn is_randomx(self) -> bool {
        matches!(
            self,
            ChainType::ScashXMain | ChainType::ScashXTestnet | ChainType::ScashXRegtest
        )
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChainType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainType::from_str_opt(s).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_variant() {
        for chain in ChainType::ALL {
            assert_eq!(ChainType::from_str_opt(chain.as_str()), Some(chain));
        }
    }

    #[test]
    fn unknown_string_is_none() {
        assert_eq!(ChainType::from_str_opt("not-a-chain"), None);
    }

    #[test]
    fn randomx_chains_are_tagged() {
        assert!(ChainType::ScashXMain.is_randomx());
        assert!(ChainType::ScashXTestnet.is_randomx());
        assert!(ChainType::ScashXRegtest.is_randomx());
        assert!(!ChainType::Main.is_randomx());
        assert!(!ChainType::Regtest.is_randomx());
    }

    #[test]
    fn canonical_strings_match_reference_implementation() {
        assert_eq!(ChainType::Main.as_str(), "main");
        assert_eq!(ChainType::Testnet.as_str(), "test");
        assert_eq!(ChainType::Testnet4.as_str(), "testnet4");
        assert_eq!(ChainType::Signet.as_str(), "signet");
        assert_eq!(ChainType::Regtest.as_str(), "regtest");
        assert_eq!(ChainType::ScashXMain.as_str(), "scashx");
        assert_eq!(ChainType::ScashXTestnet.as_str(), "scashxtestnet");
        assert_eq!(ChainType::ScashXRegtest.as_str(), "scashxregtest");
    }
}
