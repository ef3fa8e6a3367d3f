//! # Bridge Protocols
//!
//! A single [`BridgeProtocol`] tag identifies the cross-chain transfer
//! mechanism that carried a transaction. Every lookup keyed on protocol
//! (validator sets, signature profiles, protocol risk) uses this type.
//!
//! Names outside the known set are preserved in [`BridgeProtocol::Other`]
//! rather than collapsed into `Unknown`: "unknown" is an explicit label
//! reported by the ingestion layer when it could not attribute a transfer.

use serde::{Deserialize, Serialize};

/// A cross-chain bridge protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BridgeProtocol {
    /// Guardian-attested messaging (19 guardians, index-addressed signatures).
    Wormhole,
    /// Validator-attested router (small set, address-addressed signatures).
    Multichain,
    /// Oracle/relayer messaging with no on-message signature set.
    LayerZero,
    /// Liquidity transport built on LayerZero.
    Stargate,
    /// Optimistic relay bridge.
    Across,
    /// Rollup bonder bridge.
    Hop,
    /// Synapse cross-chain AMM bridge.
    Synapse,
    /// Celer cBridge.
    Celer,
    /// The ingestion layer could not attribute the transfer to a protocol.
    Unknown,
    /// Any other protocol, by lowercase name.
    Other(String),
}

impl BridgeProtocol {
    /// Parse a protocol from its name (case-insensitive). Never fails.
    pub fn parse(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "wormhole" => Self::Wormhole,
            "multichain" | "anyswap" => Self::Multichain,
            "layerzero" | "layer_zero" => Self::LayerZero,
            "stargate" => Self::Stargate,
            "across" => Self::Across,
            "hop" => Self::Hop,
            "synapse" => Self::Synapse,
            "celer" | "cbridge" => Self::Celer,
            "" | "unknown" => Self::Unknown,
            _ => Self::Other(lower),
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Wormhole => "wormhole",
            Self::Multichain => "multichain",
            Self::LayerZero => "layerzero",
            Self::Stargate => "stargate",
            Self::Across => "across",
            Self::Hop => "hop",
            Self::Synapse => "synapse",
            Self::Celer => "celer",
            Self::Unknown => "unknown",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for BridgeProtocol {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for BridgeProtocol {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<BridgeProtocol> for String {
    fn from(p: BridgeProtocol) -> Self {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for BridgeProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
