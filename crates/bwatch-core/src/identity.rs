//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers that flow through Bridge
//! Watch. Each identifier is a distinct type; you cannot pass a [`TxHash`]
//! where an [`Address`] is expected.
//!
//! ## Normalization
//!
//! - [`Address`] lowercases `0x`-prefixed hex addresses so that EVM
//!   addresses compare equal regardless of checksum casing. Non-hex
//!   addresses (base58, bech32) are kept verbatim.
//! - [`EthAddress`] is the fixed 20-byte form used for validator and
//!   guardian signer identities.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// A blockchain identifier such as `"ethereum"`, `"solana"` or `"bsc"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    /// Create a chain identifier. Trims whitespace and lowercases.
    pub fn new(id: impl AsRef<str>) -> Result<Self, CoreError> {
        let id = id.as_ref().trim().to_ascii_lowercase();
        if id.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "chain id",
                reason: "must not be empty".into(),
            });
        }
        Ok(Self(id))
    }

    /// The normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChainId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An on-chain account address, normalized for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create an address. `0x`-prefixed values are lowercased.
    pub fn new(addr: impl AsRef<str>) -> Result<Self, CoreError> {
        let addr = addr.as_ref().trim();
        if addr.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "address",
                reason: "must not be empty".into(),
            });
        }
        let normalized = if addr.starts_with("0x") || addr.starts_with("0X") {
            addr.to_ascii_lowercase()
        } else {
            addr.to_string()
        };
        Ok(Self(normalized))
    }

    /// The normalized address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret this address as a 20-byte EVM address, if it is one.
    pub fn to_eth_address(&self) -> Option<EthAddress> {
        EthAddress::from_hex(&self.0).ok()
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl From<EthAddress> for Address {
    fn from(addr: EthAddress) -> Self {
        Self(addr.to_hex())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// TxHash
// ---------------------------------------------------------------------------

/// A transaction hash as reported by the source chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(String);

impl TxHash {
    /// Create a transaction hash. `0x`-prefixed values are lowercased.
    pub fn new(hash: impl AsRef<str>) -> Result<Self, CoreError> {
        let hash = hash.as_ref().trim();
        if hash.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                kind: "transaction hash",
                reason: "must not be empty".into(),
            });
        }
        if hash.starts_with("0x") || hash.starts_with("0X") {
            Ok(Self(hash.to_ascii_lowercase()))
        } else {
            Ok(Self(hash.to_string()))
        }
    }

    /// The normalized hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TxHash {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TxHash> for String {
    fn from(hash: TxHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// EthAddress
// ---------------------------------------------------------------------------

/// A 20-byte Ethereum-style address identifying a guardian or validator.
///
/// Serializes as a lowercase `0x`-prefixed hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create an address from a 20-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 20] = bytes.try_into().map_err(|_| CoreError::InvalidIdentifier {
            kind: "eth address",
            reason: format!("expected 20 bytes, got {}", bytes.len()),
        })?;
        Ok(Self(arr))
    }

    /// Parse a 40-character hex string, with or without `0x` prefix.
    /// Checksum casing is accepted but not enforced.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(CoreError::InvalidIdentifier {
                kind: "eth address",
                reason: format!("expected 40 hex chars, got {}", digits.len()),
            });
        }
        let bytes = hex::decode(digits).map_err(|e| CoreError::InvalidIdentifier {
            kind: "eth address",
            reason: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex rendering.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Serialize for EthAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EthAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EthAddress({})", self.to_hex())
    }
}

impl std::fmt::Display for EthAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_is_lowercased() {
        let id = ChainId::new(" Ethereum ").unwrap();
        assert_eq!(id.as_str(), "ethereum");
    }

    #[test]
    fn empty_chain_id_rejected() {
        assert!(ChainId::new("   ").is_err());
    }

    #[test]
    fn hex_address_is_lowercased() {
        let a = Address::new("0xAbCdEf0000000000000000000000000000000001").unwrap();
        let b = Address::new("0xabcdef0000000000000000000000000000000001").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn base58_address_kept_verbatim() {
        let a = Address::new("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM").unwrap();
        assert_eq!(a.as_str(), "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM");
        assert!(a.to_eth_address().is_none());
    }

    #[test]
    fn eth_address_hex_roundtrip() {
        let hex = "0x58cc3ae5c097b213ce3c81979e1b9f9570746aa5";
        let addr = EthAddress::from_hex(hex).unwrap();
        assert_eq!(addr.to_hex(), hex);
        assert_eq!(addr.to_string(), hex);
    }

    #[test]
    fn eth_address_accepts_checksum_casing_and_no_prefix() {
        let a = EthAddress::from_hex("0x58CC3AE5C097b213cE3c81979e1B9f9570746AA5").unwrap();
        let b = EthAddress::from_hex("58cc3ae5c097b213ce3c81979e1b9f9570746aa5").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn eth_address_wrong_length_rejected() {
        assert!(EthAddress::from_hex("0x1234").is_err());
        assert!(EthAddress::from_slice(&[0u8; 19]).is_err());
    }

    #[test]
    fn eth_address_serde_as_hex_string() {
        let addr = EthAddress::from_bytes([0x11; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(20)));
        let back: EthAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn address_from_eth_address_matches_hex() {
        let eth = EthAddress::from_bytes([0xab; 20]);
        let addr = Address::from(eth);
        assert_eq!(addr.to_eth_address(), Some(eth));
    }
}
