//! # secp256k1 Signer Recovery
//!
//! Recovers the Ethereum address that produced a 65-byte recoverable ECDSA
//! signature over a 32-byte message hash. This is how bridge attestations
//! are checked: signatures carry no public key, so the verifier recovers
//! one and compares the derived address against the claimed signer.
//!
//! ## Signature Layout
//!
//! `r (32) || s (32) || v (1)`. `v` may be `0`/`1` or the legacy `27`/`28`.
//! High-S signatures are normalized (with the recovery parity flipped)
//! before recovery, so signatures accepted by the EVM `ecrecover`
//! precompile are accepted here.
//!
//! ## Serde
//!
//! [`RecoverableSignature`] serializes as a `0x`-prefixed hex string.

use bwatch_core::EthAddress;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;
use crate::keccak::keccak256;

/// Length of a recoverable signature: `r || s || v`.
pub const SIGNATURE_LEN: usize = 65;

/// A 65-byte recoverable secp256k1 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature(pub [u8; SIGNATURE_LEN]);

impl RecoverableSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy a signature out of a 65-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::MalformedSignature(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// The recovery byte `v`, normalized to `0` or `1`.
    pub fn recovery_byte(&self) -> Result<u8, CryptoError> {
        match self.0[64] {
            v @ (0 | 1) => Ok(v),
            v @ (27 | 28) => Ok(v - 27),
            v => Err(CryptoError::MalformedSignature(format!(
                "recovery byte must be 0, 1, 27 or 28, got {v}"
            ))),
        }
    }

    /// Lowercase `0x`-prefixed hex rendering.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoverableSignature(0x{}...)", hex::encode(&self.0[..4]))
    }
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

/// Recover the Ethereum address that signed `prehash`.
pub fn recover_address(
    prehash: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<EthAddress, CryptoError> {
    let v = signature.recovery_byte()?;
    let sig = Signature::from_slice(&signature.0[..64])
        .map_err(|e| CryptoError::MalformedSignature(format!("invalid r/s: {e}")))?;
    let recid = RecoveryId::from_byte(v)
        .ok_or_else(|| CryptoError::MalformedSignature(format!("invalid recovery id {v}")))?;

    let (sig, recid) = match sig.normalize_s() {
        Some(low_s) => (low_s, RecoveryId::new(!recid.is_y_odd(), recid.is_x_reduced())),
        None => (sig, recid),
    };

    let vk = VerifyingKey::recover_from_prehash(prehash, &sig, recid)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;
    Ok(address_of(&vk))
}

/// Derive the Ethereum address of a public key: the last 20 bytes of
/// `keccak256(uncompressed_point[1..])`.
pub fn address_of(key: &VerifyingKey) -> EthAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    EthAddress::from_bytes(out)
}

// ---------------------------------------------------------------------------
// SignerKeyPair
// ---------------------------------------------------------------------------

/// A secp256k1 key pair that produces bridge-style recoverable signatures.
///
/// Used by fixtures and tooling that need to mint attestations. Does not
/// implement `Serialize`; the private scalar never leaves the struct.
pub struct SignerKeyPair {
    signing_key: SigningKey,
}

impl SignerKeyPair {
    /// Generate a random key pair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand_core::OsRng),
        }
    }

    /// Build a key pair from a 32-byte private scalar.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(seed).map_err(|e| CryptoError::KeyError(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// The Ethereum address of this key.
    pub fn address(&self) -> EthAddress {
        address_of(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte hash, producing `r || s || v` with `v` in `{27, 28}`.
    pub fn sign_prehash(&self, prehash: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (sig, recid) = self
            .signing_key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| CryptoError::KeyError(format!("signing failed: {e}")))?;
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = 27 + recid.to_byte();
        Ok(RecoverableSignature(out))
    }
}

impl std::fmt::Debug for SignerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignerKeyPair({})", self.address())
    }
}
