//! # Keccak-256 Message Hashing
//!
//! The hash functions bridge signers actually sign over:
//!
//! - [`keccak256`]: plain Keccak-256 (the pre-standard SHA-3 padding used by
//!   Ethereum), also used for address derivation.
//! - [`double_keccak256`]: guardian networks sign the hash of the hash of
//!   the message body.
//! - [`eth_signed_message_hash`]: EIP-191 `personal_sign` framing of a
//!   32-byte digest, used by validator sets that sign with wallet tooling.

use sha3::{Digest, Keccak256};

/// EIP-191 prefix for a 32-byte payload.
const EIP191_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// `keccak256(keccak256(data))`.
pub fn double_keccak256(data: &[u8]) -> [u8; 32] {
    keccak256(&keccak256(data))
}

/// EIP-191 personal-message hash of a 32-byte digest:
/// `keccak256("\x19Ethereum Signed Message:\n32" || digest)`.
pub fn eth_signed_message_hash(digest: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(EIP191_PREFIX);
    hasher.update(digest);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}
