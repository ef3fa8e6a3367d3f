//! # bwatch-crypto — Cryptographic Primitives
//!
//! Provides the building blocks for checking bridge attestations:
//!
//! - **Keccak-256** and the two message framings bridge signers use
//!   (double Keccak for guardian networks, EIP-191 for wallet-signed sets).
//! - **secp256k1 recovery** of the signing Ethereum address from a
//!   65-byte recoverable signature.
//! - **SignerKeyPair** for minting recoverable signatures in fixtures and
//!   tooling.
//!
//! ## Crate Policy
//!
//! - Depends only on `bwatch-core` internally.
//! - No mocking of cryptographic operations in tests. Every signature in
//!   the test suite is a real secp256k1 signature.

pub mod error;
pub mod keccak;
pub mod secp256k1;

pub use error::CryptoError;
pub use keccak::{double_keccak256, eth_signed_message_hash, keccak256};
pub use secp256k1::{address_of, recover_address, RecoverableSignature, SignerKeyPair, SIGNATURE_LEN};
