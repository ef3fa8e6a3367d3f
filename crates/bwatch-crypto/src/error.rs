//! # Crypto Errors

use thiserror::Error;

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A signature had the wrong length or an out-of-range field.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Public-key recovery failed for a well-formed signature.
    #[error("signer recovery failed: {0}")]
    RecoveryFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// A message could not be turned into a hash.
    #[error("message hash error: {0}")]
    MessageHash(String),
}
