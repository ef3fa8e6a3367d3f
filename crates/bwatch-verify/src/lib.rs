//! # bwatch-verify — Bridge Attestation Verification
//!
//! Confirms that a bridge message was signed by a quorum of the bridge's
//! trusted guardians or validators.
//!
//! - [`ValidatorRegistry`] holds per-protocol signer sets behind a
//!   lock-free snapshot and accepts atomic updates from the refresh feed.
//! - [`codec`] decodes fixed-width signature blobs lazily and tolerantly.
//! - [`BridgeProfile`] implementations describe each protocol's layout,
//!   message hash and inherent risk.
//! - [`BridgeSignatureVerifier`] counts distinct valid trusted signers
//!   against the threshold and caches verdicts for an hour.

pub mod cache;
pub mod codec;
pub mod profile;
pub mod registry;
pub mod seed;
pub mod verifier;

pub use cache::{CacheConfig, VerdictCache};
pub use codec::{SignatureEntries, SignatureEntry, SignatureEnvelope, SignatureLayout, SignerRef};
pub use profile::{
    BridgeProfile, GuardianProfile, ProfileConfig, ProfileRegistry, ProtocolRisk, RelayProfile,
    ValidatorProfile,
};
pub use registry::{RegistryError, ValidatorRegistry, ValidatorSet, ValidatorSetSeed};
pub use verifier::{message_bytes, BridgeSignatureVerifier, VerdictStatus, VerificationVerdict};
