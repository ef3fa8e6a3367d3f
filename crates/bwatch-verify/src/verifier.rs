//! # Bridge Signature Verifier
//!
//! Decides whether a bridge message was attested by a quorum of its
//! protocol's trusted signers.
//!
//! ## Algorithm
//!
//! 1. Return a fresh cached verdict for `(protocol, message_id, blob)`.
//! 2. Select the protocol's [`BridgeProfile`]. A profile without a signature
//!    layout has nothing to verify: the verdict is vacuously valid with
//!    status [`VerdictStatus::Unverifiable`].
//! 3. Load the current [`ValidatorSet`]. A missing set yields
//!    [`VerdictStatus::UnknownProtocol`] with zero valid signatures.
//! 4. For each decoded entry, resolve the claimed signer, recover the actual
//!    signer over the profile's message hash, and count the entry only when
//!    the two match and the signer is in the set. Each signer counts once.
//! 5. `is_valid = count >= threshold`; cache the verdict.
//!
//! Per-entry failures (bad index, unrecoverable signature, unhashable
//! message) reject that entry only.

use std::collections::HashSet;
use std::sync::Arc;

use bwatch_core::{BridgeProtocol, EthAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheConfig, VerdictCache};
use crate::codec::{parse_hex_blob, SignatureEntry, SignerRef};
use crate::profile::{BridgeProfile, ProfileRegistry};
use crate::registry::{ValidatorRegistry, ValidatorSet};

/// Outcome class of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// Quorum reached.
    Verified,
    /// Fewer valid signatures than the threshold.
    InsufficientSignatures,
    /// The protocol carries no signatures; accepted vacuously.
    Unverifiable,
    /// No validator set is registered for the protocol.
    UnknownProtocol,
}

/// Result of verifying one bridge message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub is_valid: bool,
    pub valid_signature_count: usize,
    pub required_threshold: usize,
    pub bridge_protocol: BridgeProtocol,
    /// Signers that counted toward the threshold, in blob order.
    pub valid_signers: Vec<EthAddress>,
    pub status: VerdictStatus,
    pub verified_at: DateTime<Utc>,
}

impl VerificationVerdict {
    fn unverifiable(protocol: BridgeProtocol, now: DateTime<Utc>) -> Self {
        Self {
            is_valid: true,
            valid_signature_count: 0,
            required_threshold: 0,
            bridge_protocol: protocol,
            valid_signers: Vec::new(),
            status: VerdictStatus::Unverifiable,
            verified_at: now,
        }
    }

    fn unknown_protocol(protocol: BridgeProtocol, now: DateTime<Utc>) -> Self {
        Self {
            is_valid: false,
            valid_signature_count: 0,
            required_threshold: 0,
            bridge_protocol: protocol,
            valid_signers: Vec::new(),
            status: VerdictStatus::UnknownProtocol,
            verified_at: now,
        }
    }
}

/// Message bytes for a message id: hex-decoded when `0x`-prefixed and valid
/// hex, otherwise the UTF-8 bytes of the id.
pub fn message_bytes(message_id: &str) -> Vec<u8> {
    if message_id.starts_with("0x") {
        if let Some(bytes) = parse_hex_blob(message_id) {
            return bytes;
        }
    }
    message_id.as_bytes().to_vec()
}

/// Threshold signature verifier over the validator registry.
#[derive(Debug)]
pub struct BridgeSignatureVerifier {
    registry: Arc<ValidatorRegistry>,
    profiles: Arc<ProfileRegistry>,
    cache: VerdictCache,
}

impl BridgeSignatureVerifier {
    pub fn new(registry: Arc<ValidatorRegistry>, profiles: Arc<ProfileRegistry>) -> Self {
        Self::with_cache_config(registry, profiles, CacheConfig::default())
    }

    pub fn with_cache_config(
        registry: Arc<ValidatorRegistry>,
        profiles: Arc<ProfileRegistry>,
        cache: CacheConfig,
    ) -> Self {
        Self {
            registry,
            profiles,
            cache: VerdictCache::new(cache),
        }
    }

    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    pub fn profiles(&self) -> &Arc<ProfileRegistry> {
        &self.profiles
    }

    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    /// Verify `blob` as an attestation of `message_id` under `protocol`.
    pub fn verify(
        &self,
        protocol: &BridgeProtocol,
        message_id: &str,
        blob: &[u8],
    ) -> VerificationVerdict {
        self.verify_at(protocol, message_id, blob, Utc::now())
    }

    /// [`verify`](Self::verify) against an explicit clock.
    pub fn verify_at(
        &self,
        protocol: &BridgeProtocol,
        message_id: &str,
        blob: &[u8],
        now: DateTime<Utc>,
    ) -> VerificationVerdict {
        let key = VerdictCache::key(protocol, message_id, blob);
        if let Some(cached) = self.cache.get(&key, now) {
            tracing::debug!(protocol = %protocol, message_id, "verdict cache hit");
            return cached;
        }

        let profile = self.profiles.get(protocol);
        if profile.signature_layout().is_none() {
            tracing::info!(protocol = %protocol, message_id, "no verification method; accepted as unverifiable");
            let verdict = VerificationVerdict::unverifiable(protocol.clone(), now);
            self.cache.insert(key, verdict.clone(), now);
            return verdict;
        }

        let set = match self.registry.get_set(protocol) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!(protocol = %protocol, message_id, error = %e, "verification against unknown protocol");
                return VerificationVerdict::unknown_protocol(protocol.clone(), now);
            }
        };

        let valid_signers = count_valid(profile.as_ref(), &set, message_id, blob);
        let count = valid_signers.len();
        let is_valid = count >= set.threshold();
        let verdict = VerificationVerdict {
            is_valid,
            valid_signature_count: count,
            required_threshold: set.threshold(),
            bridge_protocol: protocol.clone(),
            valid_signers,
            status: if is_valid {
                VerdictStatus::Verified
            } else {
                VerdictStatus::InsufficientSignatures
            },
            verified_at: now,
        };

        tracing::info!(
            protocol = %protocol,
            message_id,
            valid = count,
            threshold = set.threshold(),
            set_version = set.version(),
            is_valid,
            "bridge message verified"
        );
        self.cache.insert(key, verdict.clone(), now);
        verdict
    }
}

fn count_valid(
    profile: &dyn BridgeProfile,
    set: &ValidatorSet,
    message_id: &str,
    blob: &[u8],
) -> Vec<EthAddress> {
    let hash = match profile.message_hash(&message_bytes(message_id)) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::debug!(message_id, error = %e, "message hash unavailable; every signature rejected");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut valid = Vec::new();
    for entry in profile.decode_signatures(blob) {
        if let Some(signer) = check_entry(profile, set, &hash, &entry) {
            if seen.insert(signer) {
                valid.push(signer);
            }
        }
    }
    valid
}

fn check_entry(
    profile: &dyn BridgeProfile,
    set: &ValidatorSet,
    hash: &[u8; 32],
    entry: &SignatureEntry,
) -> Option<EthAddress> {
    let claimed = match entry.signer {
        SignerRef::Index(i) => match set.signer_at(usize::from(i)) {
            Some(addr) => *addr,
            None => {
                tracing::debug!(index = i, set_len = set.len(), "signer index out of range");
                return None;
            }
        },
        SignerRef::Address(addr) => addr,
    };
    let recovered = match profile.recover_signer(hash, &entry.signature) {
        Ok(addr) => addr,
        Err(e) => {
            tracing::debug!(claimed = %claimed, error = %e, "signature not recoverable");
            return None;
        }
    };
    if recovered != claimed {
        tracing::debug!(claimed = %claimed, recovered = %recovered, "recovered signer does not match claim");
        return None;
    }
    if !set.contains(&claimed) {
        tracing::debug!(signer = %claimed, "signer not in trusted set");
        return None;
    }
    Some(claimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, SignatureLayout};
    use bwatch_crypto::{SignerKeyPair, RecoverableSignature};
    use chrono::Duration;

    fn keys(n: u8) -> Vec<SignerKeyPair> {
        (1..=n)
            .map(|i| SignerKeyPair::from_seed(&[i; 32]).unwrap())
            .collect()
    }

    fn setup(n: u8, threshold: usize) -> (BridgeSignatureVerifier, Vec<SignerKeyPair>) {
        let kps = keys(n);
        let registry = Arc::new(ValidatorRegistry::new());
        registry
            .update_set(
                BridgeProtocol::Wormhole,
                kps.iter().map(|k| k.address()).collect(),
                threshold,
            )
            .unwrap();
        registry
            .update_set(
                BridgeProtocol::Multichain,
                kps.iter().map(|k| k.address()).collect(),
                threshold,
            )
            .unwrap();
        let verifier = BridgeSignatureVerifier::new(registry, Arc::new(ProfileRegistry::default()));
        (verifier, kps)
    }

    fn indexed_blob(verifier: &BridgeSignatureVerifier, kps: &[SignerKeyPair], idx: &[u8], msg: &str) -> Vec<u8> {
        let profile = verifier.profiles().get(&BridgeProtocol::Wormhole);
        let hash = profile.message_hash(&message_bytes(msg)).unwrap();
        let entries: Vec<_> = idx
            .iter()
            .map(|&i| SignatureEntry {
                signer: SignerRef::Index(i),
                signature: kps[usize::from(i)].sign_prehash(&hash).unwrap(),
            })
            .collect();
        encode(SignatureLayout::Indexed, &entries)
    }

    #[test]
    fn threshold_met_and_missed() {
        let (verifier, kps) = setup(5, 3);
        let ok = indexed_blob(&verifier, &kps, &[0, 2, 4], "0xdeadbeef");
        let v = verifier.verify(&BridgeProtocol::Wormhole, "0xdeadbeef", &ok);
        assert!(v.is_valid);
        assert_eq!(v.valid_signature_count, 3);
        assert_eq!(v.status, VerdictStatus::Verified);

        let short = indexed_blob(&verifier, &kps, &[0, 2], "0xdeadbeef");
        let v = verifier.verify(&BridgeProtocol::Wormhole, "0xdeadbeef", &short);
        assert!(!v.is_valid);
        assert_eq!(v.valid_signature_count, 2);
        assert_eq!(v.status, VerdictStatus::InsufficientSignatures);
    }

    #[test]
    fn duplicate_signer_counts_once() {
        let (verifier, kps) = setup(5, 3);
        let blob = indexed_blob(&verifier, &kps, &[1, 1, 1], "msg");
        let v = verifier.verify(&BridgeProtocol::Wormhole, "msg", &blob);
        assert_eq!(v.valid_signature_count, 1);
        assert!(!v.is_valid);
    }

    #[test]
    fn mismatched_claim_never_counts() {
        let (verifier, kps) = setup(3, 1);
        let profile = verifier.profiles().get(&BridgeProtocol::Wormhole);
        let hash = profile.message_hash(b"msg").unwrap();
        // Signer 1 signs but the record claims index 0; signer 1 is trusted.
        let entries = vec![SignatureEntry {
            signer: SignerRef::Index(0),
            signature: kps[1].sign_prehash(&hash).unwrap(),
        }];
        let blob = encode(SignatureLayout::Indexed, &entries);
        let v = verifier.verify(&BridgeProtocol::Wormhole, "msg", &blob);
        assert_eq!(v.valid_signature_count, 0);
        assert!(!v.is_valid);
    }

    #[test]
    fn addressed_layout_requires_membership() {
        let (verifier, kps) = setup(3, 1);
        let outsider = SignerKeyPair::from_seed(&[99; 32]).unwrap();
        let profile = verifier.profiles().get(&BridgeProtocol::Multichain);
        let hash = profile.message_hash(b"swap-1").unwrap();
        let entries = vec![SignatureEntry {
            signer: SignerRef::Address(outsider.address()),
            signature: outsider.sign_prehash(&hash).unwrap(),
        }];
        let blob = encode(SignatureLayout::Addressed, &entries);
        let v = verifier.verify(&BridgeProtocol::Multichain, "swap-1", &blob);
        assert_eq!(v.valid_signature_count, 0);

        let entries = vec![SignatureEntry {
            signer: SignerRef::Address(kps[2].address()),
            signature: kps[2].sign_prehash(&hash).unwrap(),
        }];
        let blob = encode(SignatureLayout::Addressed, &entries);
        let v = verifier.verify(&BridgeProtocol::Multichain, "swap-1", &blob);
        assert!(v.is_valid);
        assert_eq!(v.valid_signers, vec![kps[2].address()]);
    }

    #[test]
    fn out_of_range_index_and_garbage_signature_rejected_individually() {
        let (verifier, kps) = setup(3, 2);
        let profile = verifier.profiles().get(&BridgeProtocol::Wormhole);
        let hash = profile.message_hash(b"m").unwrap();
        let entries = vec![
            SignatureEntry { signer: SignerRef::Index(200), signature: kps[0].sign_prehash(&hash).unwrap() },
            SignatureEntry { signer: SignerRef::Index(1), signature: RecoverableSignature::from_bytes([0u8; 65]) },
            SignatureEntry { signer: SignerRef::Index(0), signature: kps[0].sign_prehash(&hash).unwrap() },
            SignatureEntry { signer: SignerRef::Index(2), signature: kps[2].sign_prehash(&hash).unwrap() },
        ];
        let blob = encode(SignatureLayout::Indexed, &entries);
        let v = verifier.verify(&BridgeProtocol::Wormhole, "m", &blob);
        assert_eq!(v.valid_signature_count, 2);
        assert!(v.is_valid);
    }

    #[test]
    fn empty_blob_is_zero_signatures() {
        let (verifier, _) = setup(3, 2);
        let v = verifier.verify(&BridgeProtocol::Wormhole, "m", &[]);
        assert_eq!(v.valid_signature_count, 0);
        assert!(!v.is_valid);
    }

    #[test]
    fn unsigned_protocol_is_vacuously_valid() {
        let (verifier, _) = setup(3, 2);
        let v = verifier.verify(&BridgeProtocol::Stargate, "m", b"whatever");
        assert!(v.is_valid);
        assert_eq!(v.status, VerdictStatus::Unverifiable);
    }

    #[test]
    fn missing_set_is_unknown_protocol() {
        let verifier = BridgeSignatureVerifier::new(
            Arc::new(ValidatorRegistry::new()),
            Arc::new(ProfileRegistry::default()),
        );
        let v = verifier.verify(&BridgeProtocol::Wormhole, "m", &[0u8; 66]);
        assert!(!v.is_valid);
        assert_eq!(v.valid_signature_count, 0);
        assert_eq!(v.status, VerdictStatus::UnknownProtocol);
        assert!(verifier.cache().is_empty());
    }

    #[test]
    fn cached_verdict_reused_then_recomputed_after_expiry() {
        let (verifier, kps) = setup(3, 2);
        let blob = indexed_blob(&verifier, &kps, &[0, 1], "m");
        let t0 = Utc::now();
        let first = verifier.verify_at(&BridgeProtocol::Wormhole, "m", &blob, t0);
        assert!(first.is_valid);

        // Rotate the set so a recomputation would differ.
        verifier
            .registry()
            .update_set(BridgeProtocol::Wormhole, vec![kps[2].address()], 1)
            .unwrap();

        let cached = verifier.verify_at(&BridgeProtocol::Wormhole, "m", &blob, t0 + Duration::minutes(30));
        assert_eq!(cached, first);

        let recomputed = verifier.verify_at(&BridgeProtocol::Wormhole, "m", &blob, t0 + Duration::minutes(61));
        assert!(!recomputed.is_valid);
        assert_ne!(recomputed.verified_at, first.verified_at);
    }

    #[test]
    fn message_id_hex_and_text() {
        assert_eq!(message_bytes("0x0102"), vec![1, 2]);
        assert_eq!(message_bytes("seq-7"), b"seq-7".to_vec());
        assert_eq!(message_bytes("0xnothex"), b"0xnothex".to_vec());
    }
}
