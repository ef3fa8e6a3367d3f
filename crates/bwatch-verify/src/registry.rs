//! # Validator Registry
//!
//! Holds the trusted signer set and threshold for every attested bridge
//! protocol and answers trust queries during verification.
//!
//! ## Concurrency
//!
//! The registry is a copy-on-write map behind an [`ArcSwap`]. Readers load
//! the current snapshot without taking a lock; [`ValidatorRegistry::update_set`]
//! builds a new map and publishes it with a single pointer swap. A reader
//! therefore sees either the old set or the new set, never a mix.
//!
//! ## Trust Policy
//!
//! A protocol with no registered set is a configuration error
//! ([`RegistryError::NotFound`]), not an implicit "trust everyone".

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use bwatch_core::{BridgeProtocol, EthAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from validator registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No validator set is registered for the protocol.
    #[error("no validator set registered for protocol {0}")]
    NotFound(BridgeProtocol),

    /// A proposed validator set violates the set invariants.
    #[error("invalid validator set for {protocol}: {reason}")]
    InvalidSet {
        /// Protocol the set was proposed for.
        protocol: BridgeProtocol,
        /// Why the set was rejected.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ValidatorSet
// ---------------------------------------------------------------------------

/// The ordered signer list and threshold for one protocol.
///
/// Invariants, enforced by [`ValidatorSet::new`]:
/// - `0 < threshold <= signers.len()`
/// - signers are distinct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSet {
    protocol: BridgeProtocol,
    signers: Vec<EthAddress>,
    members: HashSet<EthAddress>,
    threshold: usize,
    version: u64,
}

impl ValidatorSet {
    /// Validate and build a set. The version is assigned by the registry.
    pub fn new(
        protocol: BridgeProtocol,
        signers: Vec<EthAddress>,
        threshold: usize,
    ) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidSet {
            protocol: protocol.clone(),
            reason,
        };
        if threshold == 0 {
            return Err(invalid("threshold must be positive".into()));
        }
        if threshold > signers.len() {
            return Err(invalid(format!(
                "threshold {threshold} exceeds signer count {}",
                signers.len()
            )));
        }
        let members: HashSet<EthAddress> = signers.iter().copied().collect();
        if members.len() != signers.len() {
            return Err(invalid("duplicate signer in set".into()));
        }
        Ok(Self {
            protocol,
            signers,
            members,
            threshold,
            version: 0,
        })
    }

    /// Protocol this set attests for.
    pub fn protocol(&self) -> &BridgeProtocol {
        &self.protocol
    }

    /// Signers in guardian-index order.
    pub fn signers(&self) -> &[EthAddress] {
        &self.signers
    }

    /// Signer at a zero-based guardian index.
    pub fn signer_at(&self, index: usize) -> Option<&EthAddress> {
        self.signers.get(index)
    }

    /// Whether `signer` is a member of this set.
    pub fn contains(&self, signer: &EthAddress) -> bool {
        self.members.contains(signer)
    }

    /// Minimum number of distinct valid signatures.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of signers.
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    /// Always false for a validated set; provided for API completeness.
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Registry-assigned version, one above the highest version published
    /// before this set.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Serializable description of a set, used for seed files and the refresh feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetSeed {
    /// Protocol name.
    pub protocol: BridgeProtocol,
    /// Signer addresses in index order.
    pub signers: Vec<EthAddress>,
    /// Required signature count.
    pub threshold: usize,
}

// ---------------------------------------------------------------------------
// ValidatorRegistry
// ---------------------------------------------------------------------------

type SetMap = HashMap<BridgeProtocol, Arc<ValidatorSet>>;

/// Per-protocol trusted signer sets with atomic swap-on-update.
#[derive(Debug)]
pub struct ValidatorRegistry {
    sets: ArcSwap<SetMap>,
}

impl ValidatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sets: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Create a registry seeded with the bootstrap guardian and validator sets.
    pub fn with_production_sets() -> Result<Self, RegistryError> {
        let registry = Self::new();
        registry.load_seeds(crate::seed::bootstrap_sets()?)?;
        Ok(registry)
    }

    /// The current set for `protocol`.
    pub fn get_set(&self, protocol: &BridgeProtocol) -> Result<Arc<ValidatorSet>, RegistryError> {
        self.sets
            .load()
            .get(protocol)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(protocol.clone()))
    }

    /// Whether `signer` is currently trusted for `protocol`.
    pub fn is_trusted(
        &self,
        protocol: &BridgeProtocol,
        signer: &EthAddress,
    ) -> Result<bool, RegistryError> {
        Ok(self.get_set(protocol)?.contains(signer))
    }

    /// Replace the set for `protocol` atomically. Returns the new version.
    pub fn update_set(
        &self,
        protocol: BridgeProtocol,
        signers: Vec<EthAddress>,
        threshold: usize,
    ) -> Result<u64, RegistryError> {
        let built = ValidatorSet::new(protocol.clone(), signers, threshold)?;
        let mut set = Arc::new(built.clone());

        // Versioned from the snapshot being replaced; a retry re-derives it.
        let previous = self.sets.rcu(|current| {
            let mut candidate = built.clone();
            candidate.version = current.values().map(|s| s.version).max().unwrap_or(0) + 1;
            set = Arc::new(candidate);
            let mut next = SetMap::clone(current);
            next.insert(protocol.clone(), Arc::clone(&set));
            next
        });
        let previous_version = previous.get(&protocol).map(|s| s.version());

        tracing::info!(
            protocol = %protocol,
            signers = set.len(),
            threshold = set.threshold(),
            version = set.version(),
            previous_version = ?previous_version,
            "validator set updated"
        );
        Ok(set.version())
    }

    /// Apply a batch of seeds. Stops at the first invalid seed.
    pub fn load_seeds(
        &self,
        seeds: impl IntoIterator<Item = ValidatorSetSeed>,
    ) -> Result<usize, RegistryError> {
        let mut loaded = 0;
        for seed in seeds {
            self.update_set(seed.protocol, seed.signers, seed.threshold)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Protocols with a registered set, in `BridgeProtocol` order.
    pub fn protocols(&self) -> Vec<BridgeProtocol> {
        let mut protocols: Vec<BridgeProtocol> = self.sets.load().keys().cloned().collect();
        protocols.sort();
        protocols
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> EthAddress {
        EthAddress::from_bytes([n; 20])
    }

    #[test]
    fn zero_threshold_rejected() {
        let err = ValidatorSet::new(BridgeProtocol::Wormhole, vec![addr(1)], 0).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSet { .. }));
    }

    #[test]
    fn threshold_above_signer_count_rejected() {
        assert!(ValidatorSet::new(BridgeProtocol::Wormhole, vec![addr(1), addr(2)], 3).is_err());
    }

    #[test]
    fn duplicate_signers_rejected() {
        assert!(ValidatorSet::new(BridgeProtocol::Wormhole, vec![addr(1), addr(1)], 1).is_err());
    }

    #[test]
    fn unknown_protocol_is_not_found() {
        let registry = ValidatorRegistry::new();
        assert_eq!(
            registry.get_set(&BridgeProtocol::Wormhole).unwrap_err(),
            RegistryError::NotFound(BridgeProtocol::Wormhole)
        );
        assert!(registry
            .is_trusted(&BridgeProtocol::Wormhole, &addr(1))
            .is_err());
    }

    #[test]
    fn update_replaces_whole_set() {
        let registry = ValidatorRegistry::new();
        let v1 = registry
            .update_set(BridgeProtocol::Multichain, vec![addr(1), addr(2)], 2)
            .unwrap();
        let v2 = registry
            .update_set(BridgeProtocol::Multichain, vec![addr(3)], 1)
            .unwrap();
        assert!(v2 > v1);

        let set = registry.get_set(&BridgeProtocol::Multichain).unwrap();
        assert_eq!(set.signers(), &[addr(3)]);
        assert_eq!(set.threshold(), 1);
        assert_eq!(set.version(), v2);
        assert!(!registry
            .is_trusted(&BridgeProtocol::Multichain, &addr(1))
            .unwrap());
        assert!(registry
            .is_trusted(&BridgeProtocol::Multichain, &addr(3))
            .unwrap());
    }

    #[test]
    fn concurrent_updates_publish_the_highest_version() {
        let registry = Arc::new(ValidatorRegistry::new());
        let handles: Vec<_> = (1..=8u8)
            .map(|n| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            registry
                                .update_set(BridgeProtocol::Wormhole, vec![addr(n)], 1)
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut versions: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        versions.sort_unstable();
        versions.dedup();

        assert_eq!(versions.len(), 400);
        let current = registry.get_set(&BridgeProtocol::Wormhole).unwrap();
        assert_eq!(current.version(), 400);
        assert_eq!(versions.last(), Some(&current.version()));
    }

    #[test]
    fn invalid_update_keeps_previous_set() {
        let registry = ValidatorRegistry::new();
        registry
            .update_set(BridgeProtocol::Multichain, vec![addr(1), addr(2)], 2)
            .unwrap();
        assert!(registry
            .update_set(BridgeProtocol::Multichain, vec![addr(3)], 2)
            .is_err());
        let set = registry.get_set(&BridgeProtocol::Multichain).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn snapshot_held_by_reader_survives_update() {
        let registry = ValidatorRegistry::new();
        registry
            .update_set(BridgeProtocol::Wormhole, vec![addr(1), addr(2)], 2)
            .unwrap();
        let snapshot = registry.get_set(&BridgeProtocol::Wormhole).unwrap();
        registry
            .update_set(BridgeProtocol::Wormhole, vec![addr(9)], 1)
            .unwrap();
        assert_eq!(snapshot.signers(), &[addr(1), addr(2)]);
        assert_eq!(snapshot.threshold(), 2);
    }

    #[test]
    fn production_sets_are_seeded() {
        let registry = ValidatorRegistry::with_production_sets().unwrap();
        let guardians = registry.get_set(&BridgeProtocol::Wormhole).unwrap();
        assert_eq!(guardians.len(), 19);
        assert_eq!(guardians.threshold(), 13);

        let validators = registry.get_set(&BridgeProtocol::Multichain).unwrap();
        assert_eq!(validators.len(), 5);
        assert_eq!(validators.threshold(), 3);

        assert_eq!(
            registry.protocols(),
            vec![BridgeProtocol::Wormhole, BridgeProtocol::Multichain]
        );
    }

    #[test]
    fn concurrent_readers_never_see_partial_sets() {
        let registry = Arc::new(ValidatorRegistry::new());
        let small: Vec<EthAddress> = (1..=3).map(addr).collect();
        let large: Vec<EthAddress> = (10..=19).map(addr).collect();
        registry
            .update_set(BridgeProtocol::Wormhole, small.clone(), 2)
            .unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let (small, large) = (small.clone(), large.clone());
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let set = registry.get_set(&BridgeProtocol::Wormhole).unwrap();
                        let whole_small = set.signers() == small.as_slice() && set.threshold() == 2;
                        let whole_large = set.signers() == large.as_slice() && set.threshold() == 7;
                        assert!(whole_small || whole_large);
                    }
                })
            })
            .collect();

        for i in 0..200 {
            let (signers, threshold) = if i % 2 == 0 {
                (large.clone(), 7)
            } else {
                (small.clone(), 2)
            };
            registry
                .update_set(BridgeProtocol::Wormhole, signers, threshold)
                .unwrap();
        }
        for r in readers {
            r.join().unwrap();
        }
    }
}
