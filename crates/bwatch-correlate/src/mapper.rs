//! # Cross-Chain Mapper
//!
//! Stores one [`TransactionLink`] per logical transfer, keyed by
//! [`mapping_id`] (protocol + nonce).
//!
//! ## Re-linking Policy
//!
//! - Identical resubmission returns the stored link unchanged.
//! - Same legs with changed criteria or validators update the link in place
//!   and bump `revision`. `mapping_id` and `first_linked_at` never change.
//! - A different arrival replaces the stored one only if its confidence is
//!   at least the stored confidence; otherwise [`LinkError::WeakerMatch`].
//! - A different departure for the same protocol + nonce is a replay or a
//!   data error and is rejected with [`LinkError::ConflictingLeg`].
//!
//! ## Retention
//!
//! Links are kept until [`CrossChainMapper::evict_older_than`] drops those
//! not updated since a cutoff. The owner of the mapper decides the cadence.

use std::collections::HashMap;

use bwatch_core::{BridgeTransaction, ContentDigest, EthAddress, TxHash};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use crate::link::{link_transactions_with, mapping_id, LinkConfig, TransactionLink};

/// Errors from mapping operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// The mapping already links a different departure.
    #[error("mapping {mapping_id} already links departure {existing}, got {submitted}")]
    ConflictingLeg {
        mapping_id: ContentDigest,
        existing: TxHash,
        submitted: TxHash,
    },

    /// A replacement arrival scored lower than the stored one.
    #[error("mapping {mapping_id}: arrival {submitted} scores {submitted_confidence:.3}, below stored {existing_confidence:.3}")]
    WeakerMatch {
        mapping_id: ContentDigest,
        submitted: TxHash,
        existing_confidence: f64,
        submitted_confidence: f64,
    },
}

#[derive(Debug, Default)]
struct MapperState {
    links: HashMap<ContentDigest, TransactionLink>,
    by_tx: HashMap<TxHash, ContentDigest>,
}

impl MapperState {
    fn store(&mut self, link: TransactionLink) {
        self.by_tx.insert(link.departure_tx.clone(), link.mapping_id);
        self.by_tx.insert(link.arrival_tx.clone(), link.mapping_id);
        self.links.insert(link.mapping_id, link);
    }

    fn evict_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.links.len();
        self.links.retain(|_, link| link.updated_at >= cutoff);
        let links = &self.links;
        self.by_tx.retain(|_, id| links.contains_key(id));
        before - self.links.len()
    }
}

/// Thread-safe store of departure/arrival links.
#[derive(Debug, Default)]
pub struct CrossChainMapper {
    config: LinkConfig,
    state: RwLock<MapperState>,
}

impl CrossChainMapper {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: RwLock::new(MapperState::default()),
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Link `departure` to `arrival`, creating or updating the mapping.
    pub fn create_or_update_mapping(
        &self,
        departure: &BridgeTransaction,
        arrival: &BridgeTransaction,
        validators: &[EthAddress],
    ) -> Result<TransactionLink, LinkError> {
        self.create_or_update_mapping_at(departure, arrival, validators, Utc::now())
    }

    /// [`create_or_update_mapping`](Self::create_or_update_mapping) as of `now`.
    pub fn create_or_update_mapping_at(
        &self,
        departure: &BridgeTransaction,
        arrival: &BridgeTransaction,
        validators: &[EthAddress],
        now: DateTime<Utc>,
    ) -> Result<TransactionLink, LinkError> {
        let candidate = link_transactions_with(departure, arrival, &self.config, now)
            .with_validators(validators.to_vec());
        let id = mapping_id(departure);

        let mut state = self.state.write();
        let Some(existing) = state.links.get(&id).cloned() else {
            tracing::info!(
                mapping_id = %id,
                departure = %candidate.departure_tx,
                arrival = %candidate.arrival_tx,
                confidence = candidate.confidence,
                "transaction link created"
            );
            state.store(candidate.clone());
            return Ok(candidate);
        };

        if existing.departure_tx != candidate.departure_tx {
            tracing::warn!(
                mapping_id = %id,
                existing = %existing.departure_tx,
                submitted = %candidate.departure_tx,
                "conflicting departure for existing mapping"
            );
            return Err(LinkError::ConflictingLeg {
                mapping_id: id,
                existing: existing.departure_tx,
                submitted: candidate.departure_tx,
            });
        }

        let arrival_changed = existing.arrival_tx != candidate.arrival_tx;
        if arrival_changed && candidate.confidence < existing.confidence {
            tracing::warn!(
                mapping_id = %id,
                existing = %existing.arrival_tx,
                submitted = %candidate.arrival_tx,
                existing_confidence = existing.confidence,
                submitted_confidence = candidate.confidence,
                "weaker arrival rejected"
            );
            return Err(LinkError::WeakerMatch {
                mapping_id: id,
                submitted: candidate.arrival_tx,
                existing_confidence: existing.confidence,
                submitted_confidence: candidate.confidence,
            });
        }

        let unchanged = !arrival_changed
            && existing.criteria == candidate.criteria
            && existing.validators_involved == candidate.validators_involved
            && existing.destination_chain == candidate.destination_chain;
        if unchanged {
            tracing::debug!(mapping_id = %id, "transaction link resubmitted unchanged");
            return Ok(existing);
        }

        if arrival_changed {
            state.by_tx.remove(&existing.arrival_tx);
        }
        let updated = TransactionLink {
            revision: existing.revision.saturating_add(1),
            first_linked_at: existing.first_linked_at,
            ..candidate
        };
        tracing::info!(
            mapping_id = %id,
            revision = updated.revision,
            arrival = %updated.arrival_tx,
            confidence = updated.confidence,
            "transaction link updated"
        );
        state.store(updated.clone());
        Ok(updated)
    }

    /// The link stored under `mapping_id`.
    pub fn get(&self, mapping_id: &ContentDigest) -> Option<TransactionLink> {
        self.state.read().links.get(mapping_id).cloned()
    }

    /// The link in which `tx_hash` is either leg.
    pub fn find_by_tx_hash(&self, tx_hash: &TxHash) -> Option<TransactionLink> {
        let state = self.state.read();
        let id = state.by_tx.get(tx_hash)?;
        state.links.get(id).cloned()
    }

    /// Drop every link last updated before `cutoff`. Returns how many went.
    pub fn evict_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let evicted = self.state.write().evict_older_than(cutoff);
        if evicted > 0 {
            tracing::debug!(evicted, cutoff = %cutoff, "stale transaction links evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.state.read().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().links.is_empty()
    }
}
