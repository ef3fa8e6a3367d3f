//! # Collaborator Adapters
//!
//! The engine's only view of the outside world: recent transaction history
//! and sanctions screening. Both are injected as trait objects so the
//! surrounding service can back them with a database, an explorer feed or a
//! screening provider.
//!
//! A collaborator error is never fatal to an assessment. The signal that
//! needed it reports a failure and contributes zero points.

use std::collections::HashSet;

use bwatch_core::{Address, BridgeTransaction, CollaboratorError, Timestamp};
use parking_lot::RwLock;

/// Time-bounded lookup of past bridge transactions.
pub trait TransactionHistory: Send + Sync {
    /// Transactions at or after `since` in which any of `addresses` is the
    /// source or destination. Order is unspecified.
    fn query_transactions(
        &self,
        addresses: &[Address],
        since: Timestamp,
    ) -> Result<Vec<BridgeTransaction>, CollaboratorError>;
}

/// Point lookup against an active sanctions list. Must be side-effect free.
pub trait SanctionsList: Send + Sync {
    fn is_sanctioned(&self, address: &Address) -> Result<bool, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// History held in memory. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    transactions: RwLock<Vec<BridgeTransaction>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transactions(transactions: Vec<BridgeTransaction>) -> Self {
        Self {
            transactions: RwLock::new(transactions),
        }
    }

    /// Append a transaction.
    pub fn record(&self, tx: BridgeTransaction) {
        self.transactions.write().push(tx);
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}

impl TransactionHistory for InMemoryHistory {
    fn query_transactions(
        &self,
        addresses: &[Address],
        since: Timestamp,
    ) -> Result<Vec<BridgeTransaction>, CollaboratorError> {
        let txs = self.transactions.read();
        Ok(txs
            .iter()
            .filter(|tx| tx.timestamp >= since)
            .filter(|tx| addresses.iter().any(|a| tx.involves(a)))
            .cloned()
            .collect())
    }
}

/// A fixed sanctions list.
#[derive(Debug, Default, Clone)]
pub struct StaticSanctionsList {
    sanctioned: HashSet<Address>,
}

impl StaticSanctionsList {
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            sanctioned: addresses.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sanctioned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sanctioned.is_empty()
    }
}

impl SanctionsList for StaticSanctionsList {
    fn is_sanctioned(&self, address: &Address) -> Result<bool, CollaboratorError> {
        Ok(self.sanctioned.contains(address))
    }
}
