//! # bwatch-correlate — Cross-Chain Correlation
//!
//! Relates bridge transfers to one another:
//!
//! - **Loops** (`loops.rs`): time-ordered cycles that return funds to their
//!   origin, classified as simple, complex or extended, plus fast forward
//!   chains that never return.
//!
//! - **Link** (`link.rs`): weighted matching of a source-chain departure to
//!   a destination-chain arrival on protocol, nonce, token, scaled amount
//!   and arrival window.
//!
//! - **Mapper** (`mapper.rs`): the mapping store, idempotent on
//!   protocol + nonce, with an explicit re-linking policy.
//!
//! ## Crate Policy
//!
//! - Depends only on `bwatch-core` internally.
//! - Pure computation. The mapper is the only stateful component.

pub mod link;
pub mod loops;
pub mod mapper;

pub use link::{
    link_transactions, link_transactions_with, mapping_id, AmountMatch, LinkConfig, MatchCriteria,
    TransactionLink,
};
pub use loops::{detect_loops, LoopConfig, LoopDescriptor, LoopDetector, LoopKind, RapidChain};
pub use mapper::{CrossChainMapper, LinkError};

#[cfg(test)]
pub(crate) mod fixtures {
    use bwatch_core::{Address, BridgeProtocol, BridgeTransaction, ChainId, Timestamp, TxHash};

    pub fn leg(hash: &str, from: &str, to: &str, at: i64) -> BridgeTransaction {
        BridgeTransaction {
            tx_hash: TxHash::new(hash).unwrap(),
            bridge_protocol: BridgeProtocol::Wormhole,
            source_chain: ChainId::new("ethereum").unwrap(),
            destination_chain: ChainId::new("base").unwrap(),
            source_address: Address::new(from).unwrap(),
            destination_address: Address::new(to).unwrap(),
            token_address: None,
            token_symbol: "USDC".into(),
            amount: "10".into(),
            token_decimals: None,
            nonce: None,
            timestamp: Timestamp::from_epoch_secs(at).unwrap(),
            raw_message: None,
        }
    }
}
