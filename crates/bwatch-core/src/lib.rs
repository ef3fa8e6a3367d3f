//! # bwatch-core — Foundational Types for Bridge Watch
//!
//! The leaf crate of the workspace. It defines the records and identifiers
//! every other crate exchanges: the immutable [`BridgeTransaction`], the
//! [`BridgeProtocol`] tag used for all per-protocol dispatch, normalized
//! addresses and chain ids, UTC [`Timestamp`]s and SHA-256
//! [`ContentDigest`]s for composite keys.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ChainId`, `Address`, `TxHash`,
//!    `EthAddress`. No bare strings for identifiers; normalization
//!    happens once, at construction.
//!
//! 2. **Amounts stay decimal strings.** Parsing to `rust_decimal::Decimal`
//!    is on demand; a malformed amount fails only the consumer that needs it.
//!
//! 3. **UTC-only timestamps** with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `bwatch-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod temporal;
pub mod transaction;

pub use digest::{ContentDigest, DigestBuilder};
pub use error::{CollaboratorError, CoreError};
pub use identity::{Address, ChainId, EthAddress, TxHash};
pub use protocol::BridgeProtocol;
pub use temporal::Timestamp;
pub use transaction::BridgeTransaction;
