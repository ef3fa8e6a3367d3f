//! # bwatch-risk — Composite Risk Scoring
//!
//! Scores each bridge transfer on six independent signals and aggregates
//! them into a normalized score with flags:
//!
//! | Signal | Default points |
//! |---|---|
//! | Amount (reference value bands) | 5–15, 20, 30, 40 |
//! | Frequency (trailing hour) | 2 per excess tx, cap 25 |
//! | Pattern (circular, else rapid) | 30 / 20 |
//! | Sanctions | 100 |
//! | Timing (02:00–06:00 UTC, else weekend) | 10 / 5 |
//! | Bridge protocol (mixer / unknown) | 25 / 10 |
//!
//! History and sanctions lookups are injected through
//! [`TransactionHistory`] and [`SanctionsList`]. A failing collaborator
//! zeroes only the signal that depends on it.

pub mod assessment;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod signals;

pub use assessment::{ComponentScore, RiskAssessment, RiskCategory, SignalFailure, SignalOutcome};
pub use collaborators::{InMemoryHistory, SanctionsList, StaticSanctionsList, TransactionHistory};
pub use config::{AmountBands, ConfigError, FrequencyConfig, PatternConfig, PriceTable, RiskConfig, TimingConfig};
pub use engine::RiskScoringEngine;
