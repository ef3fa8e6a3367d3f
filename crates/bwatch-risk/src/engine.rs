//! # Risk Scoring Engine
//!
//! Runs the six signals over a transaction and aggregates them:
//!
//! ```text
//! raw_points       = sum of component points
//! normalized_score = clamp(raw_points / normalization, 0, 1)
//! flags            = category id of every component with points > 0
//!                    plus any sub-flags it emitted
//! ```
//!
//! ## Failure Isolation
//!
//! A failed signal contributes zero points, appears in `component_scores`
//! with an empty description, and is listed in `failures`. The other signals
//! are unaffected.

use std::collections::BTreeSet;
use std::sync::Arc;

use bwatch_core::BridgeTransaction;
use bwatch_verify::ProfileRegistry;
use chrono::Utc;
use uuid::Uuid;

use crate::assessment::{ComponentScore, RiskAssessment, SignalFailure, SignalOutcome};
use crate::collaborators::{SanctionsList, TransactionHistory};
use crate::config::{ConfigError, RiskConfig};
use crate::signals::{default_signals, RiskSignal, SignalContext};

/// Composite risk scorer with injected collaborators.
pub struct RiskScoringEngine {
    config: RiskConfig,
    history: Arc<dyn TransactionHistory>,
    sanctions: Arc<dyn SanctionsList>,
    profiles: Arc<ProfileRegistry>,
    signals: Vec<Box<dyn RiskSignal>>,
}

impl std::fmt::Debug for RiskScoringEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskScoringEngine")
            .field("config", &self.config)
            .field("signals", &self.signals.len())
            .finish_non_exhaustive()
    }
}

impl RiskScoringEngine {
    /// Build an engine with the default profiles derived from `config.protocol`.
    pub fn new(
        config: RiskConfig,
        history: Arc<dyn TransactionHistory>,
        sanctions: Arc<dyn SanctionsList>,
    ) -> Result<Self, ConfigError> {
        let profiles = Arc::new(ProfileRegistry::with_defaults(&config.protocol));
        Self::with_profiles(config, history, sanctions, profiles)
    }

    /// Build an engine sharing a profile registry with the verifier.
    pub fn with_profiles(
        config: RiskConfig,
        history: Arc<dyn TransactionHistory>,
        sanctions: Arc<dyn SanctionsList>,
        profiles: Arc<ProfileRegistry>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            history,
            sanctions,
            profiles,
            signals: default_signals(),
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Assess one transaction.
    pub fn assess(&self, tx: &BridgeTransaction) -> RiskAssessment {
        let ctx = SignalContext {
            config: &self.config,
            history: self.history.as_ref(),
            sanctions: self.sanctions.as_ref(),
            profiles: self.profiles.as_ref(),
        };

        let mut component_scores = Vec::with_capacity(self.signals.len());
        let mut failures = Vec::new();
        let mut flags = BTreeSet::new();
        let mut raw_points = 0.0;

        for signal in &self.signals {
            let category = signal.category();
            match signal.evaluate(tx, &ctx) {
                SignalOutcome::Scored {
                    points,
                    description,
                    sub_flags,
                } => {
                    if points > 0.0 {
                        flags.insert(category.as_str().to_string());
                        flags.extend(sub_flags);
                        raw_points += points;
                    }
                    component_scores.push(ComponentScore {
                        category,
                        points,
                        description,
                    });
                }
                SignalOutcome::Failed { reason } => {
                    tracing::warn!(
                        tx_hash = %tx.tx_hash,
                        category = %category,
                        reason = %reason,
                        "risk signal failed; contributing zero"
                    );
                    component_scores.push(ComponentScore {
                        category,
                        points: 0.0,
                        description: String::new(),
                    });
                    failures.push(SignalFailure { category, reason });
                }
            }
        }

        let normalized_score = (raw_points / self.config.normalization).clamp(0.0, 1.0);
        tracing::debug!(
            tx_hash = %tx.tx_hash,
            raw_points,
            normalized_score,
            failures = failures.len(),
            "transaction assessed"
        );

        RiskAssessment {
            assessment_id: Uuid::new_v4(),
            tx_hash: tx.tx_hash.clone(),
            normalized_score,
            raw_points,
            flags,
            component_scores,
            failures,
            assessed_at: Utc::now(),
        }
    }

    /// Assess independent transactions, preserving input order.
    pub fn assess_batch(&self, txs: &[BridgeTransaction]) -> Vec<RiskAssessment> {
        txs.iter().map(|tx| self.assess(tx)).collect()
    }
}
