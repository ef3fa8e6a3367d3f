//! Risk assessment output types.

use std::collections::BTreeSet;

use bwatch_core::TxHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the six independent risk signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Amount,
    Frequency,
    Pattern,
    Sanctions,
    Timing,
    BridgeProtocol,
}

impl RiskCategory {
    /// All categories in evaluation order.
    pub const ALL: [RiskCategory; 6] = [
        Self::Amount,
        Self::Frequency,
        Self::Pattern,
        Self::Sanctions,
        Self::Timing,
        Self::BridgeProtocol,
    ];

    /// Flag identifier emitted when the category fires.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Frequency => "frequency",
            Self::Pattern => "pattern",
            Self::Sanctions => "sanctions",
            Self::Timing => "timing",
            Self::BridgeProtocol => "bridge_protocol",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one signal.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalOutcome {
    /// The signal computed. `points == 0.0` means it did not fire.
    Scored {
        points: f64,
        description: String,
        /// Extra flags beyond the category id (amount tiers).
        sub_flags: Vec<String>,
    },
    /// The signal could not compute. Contributes zero.
    Failed { reason: String },
}

impl SignalOutcome {
    /// The signal ran and found nothing.
    pub fn quiet() -> Self {
        Self::Scored {
            points: 0.0,
            description: String::new(),
            sub_flags: Vec::new(),
        }
    }

    pub fn scored(points: f64, description: impl Into<String>) -> Self {
        Self::Scored {
            points,
            description: description.into(),
            sub_flags: Vec::new(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn points(&self) -> f64 {
        match self {
            Self::Scored { points, .. } => *points,
            Self::Failed { .. } => 0.0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One component's contribution to an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub category: RiskCategory,
    pub points: f64,
    /// Empty when the component did not fire or failed.
    pub description: String,
}

/// A signal that failed to compute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFailure {
    pub category: RiskCategory,
    pub reason: String,
}

/// The composite risk of one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub assessment_id: Uuid,
    pub tx_hash: TxHash,
    /// `raw_points / normalization`, clamped to `[0, 1]`.
    pub normalized_score: f64,
    pub raw_points: f64,
    pub flags: BTreeSet<String>,
    /// One entry per category, in [`RiskCategory::ALL`] order.
    pub component_scores: Vec<ComponentScore>,
    pub failures: Vec<SignalFailure>,
    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// Points contributed by `category`.
    pub fn points_for(&self, category: RiskCategory) -> f64 {
        self.component_scores
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.points)
            .unwrap_or(0.0)
    }

    /// Whether `category` failed to compute.
    pub fn failed(&self, category: RiskCategory) -> bool {
        self.failures.iter().any(|f| f.category == category)
    }
}
