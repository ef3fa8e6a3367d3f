//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared across Bridge Watch crates. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Validation errors name the offending field and the rejected value.
//! - Collaborator errors describe a failure of an injected data source
//!   (history, sanctions list). They are local to the risk signal that
//!   made the call and never abort a whole assessment.

use thiserror::Error;

/// Error raised while constructing or interpreting a core domain value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier failed format validation.
    #[error("invalid {kind}: {reason}")]
    InvalidIdentifier {
        /// The identifier kind (e.g. "address", "chain id").
        kind: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A decimal amount string could not be parsed.
    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount {
        /// The raw amount string.
        value: String,
        /// Parser error text.
        reason: String,
    },

    /// A timestamp was malformed or out of range.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Failure of an injected collaborator (history store, sanctions list).
///
/// Callers of a collaborator treat any of these as "this signal could not
/// be computed", never as a fatal error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The collaborator is unreachable or returned a server-side error.
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        /// Name of the collaborator.
        collaborator: String,
        /// Human-readable description of the failure.
        reason: String,
    },

    /// The call exceeded its deadline.
    #[error("{collaborator} timed out after {elapsed_ms}ms")]
    Timeout {
        /// Name of the collaborator.
        collaborator: String,
        /// Elapsed time before the deadline fired.
        elapsed_ms: u64,
    },

    /// The collaborator answered with data that could not be interpreted.
    #[error("{collaborator} returned an invalid response: {reason}")]
    InvalidResponse {
        /// Name of the collaborator.
        collaborator: String,
        /// Description of the malformed data.
        reason: String,
    },
}

impl CollaboratorError {
    /// Shorthand for [`CollaboratorError::Unavailable`].
    pub fn unavailable(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identifier_display_names_kind() {
        let err = CoreError::InvalidIdentifier {
            kind: "address",
            reason: "empty".into(),
        };
        assert_eq!(err.to_string(), "invalid address: empty");
    }

    #[test]
    fn timeout_display_includes_elapsed() {
        let err = CollaboratorError::Timeout {
            collaborator: "sanctions".into(),
            elapsed_ms: 750,
        };
        let msg = err.to_string();
        assert!(msg.contains("sanctions"));
        assert!(msg.contains("750ms"));
    }

    #[test]
    fn unavailable_shorthand() {
        let err = CollaboratorError::unavailable("history", "connection refused");
        assert!(matches!(err, CollaboratorError::Unavailable { .. }));
        assert_eq!(err.to_string(), "history unavailable: connection refused");
    }
}
