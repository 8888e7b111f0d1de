//! Error types for reconciliation domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    /// The product code is empty after trimming.
    #[error("product code must not be empty")]
    EmptyProductCode,

    /// Persisted aggregation columns disagree with each other.
    #[error(
        "inconsistent aggregation columns: is_aggregated={is_aggregated}, \
         aggregated_at present={has_timestamp}"
    )]
    InconsistentAggregation {
        /// Persisted aggregation flag.
        is_aggregated: bool,
        /// Whether an aggregation timestamp was persisted.
        has_timestamp: bool,
    },
}

/// Error returned while parsing a binding policy name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown binding policy: {0}")]
pub struct ParseBindingPolicyError(pub String);
