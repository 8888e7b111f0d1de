//! Service-level error taxonomy.

use crate::reconciliation::{
    domain::{ConsignmentId, ProductCode, TaskId},
    ports::StoreError,
};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised by reconciliation and query operations.
///
/// Business failures abort the enclosing transactional scope, so a failed
/// call never leaves partial writes behind.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// No shift task has the identifier.
    #[error("shift task not found: {0}")]
    TaskNotFound(TaskId),

    /// The product is not bound to any consignment.
    #[error("product {0} is not bound to any consignment")]
    ProductNotFound(ProductCode),

    /// The binding for the pair was already aggregated.
    #[error(
        "product {product} was already aggregated into consignment {consignment_id} at \
         {aggregated_at}"
    )]
    AlreadyAggregated {
        /// Product being aggregated.
        product: ProductCode,
        /// Consignment requested by the caller.
        consignment_id: ConsignmentId,
        /// When the earlier aggregation happened.
        aggregated_at: NaiveDateTime,
    },

    /// The product is bound only to other consignments.
    #[error("product {product} is bound to a different consignment than {requested}")]
    BoundToOtherConsignment {
        /// Product being aggregated.
        product: ProductCode,
        /// Consignment requested by the caller.
        requested: ConsignmentId,
        /// Consignments the product is actually bound to.
        bound: Vec<ConsignmentId>,
    },

    /// Storage operation failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Coarse classification used by request handlers to pick response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced record does not exist.
    NotFound,
    /// The request contradicts the current state.
    Conflict,
    /// Opaque storage failure.
    Storage,
}

impl ReconciliationError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TaskNotFound(_) | Self::ProductNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyAggregated { .. } | Self::BoundToOtherConsignment { .. } => {
                ErrorKind::Conflict
            }
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for reconciliation service operations.
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;
