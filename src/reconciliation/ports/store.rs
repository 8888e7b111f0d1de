//! Storage port for consignments, shift tasks, and product bindings.
//!
//! Every service call runs its body inside one [`ReconciliationStore::scoped`]
//! call. The body sees a [`StoreSession`] and performs row-level operations
//! synchronously; the store commits when the body returns `Ok` and rolls back
//! when it returns `Err`.

use crate::reconciliation::{
    domain::{
        AggregationState, BindingId, ConsignmentId, ConsignmentKey, ProductCode, ShiftTask,
        TaskId, TaskInput, TaskPatch, TaskRecord,
    },
    query::{Page, TaskQuery},
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Kind of transactional scope requested by a service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    /// Queries only; nothing is ever persisted.
    ReadOnly,
    /// Writes commit on success and roll back on failure.
    ReadWrite,
}

/// Row-level operations available inside a transactional scope.
pub trait StoreSession {
    /// Finds a consignment by its exact natural key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_consignment_by_key(
        &mut self,
        key: ConsignmentKey,
    ) -> StoreResult<Option<ConsignmentId>>;

    /// Creates a consignment for `key`.
    ///
    /// If a concurrent writer created the same key first, returns that
    /// consignment's identifier instead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn create_consignment(&mut self, key: ConsignmentKey) -> StoreResult<ConsignmentId>;

    /// Inserts a new task referencing `consignment_id` with `closed_at` unset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_task(
        &mut self,
        task: &TaskInput,
        consignment_id: ConsignmentId,
    ) -> StoreResult<TaskId>;

    /// Returns one page of tasks matching `query`, ordered by task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn query_tasks(&mut self, query: &TaskQuery, page: Page) -> StoreResult<Vec<TaskRecord>>;

    /// Loads a single task with its consignment and bound products.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_task(&mut self, id: TaskId) -> StoreResult<Option<TaskRecord>>;

    /// Applies `patch` to a task, stamping `closed_at` when it is `Some`.
    ///
    /// Returns `None` when no task has the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn update_task(
        &mut self,
        id: TaskId,
        patch: &TaskPatch,
        closed_at: Option<NaiveDateTime>,
    ) -> StoreResult<Option<ShiftTask>>;

    /// Binds a product to a consignment, creating the product if needed.
    ///
    /// Returns `None` when the pair is already bound; the existing binding and
    /// its aggregation state are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert_binding(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
        state: AggregationState,
    ) -> StoreResult<Option<BindingId>>;

    /// Returns the aggregation state of the binding for the exact pair.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_binding(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
    ) -> StoreResult<Option<AggregationState>>;

    /// Returns every consignment the product is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_consignments_for_product(
        &mut self,
        product: &ProductCode,
    ) -> StoreResult<Vec<ConsignmentId>>;

    /// Moves a pending binding to aggregated.
    ///
    /// Returns `false` when no pending binding exists for the pair, for
    /// example because a concurrent call aggregated it first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn mark_binding_aggregated(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
        aggregated_at: NaiveDateTime,
    ) -> StoreResult<bool>;
}

/// Transactional storage contract.
#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// Runs `body` inside a single transactional scope.
    ///
    /// The scope commits when `body` returns `Ok` in
    /// [`ScopeMode::ReadWrite`], rolls back when it returns `Err`, and always
    /// releases the underlying handle. Business failures raised by `body`
    /// therefore leave no partial writes behind.
    ///
    /// # Errors
    ///
    /// Returns the error raised by `body`, or a [`StoreError`] converted into
    /// `E` when acquiring, committing, or rolling back the scope fails.
    async fn scoped<T, E, F>(&self, mode: ScopeMode, body: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut dyn StoreSession) -> Result<T, E> + Send + 'static;
}

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
