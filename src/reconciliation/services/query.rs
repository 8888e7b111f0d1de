//! Read-side service for filtered task listings.

use super::ReconciliationResult;
use crate::reconciliation::{
    domain::{TaskId, TaskRecord, TaskView},
    ports::{ReconciliationStore, ScopeMode},
    query::{Page, TaskQuery},
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Filtered, paginated task reads in a read-only scope.
#[derive(Clone)]
pub struct TaskQueryService<S>
where
    S: ReconciliationStore,
{
    store: Arc<S>,
}

impl<S> TaskQueryService<S>
where
    S: ReconciliationStore,
{
    /// Creates a new query service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Lists one page of tasks matching `query`, ordered by task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`super::ReconciliationError::Storage`] when the read fails.
    #[instrument(skip_all, fields(offset = page.offset(), limit = page.limit()))]
    pub async fn list_tasks(
        &self,
        query: TaskQuery,
        page: Page,
    ) -> ReconciliationResult<Vec<TaskView>> {
        let records = self
            .store
            .scoped(
                ScopeMode::ReadOnly,
                move |session| -> ReconciliationResult<Vec<TaskRecord>> {
                    Ok(session.query_tasks(&query, page)?)
                },
            )
            .await?;
        debug!(returned = records.len(), "listed shift tasks");
        Ok(records.into_iter().map(TaskView::from).collect())
    }

    /// Loads a single task view.
    ///
    /// Returns `Ok(None)` when no task has the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`super::ReconciliationError::Storage`] when the read fails.
    #[instrument(skip(self))]
    pub async fn get_task_view(&self, id: TaskId) -> ReconciliationResult<Option<TaskView>> {
        let record = self
            .store
            .scoped(
                ScopeMode::ReadOnly,
                move |session| -> ReconciliationResult<Option<TaskRecord>> {
                    Ok(session.find_task(id)?)
                },
            )
            .await?;
        Ok(record.map(TaskView::from))
    }
}
