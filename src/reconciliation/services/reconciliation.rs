//! Service layer for task ingestion, product registration, and aggregation.

use super::{ReconciliationError, ReconciliationResult, TaskQueryService};
use crate::reconciliation::{
    domain::{
        AggregationState, BindingPolicy, ConsignmentId, ConsignmentKey, ProductCode,
        ProductInput, TaskId, TaskInput, TaskPatch, TaskRecord, TaskView,
    },
    ports::{ReconciliationStore, ScopeMode, StoreResult, StoreSession},
    query::{Page, TaskQuery},
};
use chrono::NaiveDateTime;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome counts of a product registration batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// New bindings created.
    pub bound: usize,
    /// Entries whose product was already bound to the consignment.
    pub already_bound: usize,
    /// Entries skipped because their consignment does not exist.
    pub skipped: usize,
}

/// Consignment reconciliation orchestration service.
#[derive(Clone)]
pub struct ReconciliationService<S, C>
where
    S: ReconciliationStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    queries: TaskQueryService<S>,
    binding_policy: BindingPolicy,
}

impl<S, C> ReconciliationService<S, C>
where
    S: ReconciliationStore,
    C: Clock + Send + Sync,
{
    /// Creates a new reconciliation service with [`BindingPolicy::Pending`].
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        let queries = TaskQueryService::new(Arc::clone(&store));
        Self {
            store,
            clock,
            queries,
            binding_policy: BindingPolicy::default(),
        }
    }

    /// Sets the initial state given to bindings created by registration.
    #[must_use]
    pub const fn with_binding_policy(mut self, policy: BindingPolicy) -> Self {
        self.binding_policy = policy;
        self
    }

    /// Returns the active binding policy.
    #[must_use]
    pub const fn binding_policy(&self) -> BindingPolicy {
        self.binding_policy
    }

    /// Returns the read-side query service sharing this service's store.
    #[must_use]
    pub const fn queries(&self) -> &TaskQueryService<S> {
        &self.queries
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.utc().naive_utc()
    }

    /// Returns the consignment for `key`, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::Storage`] when persistence fails.
    #[instrument(skip(self))]
    pub async fn resolve_consignment(
        &self,
        key: ConsignmentKey,
    ) -> ReconciliationResult<ConsignmentId> {
        self.store
            .scoped(
                ScopeMode::ReadWrite,
                move |session| -> ReconciliationResult<ConsignmentId> {
                    Ok(resolve_consignment(session, key)?)
                },
            )
            .await
    }

    /// Stores a batch of shift tasks, creating consignments on demand.
    ///
    /// The batch is atomic: either every task is stored or none is. Ingesting
    /// the same task twice stores it twice.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::Storage`] when persistence fails.
    #[instrument(skip_all, fields(count = tasks.len()))]
    pub async fn ingest_tasks(&self, tasks: Vec<TaskInput>) -> ReconciliationResult<Vec<TaskId>> {
        let ids = self
            .store
            .scoped(
                ScopeMode::ReadWrite,
                move |session| -> ReconciliationResult<Vec<TaskId>> {
                    let mut ids = Vec::with_capacity(tasks.len());
                    for task in &tasks {
                        let consignment_id = resolve_consignment(session, task.consignment_key())?;
                        ids.push(session.insert_task(task, consignment_id)?);
                    }
                    Ok(ids)
                },
            )
            .await?;
        info!(stored = ids.len(), "ingested shift tasks");
        Ok(ids)
    }

    /// Binds products to existing consignments.
    ///
    /// Entries naming an unknown consignment are skipped without error, and
    /// entries already bound keep their current aggregation state.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::Storage`] when persistence fails.
    #[instrument(skip_all, fields(count = products.len(), policy = self.binding_policy.as_str()))]
    pub async fn register_products(
        &self,
        products: Vec<ProductInput>,
    ) -> ReconciliationResult<RegistrationReport> {
        let initial_state = self.binding_policy.initial_state(self.now());
        let report = self
            .store
            .scoped(
                ScopeMode::ReadWrite,
                move |session| -> ReconciliationResult<RegistrationReport> {
                    let mut report = RegistrationReport::default();
                    for entry in &products {
                        let key = entry.consignment_key();
                        let Some(consignment_id) = session.find_consignment_by_key(key)? else {
                            debug!(product = %entry.product_id, %key, "consignment unknown, skipping");
                            report.skipped += 1;
                            continue;
                        };
                        let inserted =
                            session.insert_binding(&entry.product_id, consignment_id, initial_state)?;
                        if inserted.is_some() {
                            report.bound += 1;
                        } else {
                            report.already_bound += 1;
                        }
                    }
                    Ok(report)
                },
            )
            .await?;
        info!(
            bound = report.bound,
            already_bound = report.already_bound,
            skipped = report.skipped,
            "registered products"
        );
        Ok(report)
    }

    /// Lists one page of tasks matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::Storage`] when the read fails.
    pub async fn list_tasks(
        &self,
        query: TaskQuery,
        page: Page,
    ) -> ReconciliationResult<Vec<TaskView>> {
        self.queries.list_tasks(query, page).await
    }

    /// Loads a single task view.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::TaskNotFound`] when no task has the
    /// identifier.
    pub async fn get_task(&self, id: TaskId) -> ReconciliationResult<TaskView> {
        self.queries
            .get_task_view(id)
            .await?
            .ok_or(ReconciliationError::TaskNotFound(id))
    }

    /// Applies a sparse update to a task and returns the reloaded view.
    ///
    /// A patch with `close_status == Some(true)` also stamps `closed_at`;
    /// otherwise `closed_at` is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`ReconciliationError::TaskNotFound`] when no task has the
    /// identifier.
    #[instrument(skip(self, patch))]
    pub async fn update_task(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> ReconciliationResult<TaskView> {
        let closed_at = patch.closes_task().then(|| self.now());
        let record = self
            .store
            .scoped(
                ScopeMode::ReadWrite,
                move |session| -> ReconciliationResult<TaskRecord> {
                    if session.update_task(id, &patch, closed_at)?.is_none() {
                        return Err(ReconciliationError::TaskNotFound(id));
                    }
                    session
                        .find_task(id)?
                        .ok_or(ReconciliationError::TaskNotFound(id))
                },
            )
            .await?;
        Ok(TaskView::from(record))
    }

    /// Confirms that `product` physically belongs to `consignment_id`.
    ///
    /// Succeeds once per binding. The exact pair is checked before any other
    /// binding of the product, so a product bound to the requested
    /// consignment always aggregates on the first call.
    ///
    /// # Errors
    ///
    /// - [`ReconciliationError::AlreadyAggregated`] when the pair was
    ///   aggregated before.
    /// - [`ReconciliationError::BoundToOtherConsignment`] when the product is
    ///   bound, but not to `consignment_id`.
    /// - [`ReconciliationError::ProductNotFound`] when the product has no
    ///   bindings at all.
    #[instrument(skip(self, product), fields(product = %product))]
    pub async fn aggregate_product(
        &self,
        consignment_id: ConsignmentId,
        product: ProductCode,
    ) -> ReconciliationResult<()> {
        let now = self.now();
        let result = self
            .store
            .scoped(ScopeMode::ReadWrite, move |session| {
                aggregate_binding(session, consignment_id, product, now)
            })
            .await;
        match &result {
            Ok(()) => info!(%consignment_id, "product aggregated"),
            Err(err @ ReconciliationError::Storage(_)) => warn!(error = %err, "aggregation failed"),
            Err(err) => warn!(error = %err, "aggregation rejected"),
        }
        result
    }
}

/// Looks a consignment up by natural key and creates it when missing.
fn resolve_consignment(
    session: &mut dyn StoreSession,
    key: ConsignmentKey,
) -> StoreResult<ConsignmentId> {
    if let Some(id) = session.find_consignment_by_key(key)? {
        return Ok(id);
    }
    let id = session.create_consignment(key)?;
    debug!(%key, consignment_id = %id, "created consignment");
    Ok(id)
}

fn aggregate_binding(
    session: &mut dyn StoreSession,
    consignment_id: ConsignmentId,
    product: ProductCode,
    now: NaiveDateTime,
) -> ReconciliationResult<()> {
    match session.find_binding(&product, consignment_id)? {
        Some(AggregationState::Aggregated { at }) => Err(ReconciliationError::AlreadyAggregated {
            product,
            consignment_id,
            aggregated_at: at,
        }),
        Some(AggregationState::Pending) => {
            if session.mark_binding_aggregated(&product, consignment_id, now)? {
                return Ok(());
            }
            // Lost a race with a concurrent aggregation of the same pair.
            let aggregated_at = session
                .find_binding(&product, consignment_id)?
                .and_then(AggregationState::aggregated_at)
                .unwrap_or(now);
            Err(ReconciliationError::AlreadyAggregated {
                product,
                consignment_id,
                aggregated_at,
            })
        }
        None => {
            let bound = session.find_consignments_for_product(&product)?;
            if bound.is_empty() {
                Err(ReconciliationError::ProductNotFound(product))
            } else {
                Err(ReconciliationError::BoundToOtherConsignment {
                    product,
                    requested: consignment_id,
                    bound,
                })
            }
        }
    }
}
