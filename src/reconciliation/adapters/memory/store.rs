//! In-memory reconciliation store for tests and local tooling.
//!
//! Each scope works on a private copy of the state. The copy replaces the
//! shared state only when a read-write body succeeds, which gives the same
//! all-or-nothing behaviour as a database transaction. Scopes are serialized
//! by the state mutex.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::reconciliation::{
    domain::{
        AggregationState, BindingId, Consignment, ConsignmentId, ConsignmentKey, ProductCode,
        ShiftTask, TaskId, TaskInput, TaskPatch, TaskRecord,
    },
    ports::{ReconciliationStore, ScopeMode, StoreError, StoreResult, StoreSession},
    query::{Page, TaskQuery},
};

/// Thread-safe in-memory reconciliation store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReconciliationStore {
    state: Arc<Mutex<InMemoryState>>,
}

#[derive(Debug, Clone)]
struct BindingRow {
    product: ProductCode,
    consignment_id: ConsignmentId,
    state: AggregationState,
}

#[derive(Debug, Clone, Default)]
struct InMemoryState {
    consignments: BTreeMap<ConsignmentId, ConsignmentKey>,
    consignment_index: HashMap<ConsignmentKey, ConsignmentId>,
    tasks: BTreeMap<TaskId, ShiftTask>,
    products: BTreeSet<ProductCode>,
    bindings: Vec<BindingRow>,
    last_consignment_id: i32,
    last_task_id: i32,
    last_binding_id: i32,
    task_insert_budget: Option<usize>,
}

impl InMemoryReconciliationStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes task inserts fail once `remaining` more inserts have succeeded.
    ///
    /// Used to exercise rollback of partially processed batches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn fail_task_inserts_after(&self, remaining: usize) -> StoreResult<()> {
        self.with_state(|state| state.task_insert_budget = Some(remaining))
    }

    /// Returns the number of stored consignments.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn consignment_count(&self) -> StoreResult<usize> {
        self.with_state(|state| state.consignments.len())
    }

    /// Returns the number of stored shift tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn task_count(&self) -> StoreResult<usize> {
        self.with_state(|state| state.tasks.len())
    }

    /// Returns the number of stored bindings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the state lock is poisoned.
    pub fn binding_count(&self) -> StoreResult<usize> {
        self.with_state(|state| state.bindings.len())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut InMemoryState) -> T) -> StoreResult<T> {
        let mut state = self.state.lock().map_err(lock_error)?;
        Ok(f(&mut state))
    }
}

fn lock_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ReconciliationStore for InMemoryReconciliationStore {
    async fn scoped<T, E, F>(&self, mode: ScopeMode, body: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut dyn StoreSession) -> Result<T, E> + Send + 'static,
    {
        let mut shared = self.state.lock().map_err(|err| E::from(lock_error(err)))?;
        let mut working = shared.clone();
        let result = body(&mut InMemorySession {
            state: &mut working,
        });
        if mode == ScopeMode::ReadWrite && result.is_ok() {
            *shared = working;
        }
        result
    }
}

struct InMemorySession<'a> {
    state: &'a mut InMemoryState,
}

impl InMemorySession<'_> {
    fn record_for(&self, task: &ShiftTask) -> Option<TaskRecord> {
        let key = self.state.consignments.get(&task.consignment_id)?;
        Some(TaskRecord {
            task: task.clone(),
            consignment: Consignment::from_persisted(task.consignment_id, *key),
            products: self.products_of(task.consignment_id),
        })
    }

    fn products_of(&self, consignment_id: ConsignmentId) -> Vec<ProductCode> {
        self.state
            .bindings
            .iter()
            .filter(|binding| binding.consignment_id == consignment_id)
            .map(|binding| binding.product.clone())
            .collect()
    }

    fn binding_mut(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
    ) -> Option<&mut BindingRow> {
        self.state
            .bindings
            .iter_mut()
            .find(|binding| binding.product == *product && binding.consignment_id == consignment_id)
    }
}

impl StoreSession for InMemorySession<'_> {
    fn find_consignment_by_key(
        &mut self,
        key: ConsignmentKey,
    ) -> StoreResult<Option<ConsignmentId>> {
        Ok(self.state.consignment_index.get(&key).copied())
    }

    fn create_consignment(&mut self, key: ConsignmentKey) -> StoreResult<ConsignmentId> {
        if let Some(existing) = self.state.consignment_index.get(&key) {
            return Ok(*existing);
        }
        self.state.last_consignment_id += 1;
        let id = ConsignmentId::new(self.state.last_consignment_id);
        self.state.consignments.insert(id, key);
        self.state.consignment_index.insert(key, id);
        Ok(id)
    }

    fn insert_task(
        &mut self,
        task: &TaskInput,
        consignment_id: ConsignmentId,
    ) -> StoreResult<TaskId> {
        if let Some(remaining) = self.state.task_insert_budget.as_mut() {
            if *remaining == 0 {
                return Err(StoreError::persistence(std::io::Error::other(
                    "injected task insert failure",
                )));
            }
            *remaining -= 1;
        }
        self.state.last_task_id += 1;
        let id = TaskId::new(self.state.last_task_id);
        self.state
            .tasks
            .insert(id, ShiftTask::from_input(id, consignment_id, task));
        Ok(id)
    }

    fn query_tasks(&mut self, query: &TaskQuery, page: Page) -> StoreResult<Vec<TaskRecord>> {
        let matching = self.state.tasks.values().filter(|task| {
            self.state
                .consignments
                .get(&task.consignment_id)
                .is_some_and(|key| query.matches(task, *key))
        });
        Ok(page
            .apply(matching)
            .filter_map(|task| self.record_for(task))
            .collect())
    }

    fn find_task(&mut self, id: TaskId) -> StoreResult<Option<TaskRecord>> {
        Ok(self
            .state
            .tasks
            .get(&id)
            .and_then(|task| self.record_for(task)))
    }

    fn update_task(
        &mut self,
        id: TaskId,
        patch: &TaskPatch,
        closed_at: Option<NaiveDateTime>,
    ) -> StoreResult<Option<ShiftTask>> {
        Ok(self.state.tasks.get_mut(&id).map(|task| {
            task.apply_patch(patch, closed_at);
            task.clone()
        }))
    }

    fn insert_binding(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
        state: AggregationState,
    ) -> StoreResult<Option<BindingId>> {
        self.state.products.insert(product.clone());
        if self.binding_mut(product, consignment_id).is_some() {
            return Ok(None);
        }
        self.state.last_binding_id += 1;
        let id = BindingId::new(self.state.last_binding_id);
        self.state.bindings.push(BindingRow {
            product: product.clone(),
            consignment_id,
            state,
        });
        Ok(Some(id))
    }

    fn find_binding(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
    ) -> StoreResult<Option<AggregationState>> {
        Ok(self
            .binding_mut(product, consignment_id)
            .map(|binding| binding.state))
    }

    fn find_consignments_for_product(
        &mut self,
        product: &ProductCode,
    ) -> StoreResult<Vec<ConsignmentId>> {
        let mut ids: Vec<ConsignmentId> = self
            .state
            .bindings
            .iter()
            .filter(|binding| binding.product == *product)
            .map(|binding| binding.consignment_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    fn mark_binding_aggregated(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
        aggregated_at: NaiveDateTime,
    ) -> StoreResult<bool> {
        match self.binding_mut(product, consignment_id) {
            Some(binding) if binding.state == AggregationState::Pending => {
                binding.state = AggregationState::Aggregated { at: aggregated_at };
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
