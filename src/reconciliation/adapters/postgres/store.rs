//! `PostgreSQL` store implementation for consignment reconciliation.

use super::{
    models::{
        ConsignmentRow, NewBindingRow, NewConsignmentRow, NewShiftTaskRow, ShiftTaskChangeset,
        ShiftTaskRow,
    },
    schema::{consignments, products, products_to_consignments, shift_tasks},
};
use crate::reconciliation::{
    domain::{
        AggregationState, BindingId, Consignment, ConsignmentId, ConsignmentKey, ProductCode,
        ShiftTask, TaskId, TaskInput, TaskPatch, TaskRecord,
    },
    ports::{ReconciliationStore, ScopeMode, StoreError, StoreResult, StoreSession},
    query::{Page, TaskQuery, group_products},
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;
use thiserror::Error;

/// `PostgreSQL` connection pool type used by reconciliation adapters.
pub type ReconciliationPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed reconciliation store.
///
/// Each scope checks a connection out of the r2d2 pool and runs the body
/// inside a Diesel transaction on the blocking thread pool. Read-only scopes
/// use a `READ ONLY` transaction.
#[derive(Debug, Clone)]
pub struct PostgresReconciliationStore {
    pool: ReconciliationPgPool,
}

impl PostgresReconciliationStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ReconciliationPgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &ReconciliationPgPool {
        &self.pool
    }
}

/// Failure inside a Diesel transaction: either the body's own error or a
/// database error raised while opening or closing the transaction.
enum ScopeFailure<E> {
    Body(E),
    Database(DieselError),
}

impl<E> From<DieselError> for ScopeFailure<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

#[derive(Debug, Error)]
#[error("{0} row missing after conflicting insert")]
struct MissingRow(&'static str);

fn run_body<T, E, F>(connection: &mut PgConnection, body: F) -> Result<T, ScopeFailure<E>>
where
    F: FnOnce(&mut dyn StoreSession) -> Result<T, E>,
{
    let mut session = PgSession { connection };
    body(&mut session).map_err(ScopeFailure::Body)
}

#[async_trait]
impl ReconciliationStore for PostgresReconciliationStore {
    async fn scoped<T, E, F>(&self, mode: ScopeMode, body: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
        F: FnOnce(&mut dyn StoreSession) -> Result<T, E> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| E::from(StoreError::persistence(err)))?;
            let outcome = match mode {
                ScopeMode::ReadOnly => connection
                    .build_transaction()
                    .read_only()
                    .run(|tx| run_body(tx, body)),
                ScopeMode::ReadWrite => connection
                    .build_transaction()
                    .run(|tx| run_body(tx, body)),
            };
            outcome.map_err(|failure| match failure {
                ScopeFailure::Body(err) => err,
                ScopeFailure::Database(err) => E::from(StoreError::persistence(err)),
            })
        })
        .await
        .map_err(|err| E::from(StoreError::persistence(err)))?
    }
}

struct PgSession<'a> {
    connection: &'a mut PgConnection,
}

impl PgSession<'_> {
    fn attach_products(
        &mut self,
        rows: Vec<(ShiftTaskRow, ConsignmentRow)>,
    ) -> StoreResult<Vec<TaskRecord>> {
        let mut consignment_ids: Vec<i32> = rows.iter().map(|(_, row)| row.id).collect();
        consignment_ids.sort_unstable();
        consignment_ids.dedup();

        let bindings = products_to_consignments::table
            .filter(products_to_consignments::consignment_id.eq_any(consignment_ids))
            .order(products_to_consignments::id.asc())
            .select((
                products_to_consignments::consignment_id,
                products_to_consignments::product_id,
            ))
            .load::<(i32, String)>(self.connection)
            .map_err(StoreError::persistence)?
            .into_iter()
            .map(|(consignment_id, product_id)| {
                ProductCode::new(product_id)
                    .map(|code| (ConsignmentId::new(consignment_id), code))
                    .map_err(StoreError::persistence)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        let grouped = group_products(bindings);

        Ok(rows
            .into_iter()
            .map(|(task_row, consignment_row)| {
                let consignment = Consignment::from_persisted(
                    ConsignmentId::new(consignment_row.id),
                    consignment_row.key(),
                );
                let products = grouped
                    .get(&consignment.id())
                    .cloned()
                    .unwrap_or_default();
                TaskRecord {
                    task: ShiftTask::from(task_row),
                    consignment,
                    products,
                }
            })
            .collect())
    }
}

impl StoreSession for PgSession<'_> {
    fn find_consignment_by_key(
        &mut self,
        key: ConsignmentKey,
    ) -> StoreResult<Option<ConsignmentId>> {
        consignments::table
            .filter(consignments::consignment_number.eq(key.number()))
            .filter(consignments::consignment_date.eq(key.date()))
            .select(consignments::id)
            .first::<i32>(self.connection)
            .optional()
            .map(|id| id.map(ConsignmentId::new))
            .map_err(StoreError::persistence)
    }

    fn create_consignment(&mut self, key: ConsignmentKey) -> StoreResult<ConsignmentId> {
        let inserted = diesel::insert_into(consignments::table)
            .values(&NewConsignmentRow::from(key))
            .on_conflict((
                consignments::consignment_number,
                consignments::consignment_date,
            ))
            .do_nothing()
            .returning(consignments::id)
            .get_result::<i32>(self.connection)
            .optional()
            .map_err(StoreError::persistence)?;
        if let Some(id) = inserted {
            return Ok(ConsignmentId::new(id));
        }
        // A concurrent writer created the key first; its row is visible to
        // the next statement under read committed.
        self.find_consignment_by_key(key)?
            .ok_or_else(|| StoreError::persistence(MissingRow("consignment")))
    }

    fn insert_task(
        &mut self,
        task: &TaskInput,
        consignment_id: ConsignmentId,
    ) -> StoreResult<TaskId> {
        diesel::insert_into(shift_tasks::table)
            .values(&NewShiftTaskRow::from_input(task, consignment_id))
            .returning(shift_tasks::id)
            .get_result::<i32>(self.connection)
            .map(TaskId::new)
            .map_err(StoreError::persistence)
    }

    fn query_tasks(&mut self, query: &TaskQuery, page: Page) -> StoreResult<Vec<TaskRecord>> {
        let mut statement = shift_tasks::table
            .inner_join(consignments::table)
            .select((ShiftTaskRow::as_select(), ConsignmentRow::as_select()))
            .into_boxed();
        if let Some(close_status) = query.close_status() {
            statement = statement.filter(shift_tasks::close_status.eq(close_status));
        }
        if let Some(number) = query.consignment_number() {
            statement = statement.filter(consignments::consignment_number.eq(number));
        }
        if let Some(date) = query.consignment_date() {
            statement = statement.filter(consignments::consignment_date.eq(date));
        }
        if let Some(from) = query.started_from() {
            statement = statement.filter(shift_tasks::started_at.ge(from));
        }
        if let Some(before) = query.completed_before() {
            statement = statement.filter(shift_tasks::completed_at.lt(before));
        }

        let rows = statement
            .order(shift_tasks::id.asc())
            .offset(i64::from(page.offset()))
            .limit(i64::from(page.limit()))
            .load::<(ShiftTaskRow, ConsignmentRow)>(self.connection)
            .map_err(StoreError::persistence)?;
        self.attach_products(rows)
    }

    fn find_task(&mut self, id: TaskId) -> StoreResult<Option<TaskRecord>> {
        let row = shift_tasks::table
            .inner_join(consignments::table)
            .filter(shift_tasks::id.eq(id.into_inner()))
            .select((ShiftTaskRow::as_select(), ConsignmentRow::as_select()))
            .first::<(ShiftTaskRow, ConsignmentRow)>(self.connection)
            .optional()
            .map_err(StoreError::persistence)?;
        let Some(found) = row else {
            return Ok(None);
        };
        Ok(self.attach_products(vec![found])?.into_iter().next())
    }

    fn update_task(
        &mut self,
        id: TaskId,
        patch: &TaskPatch,
        closed_at: Option<NaiveDateTime>,
    ) -> StoreResult<Option<ShiftTask>> {
        let changeset = ShiftTaskChangeset::new(patch, closed_at);
        let target = shift_tasks::table.find(id.into_inner());
        let row = if changeset.is_empty() {
            target
                .select(ShiftTaskRow::as_select())
                .first::<ShiftTaskRow>(self.connection)
                .optional()
        } else {
            diesel::update(target)
                .set(&changeset)
                .returning(ShiftTaskRow::as_returning())
                .get_result::<ShiftTaskRow>(self.connection)
                .optional()
        }
        .map_err(StoreError::persistence)?;
        Ok(row.map(ShiftTask::from))
    }

    fn insert_binding(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
        state: AggregationState,
    ) -> StoreResult<Option<BindingId>> {
        diesel::insert_into(products::table)
            .values(products::product_id.eq(product.as_str()))
            .on_conflict_do_nothing()
            .execute(self.connection)
            .map_err(StoreError::persistence)?;

        let row = NewBindingRow {
            product_id: product.as_str(),
            consignment_id: consignment_id.into_inner(),
            is_aggregated: state.is_aggregated(),
            aggregated_at: state.aggregated_at(),
        };
        diesel::insert_into(products_to_consignments::table)
            .values(&row)
            .on_conflict((
                products_to_consignments::product_id,
                products_to_consignments::consignment_id,
            ))
            .do_nothing()
            .returning(products_to_consignments::id)
            .get_result::<i32>(self.connection)
            .optional()
            .map(|id| id.map(BindingId::new))
            .map_err(StoreError::persistence)
    }

    fn find_binding(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
    ) -> StoreResult<Option<AggregationState>> {
        let columns = products_to_consignments::table
            .filter(products_to_consignments::product_id.eq(product.as_str()))
            .filter(products_to_consignments::consignment_id.eq(consignment_id.into_inner()))
            .select((
                products_to_consignments::is_aggregated,
                products_to_consignments::aggregated_at,
            ))
            .first::<(bool, Option<NaiveDateTime>)>(self.connection)
            .optional()
            .map_err(StoreError::persistence)?;
        columns
            .map(|(is_aggregated, aggregated_at)| {
                AggregationState::from_columns(is_aggregated, aggregated_at)
                    .map_err(StoreError::persistence)
            })
            .transpose()
    }

    fn find_consignments_for_product(
        &mut self,
        product: &ProductCode,
    ) -> StoreResult<Vec<ConsignmentId>> {
        products_to_consignments::table
            .filter(products_to_consignments::product_id.eq(product.as_str()))
            .select(products_to_consignments::consignment_id)
            .distinct()
            .order(products_to_consignments::consignment_id.asc())
            .load::<i32>(self.connection)
            .map(|ids| ids.into_iter().map(ConsignmentId::new).collect())
            .map_err(StoreError::persistence)
    }

    fn mark_binding_aggregated(
        &mut self,
        product: &ProductCode,
        consignment_id: ConsignmentId,
        aggregated_at: NaiveDateTime,
    ) -> StoreResult<bool> {
        let updated = diesel::update(
            products_to_consignments::table
                .filter(products_to_consignments::product_id.eq(product.as_str()))
                .filter(products_to_consignments::consignment_id.eq(consignment_id.into_inner()))
                .filter(products_to_consignments::is_aggregated.eq(false)),
        )
        .set((
            products_to_consignments::is_aggregated.eq(true),
            products_to_consignments::aggregated_at.eq(Some(aggregated_at)),
        ))
        .execute(self.connection)
        .map_err(StoreError::persistence)?;
        Ok(updated > 0)
    }
}
