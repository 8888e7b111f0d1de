//! Embedded `PostgreSQL` helpers for reconciliation store tests.

use std::future::Future;
use std::sync::Arc;

use crate::test_helpers::{FixedClock, init_tracing};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::BigInt;
use pg_embedded_setup_unpriv::TestCluster;
use shiftdesk::reconciliation::{
    adapters::postgres::PostgresReconciliationStore, services::ReconciliationService,
};
use tokio::runtime::Runtime;

/// Service type used by the `PostgreSQL` tests.
pub type PgService = ReconciliationService<PostgresReconciliationStore, FixedClock>;

/// SQL to create the reconciliation schema.
const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-19-000000_create_reconciliation_tables/up.sql");

/// Template database name for pre-migrated schema.
const TEMPLATE_DB: &str = "shiftdesk_test_template";

/// Creates a tokio runtime for async operations in tests.
fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            execute_sql_statements(&mut conn, CREATE_SCHEMA_SQL)?;
            Ok(())
        })
        .map_err(|e| eyre::eyre!("template setup failed: {e}"))
}

/// Executes each non-empty statement of a migration file in turn.
///
/// `diesel::sql_query` accepts one statement per call.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre::eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

/// Per-test database cloned from the template; dropped with the guard.
struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
}

impl TestDatabase {
    fn create(cluster: &'static TestCluster, prefix: &str) -> eyre::Result<Self> {
        ensure_template(cluster)?;
        let name = format!("test_{prefix}_{}", uuid::Uuid::new_v4());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .map_err(|e| eyre::eyre!("failed to create {name}: {e}"))?;
        Ok(Self { cluster, name })
    }

    fn url(&self) -> String {
        self.cluster.connection().database_url(&self.name)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.name);
        }
    }
}

#[derive(QueryableByName)]
struct RowCount {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// A fresh database with a store and a pinned-clock service over it.
///
/// Field order matters: the pool must close before the database is dropped.
pub struct PgHarness {
    runtime: Runtime,
    /// Store under test.
    pub store: Arc<PostgresReconciliationStore>,
    /// Service sharing `store`.
    pub service: PgService,
    database: TestDatabase,
}

impl PgHarness {
    /// Creates a database from the migrated template and wires a service to it.
    ///
    /// # Errors
    ///
    /// Returns an error when the database or its pool cannot be created.
    pub fn new(cluster: &'static TestCluster, prefix: &str) -> eyre::Result<Self> {
        init_tracing();
        let database = TestDatabase::create(cluster, prefix)?;
        let manager = ConnectionManager::<PgConnection>::new(database.url());
        // One connection keeps scope ordering deterministic.
        let pool = Pool::builder().max_size(1).build(manager)?;
        let store = Arc::new(PostgresReconciliationStore::new(pool));
        let clock = Arc::new(FixedClock::pinned());
        let service = ReconciliationService::new(Arc::clone(&store), clock);
        Ok(Self {
            runtime: test_runtime(),
            store,
            service,
            database,
        })
    }

    /// Drives a future to completion on the harness runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Opens a direct connection for raw SQL, bypassing the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be established.
    pub fn connect(&self) -> eyre::Result<PgConnection> {
        Ok(PgConnection::establish(&self.database.url())?)
    }

    /// Counts the rows of `table`.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub fn count_rows(&self, table: &str) -> eyre::Result<i64> {
        let mut conn = self.connect()?;
        let row = diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {table}"))
            .get_result::<RowCount>(&mut conn)?;
        Ok(row.count)
    }
}
