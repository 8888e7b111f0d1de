//! `PostgreSQL` adapters for reconciliation persistence.

mod models;
mod schema;
mod store;

pub use store::{PostgresReconciliationStore, ReconciliationPgPool};
