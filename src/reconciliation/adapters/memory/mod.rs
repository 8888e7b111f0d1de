//! In-memory adapters for reconciliation persistence.

mod store;

pub use store::InMemoryReconciliationStore;
