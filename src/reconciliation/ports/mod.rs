//! Port contracts for consignment reconciliation.
//!
//! Ports define infrastructure-agnostic interfaces used by the services.

pub mod store;

pub use store::{ReconciliationStore, ScopeMode, StoreError, StoreResult, StoreSession};
