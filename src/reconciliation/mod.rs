//! Consignment reconciliation for manufacturing shift tasks.
//!
//! Shift tasks are attached to consignments (production batches) identified
//! by a batch number and date; consignments are created the first time a key
//! is seen. Products are pre-registered against consignments and later
//! aggregated exactly once. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Filtering and response shaping in [`query`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod query;
pub mod services;
