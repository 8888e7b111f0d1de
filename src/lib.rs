//! Shiftdesk: shift-task and product reconciliation for production batches.
//!
//! Upstream planning systems push shift tasks and product codes. Each task
//! belongs to a consignment identified by batch number and date; products are
//! bound to consignments and later aggregated once they are physically
//! confirmed against a batch.
//!
//! # Architecture
//!
//! Shiftdesk follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`reconciliation`]: Consignments, shift tasks, product bindings and task queries
//! - [`config`]: Environment-driven configuration

pub mod config;
pub mod reconciliation;
