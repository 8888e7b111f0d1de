//! Adapter implementations of the reconciliation ports.

pub mod memory;
pub mod postgres;
