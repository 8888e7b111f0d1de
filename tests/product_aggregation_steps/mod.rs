//! Step definitions for product aggregation scenarios.

mod given;
mod then;
