//! Task filtering, pagination, and response shaping.
//!
//! Adapters translate a [`TaskQuery`] into their own predicate form; the
//! in-memory adapter evaluates [`TaskQuery::matches`] directly while the
//! `PostgreSQL` adapter uses the timestamp bounds so the date filters stay
//! index-friendly.

mod filter;
mod shape;

pub use filter::{DEFAULT_PAGE_LIMIT, Page, TaskQuery};
pub use shape::group_products;
