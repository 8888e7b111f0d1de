//! Domain model for consignment reconciliation.
//!
//! Consignments, shift tasks, and products are independent entities. The
//! product-to-consignment binding is an explicit record owned by the
//! consignment side and carries the aggregation state.

mod consignment;
mod error;
mod ids;
mod product;
mod shift_task;
mod view;
pub(crate) mod wire;

pub use consignment::{Consignment, ConsignmentKey};
pub use error::{DomainError, ParseBindingPolicyError};
pub use ids::{BindingId, ConsignmentId, ProductCode, TaskId};
pub use product::{AggregationState, BindingPolicy, ProductInput};
pub use shift_task::{ShiftTask, TaskInput, TaskPatch};
pub use view::{TaskRecord, TaskView};
