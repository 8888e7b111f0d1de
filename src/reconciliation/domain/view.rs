//! Joined task records and their denormalized response shape.

use super::{Consignment, ConsignmentId, ProductCode, ShiftTask, TaskId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A task joined with its consignment and the consignment's bound products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// The task row.
    pub task: ShiftTask,
    /// The owning consignment.
    pub consignment: Consignment,
    /// Every product bound to the consignment, regardless of aggregation.
    pub products: Vec<ProductCode>,
}

/// Denormalized task view returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    /// Task identifier.
    pub id: TaskId,
    /// Owning consignment identifier.
    pub consignment_id: ConsignmentId,
    /// Whether the task is closed.
    pub close_status: bool,
    /// Human-readable task title.
    pub name: String,
    /// Production line (work centre).
    pub line: String,
    /// Shift label.
    pub shift: String,
    /// Crew label.
    pub brigade: String,
    /// Batch number of the owning consignment.
    pub consignment_number: i32,
    /// Batch date of the owning consignment.
    pub consignment_date: NaiveDate,
    /// Nomenclature description.
    pub nomenclature: String,
    /// Unified catalogue code.
    pub code: String,
    /// Work centre identifier.
    pub identifier: String,
    /// Shift start.
    pub started_at: NaiveDateTime,
    /// Shift end.
    pub completed_at: NaiveDateTime,
    /// When the task was closed, if ever.
    pub closed_at: Option<NaiveDateTime>,
    /// Products bound to the owning consignment.
    pub products: Vec<ProductCode>,
}
