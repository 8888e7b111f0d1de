//! Diesel row models for reconciliation persistence.

use super::schema::{consignments, products_to_consignments, shift_tasks};
use crate::reconciliation::domain::{
    ConsignmentId, ConsignmentKey, ShiftTask, TaskId, TaskInput, TaskPatch,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

/// Query result row for consignments.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = consignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConsignmentRow {
    /// Generated consignment identifier.
    pub id: i32,
    /// Batch number.
    pub consignment_number: i32,
    /// Batch date.
    pub consignment_date: NaiveDate,
}

impl ConsignmentRow {
    /// Returns the natural key of the row.
    pub const fn key(&self) -> ConsignmentKey {
        ConsignmentKey::new(self.consignment_number, self.consignment_date)
    }
}

/// Insert model for consignments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = consignments)]
pub struct NewConsignmentRow {
    /// Batch number.
    pub consignment_number: i32,
    /// Batch date.
    pub consignment_date: NaiveDate,
}

impl From<ConsignmentKey> for NewConsignmentRow {
    fn from(key: ConsignmentKey) -> Self {
        Self {
            consignment_number: key.number(),
            consignment_date: key.date(),
        }
    }
}

/// Query result row for shift tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shift_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShiftTaskRow {
    /// Generated task identifier.
    pub id: i32,
    /// Close flag.
    pub close_status: bool,
    /// Task title.
    pub name: String,
    /// Production line.
    pub line: String,
    /// Shift label.
    pub shift: String,
    /// Crew label.
    pub brigade: String,
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
    /// Owning consignment.
    pub consignment_id: i32,
    /// Closing time.
    pub closed_at: Option<NaiveDateTime>,
}

impl From<ShiftTaskRow> for ShiftTask {
    fn from(row: ShiftTaskRow) -> Self {
        Self {
            id: TaskId::new(row.id),
            consignment_id: ConsignmentId::new(row.consignment_id),
            close_status: row.close_status,
            name: row.name,
            line: row.line,
            shift: row.shift,
            brigade: row.brigade,
            nomenclature: row.nomenclature,
            code: row.code,
            identifier: row.identifier,
            started_at: row.started_at,
            completed_at: row.completed_at,
            closed_at: row.closed_at,
        }
    }
}

/// Insert model for shift tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shift_tasks)]
pub struct NewShiftTaskRow<'a> {
    /// Close flag.
    pub close_status: bool,
    /// Task title.
    pub name: &'a str,
    /// Production line.
    pub line: &'a str,
    /// Shift label.
    pub shift: &'a str,
    /// Crew label.
    pub brigade: &'a str,
    /// Nomenclature description.
    pub nomenclature: &'a str,
    /// Unified catalogue code.
    pub code: &'a str,
    /// Work centre identifier.
    pub identifier: &'a str,
    /// Shift start.
    pub started_at: NaiveDateTime,
    /// Shift end.
    pub completed_at: NaiveDateTime,
    /// Owning consignment.
    pub consignment_id: i32,
    /// Closing time; always unset on insert.
    pub closed_at: Option<NaiveDateTime>,
}

impl<'a> NewShiftTaskRow<'a> {
    /// Builds an insert row from an ingested task.
    pub fn from_input(input: &'a TaskInput, consignment_id: ConsignmentId) -> Self {
        Self {
            close_status: input.close_status,
            name: input.name.as_str(),
            line: input.line.as_str(),
            shift: input.shift.as_str(),
            brigade: input.brigade.as_str(),
            nomenclature: input.nomenclature.as_str(),
            code: input.code.as_str(),
            identifier: input.identifier.as_str(),
            started_at: input.started_at,
            completed_at: input.completed_at,
            consignment_id: consignment_id.into_inner(),
            closed_at: None,
        }
    }
}

/// Sparse update for shift tasks. `None` fields are not written.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = shift_tasks)]
pub struct ShiftTaskChangeset<'a> {
    /// Close flag.
    pub close_status: Option<bool>,
    /// Task title.
    pub name: Option<&'a str>,
    /// Production line.
    pub line: Option<&'a str>,
    /// Shift label.
    pub shift: Option<&'a str>,
    /// Crew label.
    pub brigade: Option<&'a str>,
    /// Nomenclature description.
    pub nomenclature: Option<&'a str>,
    /// Unified catalogue code.
    pub code: Option<&'a str>,
    /// Work centre identifier.
    pub identifier: Option<&'a str>,
    /// Shift start.
    pub started_at: Option<NaiveDateTime>,
    /// Shift end.
    pub completed_at: Option<NaiveDateTime>,
    /// Closing time.
    pub closed_at: Option<NaiveDateTime>,
}

impl<'a> ShiftTaskChangeset<'a> {
    /// Builds a changeset from a patch and an optional closing time.
    pub fn new(patch: &'a TaskPatch, closed_at: Option<NaiveDateTime>) -> Self {
        Self {
            close_status: patch.close_status,
            name: patch.name.as_deref(),
            line: patch.line.as_deref(),
            shift: patch.shift.as_deref(),
            brigade: patch.brigade.as_deref(),
            nomenclature: patch.nomenclature.as_deref(),
            code: patch.code.as_deref(),
            identifier: patch.identifier.as_deref(),
            started_at: patch.started_at,
            completed_at: patch.completed_at,
            closed_at,
        }
    }

    /// Returns `true` when no column would be written.
    ///
    /// Diesel rejects empty changesets, so callers fall back to a plain read.
    pub const fn is_empty(&self) -> bool {
        self.close_status.is_none()
            && self.name.is_none()
            && self.line.is_none()
            && self.shift.is_none()
            && self.brigade.is_none()
            && self.nomenclature.is_none()
            && self.code.is_none()
            && self.identifier.is_none()
            && self.started_at.is_none()
            && self.completed_at.is_none()
            && self.closed_at.is_none()
    }
}

/// Insert model for product-to-consignment bindings.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = products_to_consignments)]
pub struct NewBindingRow<'a> {
    /// Bound product.
    pub product_id: &'a str,
    /// Bound consignment.
    pub consignment_id: i32,
    /// Aggregation flag.
    pub is_aggregated: bool,
    /// Aggregation time.
    pub aggregated_at: Option<NaiveDateTime>,
}
