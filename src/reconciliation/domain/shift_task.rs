//! Shift task records, ingestion payloads, and partial updates.

use super::{ConsignmentId, ConsignmentKey, TaskId, wire};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// A shift task as delivered by the upstream planning export.
///
/// Field names on the wire follow the export format; timestamps keep their
/// wall-clock time with the UTC offset stripped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskInput {
    /// Whether the task is closed.
    #[serde(rename = "СтатусЗакрытия", alias = "close_status")]
    pub close_status: bool,
    /// Human-readable task title.
    #[serde(rename = "ПредставлениеЗаданияНаСмену", alias = "name")]
    pub name: String,
    /// Production line (work centre).
    #[serde(rename = "Рабочий центр", alias = "line")]
    pub line: String,
    /// Shift label.
    #[serde(rename = "Смена", alias = "shift")]
    pub shift: String,
    /// Crew label.
    #[serde(rename = "Бригада", alias = "brigade")]
    pub brigade: String,
    /// Batch number of the owning consignment.
    #[serde(rename = "НомерПартии", alias = "consignment_number")]
    pub consignment_number: i32,
    /// Batch date of the owning consignment.
    #[serde(rename = "ДатаПартии", alias = "consignment_date")]
    pub consignment_date: NaiveDate,
    /// Nomenclature (product line) description.
    #[serde(rename = "Номенклатура", alias = "nomenclature")]
    pub nomenclature: String,
    /// Unified catalogue code.
    #[serde(rename = "КодЕКН", alias = "code")]
    pub code: String,
    /// Work centre identifier.
    #[serde(rename = "ИдентификаторРЦ", alias = "identifier")]
    pub identifier: String,
    /// Shift start.
    #[serde(
        rename = "ДатаВремяНачалаСмены",
        alias = "started_at",
        deserialize_with = "wire::wall_clock"
    )]
    pub started_at: NaiveDateTime,
    /// Shift end.
    #[serde(
        rename = "ДатаВремяОкончанияСмены",
        alias = "completed_at",
        deserialize_with = "wire::wall_clock"
    )]
    pub completed_at: NaiveDateTime,
}

impl TaskInput {
    /// Returns the natural key of the consignment this task belongs to.
    #[must_use]
    pub const fn consignment_key(&self) -> ConsignmentKey {
        ConsignmentKey::new(self.consignment_number, self.consignment_date)
    }
}

/// A persisted shift task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftTask {
    /// Storage-generated task identifier.
    pub id: TaskId,
    /// Owning consignment.
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
    /// Nomenclature (product line) description.
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
}

impl ShiftTask {
    /// Builds a freshly ingested task; `closed_at` starts unset.
    #[must_use]
    pub fn from_input(id: TaskId, consignment_id: ConsignmentId, input: &TaskInput) -> Self {
        Self {
            id,
            consignment_id,
            close_status: input.close_status,
            name: input.name.clone(),
            line: input.line.clone(),
            shift: input.shift.clone(),
            brigade: input.brigade.clone(),
            nomenclature: input.nomenclature.clone(),
            code: input.code.clone(),
            identifier: input.identifier.clone(),
            started_at: input.started_at,
            completed_at: input.completed_at,
            closed_at: None,
        }
    }

    /// Applies the non-empty fields of `patch`.
    ///
    /// `closed_at` is only written when `Some`; an existing closing time is
    /// never cleared.
    pub fn apply_patch(&mut self, patch: &TaskPatch, closed_at: Option<NaiveDateTime>) {
        fn set<T: Clone>(target: &mut T, value: Option<&T>) {
            if let Some(new_value) = value {
                target.clone_from(new_value);
            }
        }

        set(&mut self.close_status, patch.close_status.as_ref());
        set(&mut self.name, patch.name.as_ref());
        set(&mut self.line, patch.line.as_ref());
        set(&mut self.shift, patch.shift.as_ref());
        set(&mut self.brigade, patch.brigade.as_ref());
        set(&mut self.nomenclature, patch.nomenclature.as_ref());
        set(&mut self.code, patch.code.as_ref());
        set(&mut self.identifier, patch.identifier.as_ref());
        set(&mut self.started_at, patch.started_at.as_ref());
        set(&mut self.completed_at, patch.completed_at.as_ref());
        if closed_at.is_some() {
            self.closed_at = closed_at;
        }
    }
}

/// Sparse update for a shift task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    /// New close flag. `Some(true)` also stamps the closing time.
    pub close_status: Option<bool>,
    /// New task title.
    pub name: Option<String>,
    /// New production line.
    pub line: Option<String>,
    /// New shift label.
    pub shift: Option<String>,
    /// New crew label.
    pub brigade: Option<String>,
    /// New nomenclature.
    pub nomenclature: Option<String>,
    /// New catalogue code.
    pub code: Option<String>,
    /// New work centre identifier.
    pub identifier: Option<String>,
    /// New shift start.
    #[serde(deserialize_with = "wire::optional_wall_clock")]
    pub started_at: Option<NaiveDateTime>,
    /// New shift end.
    #[serde(deserialize_with = "wire::optional_wall_clock")]
    pub completed_at: Option<NaiveDateTime>,
}

impl TaskPatch {
    /// Returns `true` when the patch changes no field.
    #[must_use]
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
    }

    /// Returns `true` when the patch closes the task.
    #[must_use]
    pub fn closes_task(&self) -> bool {
        self.close_status == Some(true)
    }
}
