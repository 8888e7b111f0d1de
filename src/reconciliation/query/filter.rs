//! Task filter criteria and pagination window.

use crate::reconciliation::domain::{ConsignmentKey, ShiftTask};
use chrono::{Days, NaiveDate, NaiveDateTime};

/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: u32 = 30;

/// Optional, independently combinable task filters (logical AND).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    close_status: Option<bool>,
    consignment_number: Option<i32>,
    consignment_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl TaskQuery {
    /// Creates a query that matches every task.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            close_status: None,
            consignment_number: None,
            consignment_date: None,
            start_date: None,
            end_date: None,
        }
    }

    /// Matches tasks with exactly this close flag.
    #[must_use]
    pub const fn with_close_status(mut self, close_status: bool) -> Self {
        self.close_status = Some(close_status);
        self
    }

    /// Matches tasks whose consignment has this batch number.
    #[must_use]
    pub const fn with_consignment_number(mut self, number: i32) -> Self {
        self.consignment_number = Some(number);
        self
    }

    /// Matches tasks whose consignment has this batch date.
    #[must_use]
    pub const fn with_consignment_date(mut self, date: NaiveDate) -> Self {
        self.consignment_date = Some(date);
        self
    }

    /// Matches tasks that started on or after `date`.
    #[must_use]
    pub const fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Matches tasks that completed on or before `date`.
    #[must_use]
    pub const fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Returns the close flag filter.
    #[must_use]
    pub const fn close_status(&self) -> Option<bool> {
        self.close_status
    }

    /// Returns the batch number filter.
    #[must_use]
    pub const fn consignment_number(&self) -> Option<i32> {
        self.consignment_number
    }

    /// Returns the batch date filter.
    #[must_use]
    pub const fn consignment_date(&self) -> Option<NaiveDate> {
        self.consignment_date
    }

    /// Returns the inclusive lower bound on `started_at`.
    ///
    /// `date(started_at) >= start_date` holds exactly when
    /// `started_at >= start_date 00:00`.
    #[must_use]
    pub fn started_from(&self) -> Option<NaiveDateTime> {
        self.start_date.map(|date| date.and_time(chrono::NaiveTime::MIN))
    }

    /// Returns the exclusive upper bound on `completed_at`.
    ///
    /// `date(completed_at) <= end_date` holds exactly when
    /// `completed_at < (end_date + 1 day) 00:00`. `None` when no end date is
    /// set or the next day is not representable, in which case every
    /// completion time qualifies.
    #[must_use]
    pub fn completed_before(&self) -> Option<NaiveDateTime> {
        self.end_date
            .and_then(|date| date.checked_add_days(Days::new(1)))
            .map(|date| date.and_time(chrono::NaiveTime::MIN))
    }

    /// Evaluates the filters against a task and its consignment key.
    #[must_use]
    pub fn matches(&self, task: &ShiftTask, key: ConsignmentKey) -> bool {
        let close_ok = self
            .close_status
            .is_none_or(|expected| task.close_status == expected);
        let number_ok = self
            .consignment_number
            .is_none_or(|expected| key.number() == expected);
        let date_ok = self
            .consignment_date
            .is_none_or(|expected| key.date() == expected);
        let start_ok = self
            .start_date
            .is_none_or(|start| task.started_at.date() >= start);
        let end_ok = self
            .end_date
            .is_none_or(|end| task.completed_at.date() <= end);
        close_ok && number_ok && date_ok && start_ok && end_ok
    }
}

/// Offset/limit pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    offset: u32,
    limit: u32,
}

impl Page {
    /// Creates a pagination window.
    #[must_use]
    pub const fn new(offset: u32, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// Returns the number of rows skipped.
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset
    }

    /// Returns the maximum number of rows returned.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Applies the window to an already ordered sequence.
    pub fn apply<T>(self, items: impl IntoIterator<Item = T>) -> impl Iterator<Item = T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_LIMIT)
    }
}
