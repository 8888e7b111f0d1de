//! Consignment (production batch) types.

use super::ConsignmentId;
use chrono::NaiveDate;
use std::fmt;

/// Natural key of a consignment: the batch number and the batch date.
///
/// The pair is unique across all consignments and lookups match it exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsignmentKey {
    number: i32,
    date: NaiveDate,
}

impl ConsignmentKey {
    /// Creates a natural key from its parts.
    #[must_use]
    pub const fn new(number: i32, date: NaiveDate) -> Self {
        Self { number, date }
    }

    /// Returns the batch number.
    #[must_use]
    pub const fn number(self) -> i32 {
        self.number
    }

    /// Returns the batch date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for ConsignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.number, self.date)
    }
}

/// A persisted consignment. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consignment {
    id: ConsignmentId,
    key: ConsignmentKey,
}

impl Consignment {
    /// Reconstructs a consignment from persisted storage.
    #[must_use]
    pub const fn from_persisted(id: ConsignmentId, key: ConsignmentKey) -> Self {
        Self { id, key }
    }

    /// Returns the consignment identifier.
    #[must_use]
    pub const fn id(&self) -> ConsignmentId {
        self.id
    }

    /// Returns the natural key.
    #[must_use]
    pub const fn key(&self) -> ConsignmentKey {
        self.key
    }
}
