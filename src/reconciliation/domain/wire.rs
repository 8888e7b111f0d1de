//! Serde helpers for timestamps arriving from upstream systems.
//!
//! Upstream exports carry an explicit UTC offset. Stored timestamps are naive:
//! the offset is dropped and the wall-clock time is kept as written.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, de::Error as _};

/// Parses a timestamp, keeping its local wall-clock time.
///
/// Accepts RFC 3339 values with an offset as well as naive ISO 8601 values.
pub(crate) fn parse_wall_clock(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok())
}

/// Deserializes a required timestamp with the offset stripped.
pub(crate) fn wall_clock<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_wall_clock(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Deserializes an optional timestamp with the offset stripped.
pub(crate) fn optional_wall_clock<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| {
        parse_wall_clock(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {value}")))
    })
    .transpose()
}
