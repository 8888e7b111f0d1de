//! Products, their consignment bindings, and the aggregation state machine.

use super::{ConsignmentKey, DomainError, ParseBindingPolicyError, ProductCode};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Pre-registration of a product against a consignment natural key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductInput {
    /// Unique product code.
    #[serde(rename = "УникальныйКодПродукта", alias = "product_id")]
    pub product_id: ProductCode,
    /// Batch number of the target consignment.
    #[serde(rename = "НомерПартии", alias = "consignment_number")]
    pub consignment_number: i32,
    /// Batch date of the target consignment.
    #[serde(rename = "ДатаПартии", alias = "consignment_date")]
    pub consignment_date: NaiveDate,
}

impl ProductInput {
    /// Creates a registration entry.
    #[must_use]
    pub const fn new(product_id: ProductCode, key: ConsignmentKey) -> Self {
        Self {
            product_id,
            consignment_number: key.number(),
            consignment_date: key.date(),
        }
    }

    /// Returns the natural key of the target consignment.
    #[must_use]
    pub const fn consignment_key(&self) -> ConsignmentKey {
        ConsignmentKey::new(self.consignment_number, self.consignment_date)
    }
}

/// Aggregation state of a product-to-consignment binding.
///
/// The only transition is `Pending` to `Aggregated`; it is never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationState {
    /// Product is bound but not yet confirmed.
    Pending,
    /// Product was confirmed as belonging to the consignment.
    Aggregated {
        /// When the aggregation happened.
        at: NaiveDateTime,
    },
}

impl AggregationState {
    /// Rebuilds the state from its two persisted columns.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InconsistentAggregation`] when the flag and the
    /// timestamp disagree.
    pub const fn from_columns(
        is_aggregated: bool,
        aggregated_at: Option<NaiveDateTime>,
    ) -> Result<Self, DomainError> {
        match (is_aggregated, aggregated_at) {
            (false, None) => Ok(Self::Pending),
            (true, Some(at)) => Ok(Self::Aggregated { at }),
            (flag, timestamp) => Err(DomainError::InconsistentAggregation {
                is_aggregated: flag,
                has_timestamp: timestamp.is_some(),
            }),
        }
    }

    /// Returns the persisted flag column.
    #[must_use]
    pub const fn is_aggregated(self) -> bool {
        matches!(self, Self::Aggregated { .. })
    }

    /// Returns the persisted timestamp column.
    #[must_use]
    pub const fn aggregated_at(self) -> Option<NaiveDateTime> {
        match self {
            Self::Pending => None,
            Self::Aggregated { at } => Some(at),
        }
    }
}

/// Initial state given to bindings created by product registration.
///
/// The upstream system marked bindings as aggregated the moment they were
/// registered, which leaves nothing for the aggregation step to do: every
/// first aggregation then fails as "already aggregated". `Pending` keeps the
/// binding open until a product is physically confirmed and is the default.
/// `AggregateOnRegister` keeps the upstream behaviour for deployments that
/// depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BindingPolicy {
    /// Registration leaves the binding pending.
    #[default]
    Pending,
    /// Registration marks the binding aggregated immediately.
    AggregateOnRegister,
}

impl BindingPolicy {
    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AggregateOnRegister => "aggregate_on_register",
        }
    }

    /// Returns the state a newly registered binding starts in.
    #[must_use]
    pub const fn initial_state(self, now: NaiveDateTime) -> AggregationState {
        match self {
            Self::Pending => AggregationState::Pending,
            Self::AggregateOnRegister => AggregationState::Aggregated { at: now },
        }
    }
}

impl TryFrom<&str> for BindingPolicy {
    type Error = ParseBindingPolicyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "aggregate_on_register" => Ok(Self::AggregateOnRegister),
            _ => Err(ParseBindingPolicyError(value.to_owned())),
        }
    }
}
