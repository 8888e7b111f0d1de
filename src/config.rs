//! Environment-driven configuration.
//!
//! | Variable                 | Meaning                                   | Default   |
//! |--------------------------|-------------------------------------------|-----------|
//! | `DATABASE_URL`           | `PostgreSQL` connection URL               | required  |
//! | `DATABASE_POOL_SIZE`     | Maximum pooled connections                | `10`      |
//! | `TASKS_PAGE_LIMIT`       | Page size when a caller supplies none     | `30`      |
//! | `PRODUCT_BINDING_POLICY` | `pending` or `aggregate_on_register`      | `pending` |

use crate::reconciliation::{
    adapters::postgres::ReconciliationPgPool,
    domain::{BindingPolicy, ParseBindingPolicyError},
    query::{DEFAULT_PAGE_LIMIT, Page},
};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;

/// Default maximum number of pooled database connections.
pub const DEFAULT_POOL_SIZE: NonZeroU32 = NonZeroU32::MIN.saturating_add(9);

/// Errors raised while loading configuration or building resources from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A variable could not be parsed.
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The binding policy name is unknown.
    #[error(transparent)]
    BindingPolicy(#[from] ParseBindingPolicyError),

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum pooled connections; r2d2 rejects an empty pool.
    pub pool_size: NonZeroU32,
}

impl DatabaseConfig {
    /// Builds an r2d2 connection pool for the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] when the pool cannot be created.
    pub fn build_pool(&self) -> Result<ReconciliationPgPool, ConfigError> {
        let manager = ConnectionManager::<PgConnection>::new(self.url.as_str());
        Ok(Pool::builder().max_size(self.pool_size.get()).build(manager)?)
    }
}

/// Service behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Page size used when a caller supplies none.
    pub page_limit: u32,
    /// Initial state of bindings created by product registration.
    pub binding_policy: BindingPolicy,
}

impl ServiceConfig {
    /// Builds a page from optional caller-supplied values.
    #[must_use]
    pub fn page(&self, offset: Option<u32>, limit: Option<u32>) -> Page {
        Page::new(offset.unwrap_or(0), limit.unwrap_or(self.page_limit))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            binding_policy: BindingPolicy::default(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Service settings.
    pub service: ServiceConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let pool_size = parse_or(&lookup, "DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        let page_limit = parse_or(&lookup, "TASKS_PAGE_LIMIT", DEFAULT_PAGE_LIMIT)?;
        let binding_policy = lookup("PRODUCT_BINDING_POLICY")
            .map(|value| BindingPolicy::try_from(value.as_str()))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            database: DatabaseConfig { url, pool_size },
            service: ServiceConfig {
                page_limit,
                binding_policy,
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        name,
        reason: err.to_string(),
        value,
    })
}
