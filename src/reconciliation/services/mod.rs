//! Application services for consignment reconciliation.

mod error;
mod query;
mod reconciliation;

pub use error::{ErrorKind, ReconciliationError, ReconciliationResult};
pub use query::TaskQueryService;
pub use reconciliation::{ReconciliationService, RegistrationReport};
