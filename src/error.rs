use thiserror::Error;

use crate::types::SystemRole;

/// Errors raised by the emissions model, comparison and break-even search.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("no OPEX entry for country={country}, utilization={utilization}, role={role}")]
    Lookup {
        country: String,
        utilization: f64,
        role: SystemRole,
    },
    #[error("no grid carbon intensity for country: {0}")]
    UnknownCountry(String),
    #[error("domain error: {0}")]
    Domain(String),
    #[error("break-even solver failed: {0}")]
    Solver(String),
    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
