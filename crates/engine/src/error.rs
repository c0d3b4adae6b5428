//! Engine error types.

use domain::DomainError;
use event_store::EventStoreError;
use projections::ProjectionError;
use thiserror::Error;

/// Errors surfaced by the engine host.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging or metrics could not be installed.
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// A manager rejected the operation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A read model failed to process the log.
    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    /// Returns the domain error, if the operation was rejected by a manager.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(error) => Some(error),
            _ => None,
        }
    }
}
