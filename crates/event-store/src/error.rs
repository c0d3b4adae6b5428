use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected version did not match the actual version.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// A unique claim is already owned by another aggregate.
    #[error("Unique claim {scope}/{key}='{value}' is already owned by {owner}")]
    UniqueConstraintViolation {
        scope: String,
        key: String,
        value: String,
        owner: AggregateId,
    },

    /// The batch of events handed to `append` is malformed.
    #[error("Invalid append: {0}")]
    InvalidAppend(String),

    /// An event envelope was built without a required field.
    #[error("Event envelope is missing '{0}'")]
    IncompleteEnvelope(&'static str),

    /// A stored stream key could not be decoded.
    #[error("Invalid stream key: {0}")]
    InvalidStreamKey(#[from] common::AggregateIdError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
