//! Domain error types.

use std::collections::BTreeMap;

use common::{AggregateId, RealmId};
use event_store::EventStoreError;
use thiserror::Error;

use crate::validation::ValidationError;
use crate::value_objects::{ContentId, ContentTypeId, FieldId, LanguageId, UniqueName};

/// A uniqueness rule was broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    /// A content type or field type with the same name already exists in the realm.
    #[error("The unique name '{unique_name}' is already used by {aggregate_type} {conflicting_id}")]
    UniqueNameAlreadyUsed {
        aggregate_type: &'static str,
        realm_id: Option<RealmId>,
        unique_name: UniqueName,
        conflicting_id: AggregateId,
    },

    /// Another content of the same type uses the locale's unique name.
    #[error("The content unique name '{unique_name}' is already used by content {conflicting_id}")]
    ContentUniqueNameAlreadyUsed {
        content_id: ContentId,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        unique_name: UniqueName,
        conflicting_id: ContentId,
    },

    /// Values of unique fields are already used by other contents.
    #[error("{} unique field value(s) of content {content_id} are already used", .conflicts.len())]
    ContentFieldValueConflict {
        content_id: ContentId,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        conflicts: BTreeMap<FieldId, ContentId>,
    },

    /// Two field definitions of a content type share a unique name.
    #[error("The field unique name '{unique_name}' is already used by field {conflicting_field_id}")]
    FieldDefinitionUniqueNameAlreadyUsed {
        content_type_id: ContentTypeId,
        unique_name: UniqueName,
        field_id: FieldId,
        conflicting_field_id: FieldId,
    },
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate required by the operation does not exist.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    NotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// A uniqueness rule was broken.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// One or more validation failures.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An aggregate was used before it was initialized, or after deletion.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The content was saved with a content type it does not belong to.
    #[error("Content {content_id} belongs to content type {expected}, not {actual}")]
    ContentTypeMismatch {
        content_id: ContentId,
        expected: ContentTypeId,
        actual: ContentTypeId,
    },

    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn not_found(aggregate_type: &'static str, aggregate_id: impl ToString) -> Self {
        Self::NotFound {
            aggregate_type,
            aggregate_id: aggregate_id.to_string(),
        }
    }

    /// Returns the validation failures if this is a validation error.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the conflict if this is a conflict error.
    pub fn as_conflict(&self) -> Option<&ConflictError> {
        match self {
            Self::Conflict(error) => Some(error),
            _ => None,
        }
    }
}
