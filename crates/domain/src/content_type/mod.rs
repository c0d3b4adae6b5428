//! Content type aggregate and related types.

mod aggregate;
mod events;
mod field_definition;
mod manager;

pub use aggregate::ContentType;
pub use events::{
    ContentTypeCreatedData, ContentTypeDeletedData, ContentTypeDescriptionChangedData,
    ContentTypeDisplayNameChangedData, ContentTypeEvent, ContentTypeInvariantChangedData,
    ContentTypeUniqueNameChangedData, FieldDefinitionChangedData, FieldDefinitionRemovedData,
};
pub use field_definition::FieldDefinition;
pub use manager::ContentTypeManager;

use thiserror::Error;

use crate::error::{ConflictError, DomainError};
use crate::validation::{ValidationError, ValidationFailure, codes};
use crate::value_objects::{ContentTypeId, FieldId, UniqueName};

/// Errors that can occur during content type operations.
#[derive(Debug, Error)]
pub enum ContentTypeError {
    /// The content type has not been created yet.
    #[error("Content type has not been created")]
    NotCreated,

    /// The content type has been deleted.
    #[error("Content type has been deleted")]
    Deleted,

    /// A variant field was set on an invariant content type.
    #[error("The invariant content type cannot hold the variant field {field_id}")]
    VariantFieldOnInvariantType { field_id: FieldId },

    /// The content type cannot become invariant while it has variant fields.
    #[error("The content type cannot become invariant: {} variant field(s)", .field_ids.len())]
    HasVariantFields { field_ids: Vec<FieldId> },

    /// Another field definition already uses the unique name.
    #[error("The field unique name '{unique_name}' is already used by field {conflicting_field_id}")]
    FieldNameConflict {
        content_type_id: ContentTypeId,
        unique_name: UniqueName,
        field_id: FieldId,
        conflicting_field_id: FieldId,
    },
}

fn invariant_failure(field_id: FieldId) -> ValidationFailure {
    ValidationFailure::new(
        codes::INVARIANT,
        "An invariant content type can only hold invariant fields.",
        "IsInvariant",
    )
    .with_field_id(field_id)
}

impl From<ContentTypeError> for DomainError {
    fn from(e: ContentTypeError) -> Self {
        match e {
            ContentTypeError::VariantFieldOnInvariantType { field_id } => {
                DomainError::Validation(ValidationError::single(invariant_failure(field_id)))
            }
            ContentTypeError::HasVariantFields { field_ids } => DomainError::Validation(
                ValidationError::new(field_ids.into_iter().map(invariant_failure).collect()),
            ),
            ContentTypeError::FieldNameConflict {
                content_type_id,
                unique_name,
                field_id,
                conflicting_field_id,
            } => DomainError::Conflict(ConflictError::FieldDefinitionUniqueNameAlreadyUsed {
                content_type_id,
                unique_name,
                field_id,
                conflicting_field_id,
            }),
            e @ (ContentTypeError::NotCreated | ContentTypeError::Deleted) => {
                DomainError::InvalidState(e.to_string())
            }
        }
    }
}
