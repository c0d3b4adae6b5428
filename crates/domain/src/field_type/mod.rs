//! Field type aggregate and related types.

mod aggregate;
mod events;
mod manager;
mod properties;

pub use aggregate::FieldType;
pub use events::{
    FieldTypeCreatedData, FieldTypeDeletedData, FieldTypeDescriptionChangedData,
    FieldTypeDisplayNameChangedData, FieldTypeEvent, FieldTypePropertiesChangedData,
    FieldTypeUniqueNameChangedData,
};
pub use manager::FieldTypeManager;
pub use properties::{
    BooleanProperties, DataType, DateTimeProperties, FieldTypeProperties, NumberProperties,
    RelatedContentProperties, RichTextProperties, SelectOption, SelectProperties,
    StringProperties, TagsProperties,
};

use thiserror::Error;

use crate::error::DomainError;
use crate::validation::{ValidationError, ValidationFailure, codes};

/// Errors that can occur during field type operations.
#[derive(Debug, Error)]
pub enum FieldTypeError {
    /// The field type has not been created yet.
    #[error("Field type has not been created")]
    NotCreated,

    /// The field type has been deleted.
    #[error("Field type has been deleted")]
    Deleted,

    /// New properties describe a different data type.
    #[error("The properties do not match the data type: expected {expected}, got {actual}")]
    PropertiesMismatch { expected: DataType, actual: DataType },

    /// The properties are not self-consistent.
    #[error(transparent)]
    InvalidProperties(#[from] ValidationError),
}

impl From<FieldTypeError> for DomainError {
    fn from(e: FieldTypeError) -> Self {
        match e {
            FieldTypeError::PropertiesMismatch { expected, actual } => {
                DomainError::Validation(ValidationError::single(
                    ValidationFailure::new(
                        codes::DATA_TYPE,
                        format!("The properties do not match the data type '{expected}'."),
                        "Properties",
                    )
                    .with_value(actual.as_str()),
                ))
            }
            FieldTypeError::InvalidProperties(error) => DomainError::Validation(error),
            e @ (FieldTypeError::NotCreated | FieldTypeError::Deleted) => {
                DomainError::InvalidState(e.to_string())
            }
        }
    }
}
