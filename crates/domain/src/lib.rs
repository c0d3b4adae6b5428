//! Domain layer of the headless content engine.
//!
//! This crate provides:
//! - Field types, content types and contents as event-sourced aggregates
//! - Field value validators, one per data type
//! - Managers that validate and persist aggregates with their unique claims
//! - Repository and querier ports the managers depend on

pub mod aggregate;
pub mod content;
pub mod content_type;
pub mod error;
pub mod field_type;
pub mod fields;
pub mod queriers;
pub mod repository;
pub mod uniqueness;
pub mod validation;
pub mod value_objects;

#[cfg(test)]
mod testing;

pub use aggregate::{Aggregate, DomainEvent, load_from_history};
pub use content::{Content, ContentEvent, ContentLocale, ContentManager, PublishStatus};
pub use content_type::{ContentType, ContentTypeEvent, ContentTypeManager, FieldDefinition};
pub use error::{ConflictError, DomainError};
pub use field_type::{DataType, FieldType, FieldTypeEvent, FieldTypeManager, FieldTypeProperties};
pub use fields::{FieldValueValidator, FieldValueValidatorFactory};
pub use queriers::{ContentQuerier, ContentTypeQuerier, FieldTypeQuerier};
pub use repository::{
    ContentRepository, ContentTypeRepository, EventSourcedRepository, FieldTypeRepository,
};
pub use validation::{ValidationError, ValidationFailure};
pub use value_objects::{
    ContentId, ContentTypeId, Description, DisplayName, FieldId, FieldTypeId, LanguageId,
    Placeholder, UniqueName,
};
