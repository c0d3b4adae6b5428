//! Field value validators, one per data type.
//!
//! Field values are stored as strings. A validator checks one raw value
//! against the properties of its field type and reports every failure it
//! finds; an empty list means the value is valid.

mod boolean;
mod date_time;
mod number;
mod related_content;
mod rich_text;
mod select;
mod string;
mod tags;

pub use boolean::BooleanValidator;
pub use date_time::DateTimeValidator;
pub use number::NumberValidator;
pub use related_content::RelatedContentValidator;
pub use rich_text::RichTextValidator;
pub use select::SelectValidator;
pub use string::StringValidator;
pub use tags::TagsValidator;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainError;
use crate::field_type::{FieldType, FieldTypeProperties};
use crate::queriers::ContentQuerier;
use crate::validation::ValidationFailure;

/// Validates raw field values of one field type.
#[async_trait]
pub trait FieldValueValidator: Send + Sync {
    /// Validates a value. `property_name` is reported on every failure.
    ///
    /// An `Err` means the check itself could not run, not that the value is
    /// invalid.
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError>;
}

/// Creates the validator matching the properties of a field type.
#[derive(Clone)]
pub struct FieldValueValidatorFactory {
    contents: Arc<dyn ContentQuerier>,
}

impl FieldValueValidatorFactory {
    pub fn new(contents: Arc<dyn ContentQuerier>) -> Self {
        Self { contents }
    }

    pub fn create(
        &self,
        field_type: &FieldType,
    ) -> Result<Box<dyn FieldValueValidator>, DomainError> {
        let validator: Box<dyn FieldValueValidator> = match field_type.properties()? {
            FieldTypeProperties::Boolean(_) => Box::new(BooleanValidator),
            FieldTypeProperties::DateTime(properties) => {
                Box::new(DateTimeValidator::new(properties.clone()))
            }
            FieldTypeProperties::Number(properties) => {
                Box::new(NumberValidator::new(properties.clone()))
            }
            FieldTypeProperties::RelatedContent(properties) => Box::new(
                RelatedContentValidator::new(properties.clone(), self.contents.clone()),
            ),
            FieldTypeProperties::RichText(properties) => {
                Box::new(RichTextValidator::new(properties.clone()))
            }
            FieldTypeProperties::Select(properties) => {
                Box::new(SelectValidator::new(properties.clone()))
            }
            FieldTypeProperties::String(properties) => Box::new(
                StringValidator::new(properties.clone()).map_err(|e| {
                    DomainError::InvalidState(format!(
                        "field type {} has an unusable pattern: {e}",
                        field_type.unique_name().map(|name| name.as_str()).unwrap_or("?")
                    ))
                })?,
            ),
            FieldTypeProperties::Tags(_) => Box::new(TagsValidator),
        };
        Ok(validator)
    }
}

/// Builds a failure carrying the attempted value.
fn failure(
    code: &str,
    message: impl Into<String>,
    value: &str,
    property_name: &str,
) -> ValidationFailure {
    ValidationFailure::new(code, message, property_name).with_value(value)
}

/// Parses a JSON array of strings.
fn parse_string_array(value: &str) -> Option<Vec<String>> {
    serde_json::from_str(value).ok()
}

/// Checks the character count of a text value.
fn check_length(
    value: &str,
    property_name: &str,
    min_length: Option<usize>,
    max_length: Option<usize>,
    failures: &mut Vec<ValidationFailure>,
) {
    use crate::validation::codes;

    let length = value.chars().count();
    if let Some(min_length) = min_length
        && length < min_length
    {
        failures.push(
            failure(
                codes::MINIMUM_LENGTH,
                format!("The value must be at least {min_length} characters long."),
                value,
                property_name,
            )
            .with_custom_state(serde_json::json!({ "minimumLength": min_length })),
        );
    }
    if let Some(max_length) = max_length
        && length > max_length
    {
        failures.push(
            failure(
                codes::MAXIMUM_LENGTH,
                format!("The value must be at most {max_length} characters long."),
                value,
                property_name,
            )
            .with_custom_state(serde_json::json!({ "maximumLength": max_length })),
        );
    }
}
