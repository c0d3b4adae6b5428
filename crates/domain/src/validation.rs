//! Structured validation failures.
//!
//! Validation never stops at the first problem: callers receive every
//! failure with enough data (code, property, attempted value, field id) to
//! render a field-level message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::FieldId;

/// Error codes carried by [`ValidationFailure::error_code`].
pub mod codes {
    pub const BOOLEAN: &str = "BooleanValidator";
    pub const NUMBER: &str = "NumberValidator";
    pub const GREATER_THAN_OR_EQUAL: &str = "GreaterThanOrEqualValidator";
    pub const LESS_THAN_OR_EQUAL: &str = "LessThanOrEqualValidator";
    pub const STEP: &str = "StepValidator";
    pub const DATE_TIME: &str = "DateTimeValidator";
    pub const MINIMUM_LENGTH: &str = "MinimumLengthValidator";
    pub const MAXIMUM_LENGTH: &str = "MaximumLengthValidator";
    pub const REGULAR_EXPRESSION: &str = "RegularExpressionValidator";
    pub const JSON: &str = "JsonValidator";
    pub const OPTION: &str = "OptionValidator";
    pub const MULTIPLE_VALUES: &str = "MultipleValuesValidator";
    pub const CONTENT_ID: &str = "ContentIdValidator";
    pub const RELATED_CONTENT_NOT_FOUND: &str = "RelatedContentNotFoundValidator";
    pub const RELATED_CONTENT_TYPE: &str = "RelatedContentTypeValidator";
    pub const UNEXPECTED_FIELD: &str = "UnexpectedFieldValidator";
    pub const REQUIRED_FIELD: &str = "RequiredFieldValidator";
    pub const INVARIANT: &str = "InvariantValidator";
    pub const INVARIANT_CONTENT_TYPE: &str = "InvariantContentTypeValidator";
    pub const NOT_EMPTY: &str = "NotEmptyValidator";
    pub const ALLOWED_CHARACTERS: &str = "AllowedCharactersValidator";
    pub const DATA_TYPE: &str = "DataTypeValidator";
    pub const PROPERTIES: &str = "PropertiesValidator";
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub error_code: String,
    pub error_message: String,
    pub attempted_value: Option<String>,
    pub property_name: String,
    pub field_id: Option<FieldId>,
    pub custom_state: Option<serde_json::Value>,
}

impl ValidationFailure {
    pub fn new(
        error_code: impl Into<String>,
        error_message: impl Into<String>,
        property_name: impl Into<String>,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            error_message: error_message.into(),
            attempted_value: None,
            property_name: property_name.into(),
            field_id: None,
            custom_state: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.attempted_value = Some(value.into());
        self
    }

    pub fn with_field_id(mut self, field_id: FieldId) -> Self {
        self.field_id = Some(field_id);
        self
    }

    pub fn with_custom_state(mut self, state: serde_json::Value) -> Self {
        self.custom_state = Some(state);
        self
    }
}

/// One or more validation failures, reported together.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed: {}", summarize(.failures))]
pub struct ValidationError {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationError {
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }

    pub fn single(failure: ValidationFailure) -> Self {
        Self::new(vec![failure])
    }

    /// Returns the failures carrying the given error code.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ValidationFailure> {
        self.failures.iter().filter(move |f| f.error_code == code)
    }

    /// Returns true if any failure carries the given error code.
    pub fn has_code(&self, code: &str) -> bool {
        self.with_code(code).next().is_some()
    }
}

impl From<ValidationFailure> for ValidationError {
    fn from(failure: ValidationFailure) -> Self {
        Self::single(failure)
    }
}

fn summarize(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.property_name, f.error_code))
        .collect::<Vec<_>>()
        .join(", ")
}
