//! Data types and their constraint properties.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationFailure, codes};
use crate::value_objects::ContentTypeId;

/// The data type of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    DateTime,
    Number,
    RelatedContent,
    RichText,
    Select,
    String,
    Tags,
}

impl DataType {
    /// Returns the data type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Boolean => "Boolean",
            DataType::DateTime => "DateTime",
            DataType::Number => "Number",
            DataType::RelatedContent => "RelatedContent",
            DataType::RichText => "RichText",
            DataType::Select => "Select",
            DataType::String => "String",
            DataType::Tags => "Tags",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BooleanProperties {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateTimeProperties {
    pub min_value: Option<DateTime<Utc>>,
    pub max_value: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberProperties {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedContentProperties {
    /// Content type every related content must belong to.
    pub content_type_id: ContentTypeId,
    pub is_multiple: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextProperties {
    /// MIME type of the text, e.g. `text/html`.
    pub content_type: String,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// An option of a select field.
///
/// The stored value of an option is `value` when set, `text` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: Option<String>,
    pub label: Option<String>,
}

impl SelectOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
            label: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns the value stored in content for this option.
    pub fn key(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectProperties {
    pub is_multiple: bool,
    pub options: Vec<SelectOption>,
}

impl SelectProperties {
    /// Returns true if `value` is the key of one of the options.
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.key() == value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringProperties {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Regular expression the value must match anywhere.
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagsProperties {}

/// Constraint properties of a field type.
///
/// The variant determines the data type, so properties can never disagree
/// with the field type they belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", content = "settings")]
pub enum FieldTypeProperties {
    Boolean(BooleanProperties),
    DateTime(DateTimeProperties),
    Number(NumberProperties),
    RelatedContent(RelatedContentProperties),
    RichText(RichTextProperties),
    Select(SelectProperties),
    String(StringProperties),
    Tags(TagsProperties),
}

impl FieldTypeProperties {
    /// Returns the data type described by these properties.
    pub fn data_type(&self) -> DataType {
        match self {
            FieldTypeProperties::Boolean(_) => DataType::Boolean,
            FieldTypeProperties::DateTime(_) => DataType::DateTime,
            FieldTypeProperties::Number(_) => DataType::Number,
            FieldTypeProperties::RelatedContent(_) => DataType::RelatedContent,
            FieldTypeProperties::RichText(_) => DataType::RichText,
            FieldTypeProperties::Select(_) => DataType::Select,
            FieldTypeProperties::String(_) => DataType::String,
            FieldTypeProperties::Tags(_) => DataType::Tags,
        }
    }

    /// Checks that the properties are self-consistent.
    ///
    /// Every problem is reported, not only the first one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut failures = Vec::new();

        match self {
            FieldTypeProperties::Boolean(_) | FieldTypeProperties::Tags(_) => {}
            FieldTypeProperties::DateTime(p) => {
                if let (Some(min), Some(max)) = (p.min_value, p.max_value)
                    && min > max
                {
                    failures.push(property_failure(
                        "MaxValue",
                        "The maximum value must be greater than or equal to the minimum value.",
                    ));
                }
            }
            FieldTypeProperties::Number(p) => {
                for (name, value) in [
                    ("MinValue", p.min_value),
                    ("MaxValue", p.max_value),
                    ("Step", p.step),
                ] {
                    if let Some(value) = value
                        && !value.is_finite()
                    {
                        failures.push(property_failure(name, "The value must be a finite number."));
                    }
                }
                if let (Some(min), Some(max)) = (p.min_value, p.max_value)
                    && min > max
                {
                    failures.push(property_failure(
                        "MaxValue",
                        "The maximum value must be greater than or equal to the minimum value.",
                    ));
                }
                if let Some(step) = p.step
                    && step <= 0.0
                {
                    failures.push(property_failure("Step", "The step must be greater than 0."));
                }
            }
            FieldTypeProperties::RelatedContent(_) => {}
            FieldTypeProperties::RichText(p) => {
                if p.content_type.trim().is_empty() {
                    failures.push(property_failure(
                        "ContentType",
                        "The MIME type cannot be empty.",
                    ));
                }
                check_lengths(p.min_length, p.max_length, &mut failures);
            }
            FieldTypeProperties::Select(p) => {
                let mut seen = HashSet::new();
                for option in &p.options {
                    if option.text.trim().is_empty() || option.key().trim().is_empty() {
                        failures.push(property_failure(
                            "Options",
                            "An option cannot have an empty text or value.",
                        ));
                    } else if !seen.insert(option.key()) {
                        failures.push(
                            property_failure("Options", "Option values must be distinct.")
                                .with_value(option.key()),
                        );
                    }
                }
            }
            FieldTypeProperties::String(p) => {
                check_lengths(p.min_length, p.max_length, &mut failures);
                if let Some(pattern) = &p.pattern
                    && let Err(e) = regex::Regex::new(pattern)
                {
                    failures.push(
                        property_failure("Pattern", format!("The pattern is invalid: {e}"))
                            .with_value(pattern),
                    );
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(failures))
        }
    }
}

fn property_failure(property: &str, message: impl Into<String>) -> ValidationFailure {
    ValidationFailure::new(codes::PROPERTIES, message, format!("Properties.{property}"))
}

fn check_lengths(
    min_length: Option<usize>,
    max_length: Option<usize>,
    failures: &mut Vec<ValidationFailure>,
) {
    if min_length == Some(0) {
        failures.push(property_failure("MinimumLength", "The length must be at least 1."));
    }
    if max_length == Some(0) {
        failures.push(property_failure("MaximumLength", "The length must be at least 1."));
    }
    if let (Some(min), Some(max)) = (min_length, max_length)
        && min > max
    {
        failures.push(property_failure(
            "MaximumLength",
            "The maximum length must be greater than or equal to the minimum length.",
        ));
    }
}
