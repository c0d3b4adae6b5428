use async_trait::async_trait;

use crate::error::DomainError;
use crate::field_type::SelectProperties;
use crate::validation::{ValidationFailure, codes};

use super::{FieldValueValidator, failure, parse_string_array};

/// Checks that selected values are options of the field type.
///
/// A multiple select stores a JSON array of option values; a single select
/// stores the raw option value, or a one-element array.
pub struct SelectValidator {
    properties: SelectProperties,
}

impl SelectValidator {
    pub fn new(properties: SelectProperties) -> Self {
        Self { properties }
    }

    fn selected(&self, value: &str) -> Option<Vec<String>> {
        if self.properties.is_multiple || value.starts_with('[') {
            parse_string_array(value)
        } else {
            Some(vec![value.to_string()])
        }
    }
}

#[async_trait]
impl FieldValueValidator for SelectValidator {
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError> {
        let Some(selected) = self.selected(value) else {
            return Ok(vec![failure(
                codes::JSON,
                "The value is not a JSON array of strings.",
                value,
                property_name,
            )]);
        };

        let mut failures = Vec::new();
        if !self.properties.is_multiple && selected.len() > 1 {
            failures.push(failure(
                codes::MULTIPLE_VALUES,
                "Only one option may be selected.",
                value,
                property_name,
            ));
        }
        for option in selected
            .iter()
            .filter(|option| !self.properties.has_option(option))
        {
            failures.push(failure(
                codes::OPTION,
                format!("'{option}' is not an option of this field."),
                option,
                property_name,
            ));
        }
        Ok(failures)
    }
}
