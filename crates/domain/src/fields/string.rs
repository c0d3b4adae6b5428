use async_trait::async_trait;
use regex::Regex;

use crate::error::DomainError;
use crate::field_type::StringProperties;
use crate::validation::{ValidationFailure, codes};

use super::{FieldValueValidator, check_length, failure};

/// Checks the length of a string and, when set, that it matches a pattern.
///
/// The pattern is not anchored: it must match somewhere in the value.
pub struct StringValidator {
    properties: StringProperties,
    pattern: Option<Regex>,
}

impl StringValidator {
    /// Fails when the pattern does not compile.
    pub fn new(properties: StringProperties) -> Result<Self, regex::Error> {
        let pattern = properties.pattern.as_deref().map(Regex::new).transpose()?;
        Ok(Self {
            properties,
            pattern,
        })
    }
}

#[async_trait]
impl FieldValueValidator for StringValidator {
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError> {
        let mut failures = Vec::new();
        check_length(
            value,
            property_name,
            self.properties.min_length,
            self.properties.max_length,
            &mut failures,
        );

        if let Some(pattern) = &self.pattern
            && !pattern.is_match(value)
        {
            failures.push(
                failure(
                    codes::REGULAR_EXPRESSION,
                    format!("The value must match the pattern '{}'.", pattern.as_str()),
                    value,
                    property_name,
                )
                .with_custom_state(serde_json::json!({ "pattern": pattern.as_str() })),
            );
        }
        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug_validator() -> StringValidator {
        StringValidator::new(StringProperties {
            min_length: Some(3),
            max_length: Some(8),
            pattern: Some("^[a-z-]+$".to_string()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn valid_value_has_no_failures() {
        assert!(slug_validator().validate("my-post", "Slug").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn every_rule_is_reported() {
        let failures = slug_validator().validate("My_Long_Post", "Slug").await.unwrap();
        let reported: Vec<_> = failures.iter().map(|f| f.error_code.as_str()).collect();
        assert_eq!(reported, vec![codes::MAXIMUM_LENGTH, codes::REGULAR_EXPRESSION]);
    }

    #[tokio::test]
    async fn unanchored_pattern_matches_anywhere() {
        let validator = StringValidator::new(StringProperties {
            pattern: Some("[0-9]".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(validator.validate("post-1", "Slug").await.unwrap().is_empty());
        assert_eq!(validator.validate("post", "Slug").await.unwrap().len(), 1);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let result = StringValidator::new(StringProperties {
            pattern: Some("(".to_string()),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
