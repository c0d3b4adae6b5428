use async_trait::async_trait;

use crate::error::DomainError;
use crate::validation::{ValidationFailure, codes};

use super::{FieldValueValidator, failure, parse_string_array};

/// Accepts a JSON array of strings.
pub struct TagsValidator;

#[async_trait]
impl FieldValueValidator for TagsValidator {
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError> {
        if parse_string_array(value).is_some() {
            return Ok(Vec::new());
        }
        Ok(vec![failure(
            codes::JSON,
            "The value is not a JSON array of strings.",
            value,
            property_name,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_string_arrays() {
        assert!(TagsValidator.validate(r#"["rust", "cms"]"#, "Keywords").await.unwrap().is_empty());
        assert!(TagsValidator.validate("[]", "Keywords").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_anything_else() {
        for value in ["rust", "[1, 2]", r#"{"a": "b"}"#] {
            let failures = TagsValidator.validate(value, "Keywords").await.unwrap();
            assert_eq!(failures.len(), 1, "{value}");
            assert_eq!(failures[0].error_code, codes::JSON);
        }
    }
}
