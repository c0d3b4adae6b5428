use async_trait::async_trait;

use crate::error::DomainError;
use crate::validation::{ValidationFailure, codes};

use super::{FieldValueValidator, failure};

/// Accepts `true` or `false`, in any case.
pub struct BooleanValidator;

#[async_trait]
impl FieldValueValidator for BooleanValidator {
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError> {
        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return Ok(Vec::new());
        }
        Ok(vec![failure(
            codes::BOOLEAN,
            "The value is not a valid boolean.",
            value,
            property_name,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepts_booleans_in_any_case() {
        for value in ["true", "FALSE", "True"] {
            assert!(BooleanValidator.validate(value, "IsFeatured").await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn rejects_other_values() {
        let failures = BooleanValidator.validate("yes", "IsFeatured").await.unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error_code, codes::BOOLEAN);
        assert_eq!(failures[0].property_name, "IsFeatured");
    }
}
