use async_trait::async_trait;

use crate::error::DomainError;
use crate::field_type::RichTextProperties;
use crate::validation::ValidationFailure;

use super::{FieldValueValidator, check_length};

/// Checks the length of rich text. The markup itself is not inspected.
pub struct RichTextValidator {
    properties: RichTextProperties,
}

impl RichTextValidator {
    pub fn new(properties: RichTextProperties) -> Self {
        Self { properties }
    }
}

#[async_trait]
impl FieldValueValidator for RichTextValidator {
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
        Ok(failures)
    }
}
