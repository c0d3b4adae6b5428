use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DomainError;
use crate::field_type::RelatedContentProperties;
use crate::queriers::ContentQuerier;
use crate::validation::{ValidationFailure, codes};
use crate::value_objects::ContentId;

use super::{FieldValueValidator, failure, parse_string_array};

/// Checks that related content ids exist and belong to the target content type.
///
/// The value is a JSON array of content ids, or a single raw id.
pub struct RelatedContentValidator {
    properties: RelatedContentProperties,
    contents: Arc<dyn ContentQuerier>,
}

impl RelatedContentValidator {
    pub fn new(properties: RelatedContentProperties, contents: Arc<dyn ContentQuerier>) -> Self {
        Self {
            properties,
            contents,
        }
    }
}

#[async_trait]
impl FieldValueValidator for RelatedContentValidator {
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError> {
        let raw_ids = if value.starts_with('[') {
            match parse_string_array(value) {
                Some(ids) => ids,
                None => {
                    return Ok(vec![failure(
                        codes::CONTENT_ID,
                        "The value is not a JSON array of content ids.",
                        value,
                        property_name,
                    )]);
                }
            }
        } else {
            vec![value.to_string()]
        };

        let mut failures = Vec::new();
        if !self.properties.is_multiple && raw_ids.len() > 1 {
            failures.push(failure(
                codes::MULTIPLE_VALUES,
                "Only one content may be related.",
                value,
                property_name,
            ));
        }

        let mut ids = Vec::with_capacity(raw_ids.len());
        for raw_id in &raw_ids {
            match raw_id.parse::<ContentId>() {
                Ok(id) => ids.push(id),
                Err(_) => failures.push(failure(
                    codes::CONTENT_ID,
                    format!("'{raw_id}' is not a valid content id."),
                    raw_id,
                    property_name,
                )),
            }
        }
        if !failures.is_empty() || ids.is_empty() {
            return Ok(failures);
        }

        let content_types = self.contents.find_content_type_ids(&ids).await?;
        for id in ids {
            match content_types.get(&id) {
                None => failures.push(failure(
                    codes::RELATED_CONTENT_NOT_FOUND,
                    format!("The content '{id}' could not be found."),
                    &id.to_string(),
                    property_name,
                )),
                Some(content_type_id) if *content_type_id != self.properties.content_type_id => {
                    failures.push(
                        failure(
                            codes::RELATED_CONTENT_TYPE,
                            format!(
                                "The content '{id}' is not of the expected content type."
                            ),
                            &id.to_string(),
                            property_name,
                        )
                        .with_custom_state(serde_json::json!({
                            "expectedContentTypeId": self.properties.content_type_id,
                            "actualContentTypeId": content_type_id,
                        })),
                    );
                }
                Some(_) => {}
            }
        }
        Ok(failures)
    }
}
