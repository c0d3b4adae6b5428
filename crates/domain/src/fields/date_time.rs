use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::DomainError;
use crate::field_type::DateTimeProperties;
use crate::validation::{ValidationFailure, codes};

use super::{FieldValueValidator, failure};

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Checks that a value is a date and time within bounds.
pub struct DateTimeValidator {
    properties: DateTimeProperties,
}

impl DateTimeValidator {
    pub fn new(properties: DateTimeProperties) -> Self {
        Self { properties }
    }
}

/// Parses RFC 3339, or a date and time without offset read as UTC.
pub(crate) fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|date_time| date_time.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(value, NAIVE_FORMAT).map(|naive| naive.and_utc()))
        .ok()
}

#[async_trait]
impl FieldValueValidator for DateTimeValidator {
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError> {
        let Some(date_time) = parse_date_time(value) else {
            return Ok(vec![failure(
                codes::DATE_TIME,
                "The value is not a valid date and time.",
                value,
                property_name,
            )]);
        };

        let mut failures = Vec::new();
        if let Some(min) = self.properties.min_value
            && date_time < min
        {
            failures.push(
                failure(
                    codes::GREATER_THAN_OR_EQUAL,
                    format!("The value must be on or after {}.", min.to_rfc3339()),
                    value,
                    property_name,
                )
                .with_custom_state(serde_json::json!({ "minimumValue": min })),
            );
        }
        if let Some(max) = self.properties.max_value
            && date_time > max
        {
            failures.push(
                failure(
                    codes::LESS_THAN_OR_EQUAL,
                    format!("The value must be on or before {}.", max.to_rfc3339()),
                    value,
                    property_name,
                )
                .with_custom_state(serde_json::json!({ "maximumValue": max })),
            );
        }
        Ok(failures)
    }
}
