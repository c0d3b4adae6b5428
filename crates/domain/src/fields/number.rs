use async_trait::async_trait;

use crate::error::DomainError;
use crate::field_type::NumberProperties;
use crate::validation::{ValidationFailure, codes};

use super::{FieldValueValidator, failure};

/// Relative tolerance applied to step checks, to absorb binary rounding.
const STEP_TOLERANCE: f64 = 1e-9;

/// Checks that a value is a finite number within bounds and on the step grid.
///
/// The step grid starts at the minimum when one is set, at zero otherwise.
pub struct NumberValidator {
    properties: NumberProperties,
}

impl NumberValidator {
    pub fn new(properties: NumberProperties) -> Self {
        Self { properties }
    }

    fn is_on_step(&self, number: f64, step: f64) -> bool {
        let origin = self.properties.min_value.unwrap_or(0.0);
        let steps = (number - origin) / step;
        (steps - steps.round()).abs() <= STEP_TOLERANCE * steps.abs().max(1.0)
    }
}

#[async_trait]
impl FieldValueValidator for NumberValidator {
    async fn validate(
        &self,
        value: &str,
        property_name: &str,
    ) -> Result<Vec<ValidationFailure>, DomainError> {
        let number = match value.parse::<f64>() {
            Ok(number) if number.is_finite() => number,
            _ => {
                return Ok(vec![failure(
                    codes::NUMBER,
                    "The value is not a valid number.",
                    value,
                    property_name,
                )]);
            }
        };

        let mut failures = Vec::new();
        if let Some(min) = self.properties.min_value
            && number < min
        {
            failures.push(
                failure(
                    codes::GREATER_THAN_OR_EQUAL,
                    format!("The value must be greater than or equal to {min}."),
                    value,
                    property_name,
                )
                .with_custom_state(serde_json::json!({ "minimumValue": min })),
            );
        }
        if let Some(max) = self.properties.max_value
            && number > max
        {
            failures.push(
                failure(
                    codes::LESS_THAN_OR_EQUAL,
                    format!("The value must be less than or equal to {max}."),
                    value,
                    property_name,
                )
                .with_custom_state(serde_json::json!({ "maximumValue": max })),
            );
        }
        if let Some(step) = self.properties.step
            && step > 0.0
            && !self.is_on_step(number, step)
        {
            failures.push(
                failure(
                    codes::STEP,
                    format!("The value must be a multiple of {step}."),
                    value,
                    property_name,
                )
                .with_custom_state(serde_json::json!({ "step": step })),
            );
        }
        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating() -> NumberValidator {
        NumberValidator::new(NumberProperties {
            min_value: Some(1.0),
            max_value: Some(5.0),
            step: Some(0.5),
        })
    }

    async fn codes_of(validator: &NumberValidator, value: &str) -> Vec<String> {
        validator
            .validate(value, "Rating")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.error_code)
            .collect()
    }

    #[tokio::test]
    async fn accepts_values_on_the_grid() {
        let validator = rating();
        for value in ["1", "1.5", "3.0", "5"] {
            assert!(codes_of(&validator, value).await.is_empty(), "{value}");
        }
    }

    #[tokio::test]
    async fn rejects_non_numbers() {
        let validator = rating();
        for value in ["abc", "NaN", "inf"] {
            assert_eq!(codes_of(&validator, value).await, vec![codes::NUMBER], "{value}");
        }
    }

    #[tokio::test]
    async fn reports_bounds_and_step_together() {
        let validator = rating();
        assert_eq!(
            codes_of(&validator, "0.7").await,
            vec![codes::GREATER_THAN_OR_EQUAL, codes::STEP]
        );
        assert_eq!(codes_of(&validator, "6").await, vec![codes::LESS_THAN_OR_EQUAL]);
    }

    #[tokio::test]
    async fn step_counts_from_minimum() {
        let validator = NumberValidator::new(NumberProperties {
            min_value: Some(0.25),
            max_value: None,
            step: Some(0.5),
        });
        assert!(codes_of(&validator, "0.75").await.is_empty());
        assert_eq!(codes_of(&validator, "1").await, vec![codes::STEP]);
    }

    #[tokio::test]
    async fn step_tolerates_binary_rounding() {
        let validator = NumberValidator::new(NumberProperties {
            step: Some(0.1),
            ..Default::default()
        });
        assert!(codes_of(&validator, "0.3").await.is_empty());
    }
}
