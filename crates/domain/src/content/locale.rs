use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::{Description, DisplayName, FieldId, UniqueName};

/// The value of one locale of a content: its names and raw field values.
///
/// Field values are stored as trimmed strings whatever their data type;
/// blank values are dropped, so a field without a meaningful value is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLocale {
    unique_name: UniqueName,
    display_name: Option<DisplayName>,
    description: Option<Description>,
    field_values: BTreeMap<FieldId, String>,
}

impl ContentLocale {
    pub fn new(unique_name: UniqueName) -> Self {
        Self {
            unique_name,
            display_name: None,
            description: None,
            field_values: BTreeMap::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: Option<DisplayName>) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn with_description(mut self, description: Option<Description>) -> Self {
        self.description = description;
        self
    }

    /// Replaces every field value.
    pub fn with_field_values<V: AsRef<str>>(
        mut self,
        values: impl IntoIterator<Item = (FieldId, V)>,
    ) -> Self {
        self.field_values.clear();
        for (field_id, value) in values {
            self = self.with_field_value(field_id, value);
        }
        self
    }

    /// Sets one field value; a blank value removes the field.
    pub fn with_field_value(mut self, field_id: FieldId, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if value.is_empty() {
            self.field_values.remove(&field_id);
        } else {
            self.field_values.insert(field_id, value.to_string());
        }
        self
    }

    pub fn without_field_value(mut self, field_id: FieldId) -> Self {
        self.field_values.remove(&field_id);
        self
    }

    pub fn unique_name(&self) -> &UniqueName {
        &self.unique_name
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn field_values(&self) -> &BTreeMap<FieldId, String> {
        &self.field_values
    }

    pub fn field_value(&self, field_id: FieldId) -> Option<&str> {
        self.field_values.get(&field_id).map(String::as_str)
    }
}
