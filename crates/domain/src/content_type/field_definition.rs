use serde::{Deserialize, Serialize};

use crate::value_objects::{Description, DisplayName, FieldId, FieldTypeId, Placeholder, UniqueName};

/// Binding of a field type into a content type.
///
/// An invariant field has one value per content; a variant field has one
/// value per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: FieldId,
    pub field_type_id: FieldTypeId,
    pub is_invariant: bool,
    pub is_required: bool,
    pub is_indexed: bool,
    pub is_unique: bool,
    pub unique_name: UniqueName,
    pub display_name: Option<DisplayName>,
    pub description: Option<Description>,
    pub placeholder: Option<Placeholder>,
}

impl FieldDefinition {
    /// Creates a variant, optional, non-indexed, non-unique definition.
    pub fn new(id: FieldId, field_type_id: FieldTypeId, unique_name: UniqueName) -> Self {
        Self {
            id,
            field_type_id,
            is_invariant: false,
            is_required: false,
            is_indexed: false,
            is_unique: false,
            unique_name,
            display_name: None,
            description: None,
            placeholder: None,
        }
    }

    pub fn invariant(mut self, is_invariant: bool) -> Self {
        self.is_invariant = is_invariant;
        self
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    pub fn indexed(mut self, is_indexed: bool) -> Self {
        self.is_indexed = is_indexed;
        self
    }

    pub fn unique(mut self, is_unique: bool) -> Self {
        self.is_unique = is_unique;
        self
    }

    pub fn with_display_name(mut self, display_name: Option<DisplayName>) -> Self {
        self.display_name = display_name;
        self
    }

    pub fn with_description(mut self, description: Option<Description>) -> Self {
        self.description = description;
        self
    }

    pub fn with_placeholder(mut self, placeholder: Option<Placeholder>) -> Self {
        self.placeholder = placeholder;
        self
    }
}
