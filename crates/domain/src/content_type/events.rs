//! Content type domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{ContentTypeId, Description, DisplayName, FieldId, UniqueName};

use super::FieldDefinition;

/// Events that can occur on a content type aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ContentTypeEvent {
    ContentTypeCreated(ContentTypeCreatedData),
    ContentTypeUniqueNameChanged(ContentTypeUniqueNameChangedData),
    ContentTypeDisplayNameChanged(ContentTypeDisplayNameChangedData),
    ContentTypeDescriptionChanged(ContentTypeDescriptionChangedData),
    ContentTypeInvariantChanged(ContentTypeInvariantChangedData),
    FieldDefinitionChanged(FieldDefinitionChangedData),
    FieldDefinitionRemoved(FieldDefinitionRemovedData),
    ContentTypeDeleted(ContentTypeDeletedData),
}

impl DomainEvent for ContentTypeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ContentTypeEvent::ContentTypeCreated(_) => "ContentTypeCreated",
            ContentTypeEvent::ContentTypeUniqueNameChanged(_) => "ContentTypeUniqueNameChanged",
            ContentTypeEvent::ContentTypeDisplayNameChanged(_) => "ContentTypeDisplayNameChanged",
            ContentTypeEvent::ContentTypeDescriptionChanged(_) => "ContentTypeDescriptionChanged",
            ContentTypeEvent::ContentTypeInvariantChanged(_) => "ContentTypeInvariantChanged",
            ContentTypeEvent::FieldDefinitionChanged(_) => "FieldDefinitionChanged",
            ContentTypeEvent::FieldDefinitionRemoved(_) => "FieldDefinitionRemoved",
            ContentTypeEvent::ContentTypeDeleted(_) => "ContentTypeDeleted",
        }
    }
}

/// Data for ContentTypeCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeCreatedData {
    pub content_type_id: ContentTypeId,
    pub unique_name: UniqueName,
    pub is_invariant: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeUniqueNameChangedData {
    pub unique_name: UniqueName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDisplayNameChangedData {
    pub display_name: Option<DisplayName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDescriptionChangedData {
    pub description: Option<Description>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeInvariantChangedData {
    pub is_invariant: bool,
}

/// Data for FieldDefinitionChanged event.
///
/// Raised both when a definition is added and when it is updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinitionChangedData {
    pub field_definition: FieldDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinitionRemovedData {
    pub field_id: FieldId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDeletedData {
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors
impl ContentTypeEvent {
    pub fn created(
        content_type_id: ContentTypeId,
        unique_name: UniqueName,
        is_invariant: bool,
    ) -> Self {
        ContentTypeEvent::ContentTypeCreated(ContentTypeCreatedData {
            content_type_id,
            unique_name,
            is_invariant,
            created_at: Utc::now(),
        })
    }

    pub fn unique_name_changed(unique_name: UniqueName) -> Self {
        ContentTypeEvent::ContentTypeUniqueNameChanged(ContentTypeUniqueNameChangedData {
            unique_name,
        })
    }

    pub fn display_name_changed(display_name: Option<DisplayName>) -> Self {
        ContentTypeEvent::ContentTypeDisplayNameChanged(ContentTypeDisplayNameChangedData {
            display_name,
        })
    }

    pub fn description_changed(description: Option<Description>) -> Self {
        ContentTypeEvent::ContentTypeDescriptionChanged(ContentTypeDescriptionChangedData {
            description,
        })
    }

    pub fn invariant_changed(is_invariant: bool) -> Self {
        ContentTypeEvent::ContentTypeInvariantChanged(ContentTypeInvariantChangedData {
            is_invariant,
        })
    }

    pub fn field_definition_changed(field_definition: FieldDefinition) -> Self {
        ContentTypeEvent::FieldDefinitionChanged(FieldDefinitionChangedData { field_definition })
    }

    pub fn field_definition_removed(field_id: FieldId) -> Self {
        ContentTypeEvent::FieldDefinitionRemoved(FieldDefinitionRemovedData { field_id })
    }

    pub fn deleted() -> Self {
        ContentTypeEvent::ContentTypeDeleted(ContentTypeDeletedData {
            deleted_at: Utc::now(),
        })
    }
}
