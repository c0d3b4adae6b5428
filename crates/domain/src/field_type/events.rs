//! Field type domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{Description, DisplayName, FieldTypeId, UniqueName};

use super::FieldTypeProperties;

/// Events that can occur on a field type aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FieldTypeEvent {
    FieldTypeCreated(FieldTypeCreatedData),
    FieldTypeUniqueNameChanged(FieldTypeUniqueNameChangedData),
    FieldTypeDisplayNameChanged(FieldTypeDisplayNameChangedData),
    FieldTypeDescriptionChanged(FieldTypeDescriptionChangedData),
    FieldTypePropertiesChanged(FieldTypePropertiesChangedData),
    FieldTypeDeleted(FieldTypeDeletedData),
}

impl DomainEvent for FieldTypeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FieldTypeEvent::FieldTypeCreated(_) => "FieldTypeCreated",
            FieldTypeEvent::FieldTypeUniqueNameChanged(_) => "FieldTypeUniqueNameChanged",
            FieldTypeEvent::FieldTypeDisplayNameChanged(_) => "FieldTypeDisplayNameChanged",
            FieldTypeEvent::FieldTypeDescriptionChanged(_) => "FieldTypeDescriptionChanged",
            FieldTypeEvent::FieldTypePropertiesChanged(_) => "FieldTypePropertiesChanged",
            FieldTypeEvent::FieldTypeDeleted(_) => "FieldTypeDeleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeCreatedData {
    pub field_type_id: FieldTypeId,
    pub unique_name: UniqueName,
    pub properties: FieldTypeProperties,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeUniqueNameChangedData {
    pub unique_name: UniqueName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeDisplayNameChangedData {
    pub display_name: Option<DisplayName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeDescriptionChangedData {
    pub description: Option<Description>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypePropertiesChangedData {
    pub properties: FieldTypeProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTypeDeletedData {
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors
impl FieldTypeEvent {
    pub fn created(
        field_type_id: FieldTypeId,
        unique_name: UniqueName,
        properties: FieldTypeProperties,
    ) -> Self {
        FieldTypeEvent::FieldTypeCreated(FieldTypeCreatedData {
            field_type_id,
            unique_name,
            properties,
            created_at: Utc::now(),
        })
    }

    pub fn unique_name_changed(unique_name: UniqueName) -> Self {
        FieldTypeEvent::FieldTypeUniqueNameChanged(FieldTypeUniqueNameChangedData { unique_name })
    }

    pub fn display_name_changed(display_name: Option<DisplayName>) -> Self {
        FieldTypeEvent::FieldTypeDisplayNameChanged(FieldTypeDisplayNameChangedData {
            display_name,
        })
    }

    pub fn description_changed(description: Option<Description>) -> Self {
        FieldTypeEvent::FieldTypeDescriptionChanged(FieldTypeDescriptionChangedData {
            description,
        })
    }

    pub fn properties_changed(properties: FieldTypeProperties) -> Self {
        FieldTypeEvent::FieldTypePropertiesChanged(FieldTypePropertiesChangedData { properties })
    }

    pub fn deleted() -> Self {
        FieldTypeEvent::FieldTypeDeleted(FieldTypeDeletedData {
            deleted_at: Utc::now(),
        })
    }
}
