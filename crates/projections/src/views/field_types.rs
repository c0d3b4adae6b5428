//! Field types read model.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::RealmId;
use domain::{
    Aggregate, DataType, Description, DisplayName, DomainError, FieldType, FieldTypeEvent,
    FieldTypeId, FieldTypeProperties, FieldTypeQuerier, UniqueName,
};
use event_store::{EventEnvelope, Version};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldTypeSummary {
    pub field_type_id: FieldTypeId,
    pub unique_name: UniqueName,
    pub display_name: Option<DisplayName>,
    pub description: Option<Description>,
    pub properties: FieldTypeProperties,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FieldTypeSummary {
    pub fn data_type(&self) -> DataType {
        self.properties.data_type()
    }
}

#[derive(Default)]
struct FieldTypesState {
    field_types: HashMap<FieldTypeId, FieldTypeSummary>,
    position: ProjectionPosition,
}

/// Live field types of every realm.
#[derive(Clone, Default)]
pub struct FieldTypesView {
    state: Arc<RwLock<FieldTypesState>>,
}

impl FieldTypesView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, field_type_id: FieldTypeId) -> Option<FieldTypeSummary> {
        self.state.read().await.field_types.get(&field_type_id).cloned()
    }

    /// Lists the field types of a realm, by unique name.
    pub async fn list(&self, realm_id: Option<RealmId>) -> Vec<FieldTypeSummary> {
        let state = self.state.read().await;
        let mut field_types: Vec<_> = state
            .field_types
            .values()
            .filter(|summary| summary.field_type_id.realm_id() == realm_id)
            .cloned()
            .collect();
        field_types.sort_by_key(|summary| summary.unique_name.normalized());
        field_types
    }

    pub async fn list_by_data_type(
        &self,
        realm_id: Option<RealmId>,
        data_type: DataType,
    ) -> Vec<FieldTypeSummary> {
        let mut field_types = self.list(realm_id).await;
        field_types.retain(|summary| summary.data_type() == data_type);
        field_types
    }
}

#[async_trait]
impl Projection for FieldTypesView {
    fn name(&self) -> &'static str {
        "FieldTypesView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let change: Option<FieldTypeEvent> = decode(event, FieldType::aggregate_type())?;
        let field_type_id = FieldTypeId::from_aggregate_id(event.aggregate_id);

        let mut state = self.state.write().await;
        state.position = state.position.advance(event);
        let Some(change) = change else {
            return Ok(());
        };

        if let FieldTypeEvent::FieldTypeCreated(data) = change {
            state.field_types.insert(
                field_type_id,
                FieldTypeSummary {
                    field_type_id: data.field_type_id,
                    unique_name: data.unique_name,
                    display_name: None,
                    description: None,
                    properties: data.properties,
                    version: event.version,
                    created_at: data.created_at,
                    updated_at: event.timestamp,
                },
            );
            return Ok(());
        }
        if let FieldTypeEvent::FieldTypeDeleted(_) = change {
            state.field_types.remove(&field_type_id);
            return Ok(());
        }

        let Some(summary) = state.field_types.get_mut(&field_type_id) else {
            tracing::warn!(%field_type_id, event_type = %event.event_type, "event for an unknown field type");
            return Ok(());
        };
        match change {
            FieldTypeEvent::FieldTypeUniqueNameChanged(data) => summary.unique_name = data.unique_name,
            FieldTypeEvent::FieldTypeDisplayNameChanged(data) => {
                summary.display_name = data.display_name
            }
            FieldTypeEvent::FieldTypeDescriptionChanged(data) => {
                summary.description = data.description
            }
            FieldTypeEvent::FieldTypePropertiesChanged(data) => summary.properties = data.properties,
            FieldTypeEvent::FieldTypeCreated(_) | FieldTypeEvent::FieldTypeDeleted(_) => {}
        }
        summary.version = event.version;
        summary.updated_at = event.timestamp;
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = FieldTypesState::default();
        Ok(())
    }
}

#[async_trait]
impl FieldTypeQuerier for FieldTypesView {
    async fn find_id(
        &self,
        realm_id: Option<RealmId>,
        unique_name: &UniqueName,
    ) -> std::result::Result<Option<FieldTypeId>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .field_types
            .values()
            .find(|summary| {
                summary.field_type_id.realm_id() == realm_id
                    && summary.unique_name.matches(unique_name)
            })
            .map(|summary| summary.field_type_id))
    }
}

impl ReadModel for FieldTypesView {
    fn name(&self) -> &'static str {
        "FieldTypesView"
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|state| state.field_types.len())
            .unwrap_or(0)
    }
}
