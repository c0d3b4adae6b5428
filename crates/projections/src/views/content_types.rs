//! Content types read model.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::RealmId;
use domain::{
    Aggregate, ContentType, ContentTypeEvent, ContentTypeId, ContentTypeQuerier, Description,
    DisplayName, DomainError, FieldDefinition, FieldTypeId, UniqueName,
};
use event_store::{EventEnvelope, Version};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, PartialEq)]
pub struct ContentTypeSummary {
    pub content_type_id: ContentTypeId,
    pub unique_name: UniqueName,
    pub display_name: Option<DisplayName>,
    pub description: Option<Description>,
    pub is_invariant: bool,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDefinition>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct ContentTypesState {
    content_types: HashMap<ContentTypeId, ContentTypeSummary>,
    position: ProjectionPosition,
}

/// Live content types of every realm, with their field definitions.
#[derive(Clone, Default)]
pub struct ContentTypesView {
    state: Arc<RwLock<ContentTypesState>>,
}

impl ContentTypesView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, content_type_id: ContentTypeId) -> Option<ContentTypeSummary> {
        self.state
            .read()
            .await
            .content_types
            .get(&content_type_id)
            .cloned()
    }

    /// Lists the content types of a realm, by unique name.
    pub async fn list(&self, realm_id: Option<RealmId>) -> Vec<ContentTypeSummary> {
        let state = self.state.read().await;
        let mut content_types: Vec<_> = state
            .content_types
            .values()
            .filter(|summary| summary.content_type_id.realm_id() == realm_id)
            .cloned()
            .collect();
        content_types.sort_by_key(|summary| summary.unique_name.normalized());
        content_types
    }

    /// Content types with at least one field of the given field type.
    pub async fn using_field_type(&self, field_type_id: FieldTypeId) -> Vec<ContentTypeId> {
        let state = self.state.read().await;
        let mut ids: Vec<_> = state
            .content_types
            .values()
            .filter(|summary| {
                summary
                    .fields
                    .iter()
                    .any(|field| field.field_type_id == field_type_id)
            })
            .map(|summary| summary.content_type_id)
            .collect();
        ids.sort();
        ids
    }
}

fn apply(summary: &mut ContentTypeSummary, change: ContentTypeEvent) {
    match change {
        ContentTypeEvent::ContentTypeUniqueNameChanged(data) => summary.unique_name = data.unique_name,
        ContentTypeEvent::ContentTypeDisplayNameChanged(data) => {
            summary.display_name = data.display_name
        }
        ContentTypeEvent::ContentTypeDescriptionChanged(data) => {
            summary.description = data.description
        }
        ContentTypeEvent::ContentTypeInvariantChanged(data) => summary.is_invariant = data.is_invariant,
        ContentTypeEvent::FieldDefinitionChanged(data) => {
            let definition = data.field_definition;
            match summary.fields.iter_mut().find(|field| field.id == definition.id) {
                Some(existing) => *existing = definition,
                None => summary.fields.push(definition),
            }
        }
        ContentTypeEvent::FieldDefinitionRemoved(data) => {
            summary.fields.retain(|field| field.id != data.field_id)
        }
        ContentTypeEvent::ContentTypeCreated(_) | ContentTypeEvent::ContentTypeDeleted(_) => {}
    }
}

#[async_trait]
impl Projection for ContentTypesView {
    fn name(&self) -> &'static str {
        "ContentTypesView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let change: Option<ContentTypeEvent> = decode(event, ContentType::aggregate_type())?;
        let content_type_id = ContentTypeId::from_aggregate_id(event.aggregate_id);

        let mut state = self.state.write().await;
        state.position = state.position.advance(event);
        match change {
            None => {}
            Some(ContentTypeEvent::ContentTypeCreated(data)) => {
                state.content_types.insert(
                    content_type_id,
                    ContentTypeSummary {
                        content_type_id: data.content_type_id,
                        unique_name: data.unique_name,
                        display_name: None,
                        description: None,
                        is_invariant: data.is_invariant,
                        fields: Vec::new(),
                        version: event.version,
                        created_at: data.created_at,
                        updated_at: event.timestamp,
                    },
                );
            }
            Some(ContentTypeEvent::ContentTypeDeleted(_)) => {
                state.content_types.remove(&content_type_id);
            }
            Some(change) => match state.content_types.get_mut(&content_type_id) {
                Some(summary) => {
                    apply(summary, change);
                    summary.version = event.version;
                    summary.updated_at = event.timestamp;
                }
                None => {
                    tracing::warn!(%content_type_id, event_type = %event.event_type, "event for an unknown content type");
                }
            },
        }
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = ContentTypesState::default();
        Ok(())
    }
}

#[async_trait]
impl ContentTypeQuerier for ContentTypesView {
    async fn find_id(
        &self,
        realm_id: Option<RealmId>,
        unique_name: &UniqueName,
    ) -> std::result::Result<Option<ContentTypeId>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .content_types
            .values()
            .find(|summary| {
                summary.content_type_id.realm_id() == realm_id
                    && summary.unique_name.matches(unique_name)
            })
            .map(|summary| summary.content_type_id))
    }
}

impl ReadModel for ContentTypesView {
    fn name(&self) -> &'static str {
        "ContentTypesView"
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|state| state.content_types.len())
            .unwrap_or(0)
    }
}
