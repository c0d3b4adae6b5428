//! Save orchestration for field types.

use std::sync::Arc;

use event_store::ClaimSet;

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::queriers::FieldTypeQuerier;
use crate::repository::{ContentTypeRepository, FieldTypeRepository};
use crate::uniqueness::{field_type_scope, into_name_conflict, name_already_used, name_claims};

use super::{FieldType, FieldTypeEvent};

/// Enforces realm-wide name uniqueness of field types and cascades their
/// deletion into the content types using them.
pub struct FieldTypeManager {
    field_types: Arc<dyn FieldTypeRepository>,
    content_types: Arc<dyn ContentTypeRepository>,
    querier: Arc<dyn FieldTypeQuerier>,
}

impl FieldTypeManager {
    pub fn new(
        field_types: Arc<dyn FieldTypeRepository>,
        content_types: Arc<dyn ContentTypeRepository>,
        querier: Arc<dyn FieldTypeQuerier>,
    ) -> Self {
        Self {
            field_types,
            content_types,
            querier,
        }
    }

    /// Saves a field type.
    ///
    /// When the field type is created or renamed, its name must not be used
    /// by another field type of the realm.
    #[tracing::instrument(skip_all, fields(field_type_id = ?field_type.id()))]
    pub async fn save(&self, field_type: &mut FieldType) -> Result<(), DomainError> {
        if !field_type.has_changes() {
            return Ok(());
        }
        let field_type_id = field_type.field_type_id()?;
        let realm_id = field_type_id.realm_id();
        let unique_name = field_type.unique_name()?.clone();
        let scope = field_type_scope(realm_id);

        let renamed = field_type.pending_events().iter().any(|event| {
            matches!(
                event,
                FieldTypeEvent::FieldTypeCreated(_) | FieldTypeEvent::FieldTypeUniqueNameChanged(_)
            )
        });

        let claims = if field_type.is_deleted() {
            ClaimSet::none().release(scope)
        } else if renamed {
            if let Some(existing) = self.querier.find_id(realm_id, &unique_name).await?
                && existing != field_type_id
            {
                tracing::info!(%unique_name, %existing, "field type name already used");
                return Err(name_already_used(
                    FieldType::aggregate_type(),
                    realm_id,
                    &unique_name,
                    existing.aggregate_id(),
                ));
            }
            name_claims(scope, &unique_name)
        } else {
            ClaimSet::none()
        };

        self.field_types
            .save(field_type, claims)
            .await
            .map_err(|e| into_name_conflict(e, FieldType::aggregate_type(), realm_id, &unique_name))
    }

    /// Deletes a field type after removing it from every content type of the
    /// realm that uses it.
    #[tracing::instrument(skip_all, fields(field_type_id = ?field_type.id()))]
    pub async fn delete(&self, field_type: &mut FieldType) -> Result<(), DomainError> {
        let field_type_id = field_type.field_type_id()?;

        let mut affected = Vec::new();
        for mut content_type in self
            .content_types
            .load_in_realm(field_type_id.realm_id())
            .await?
        {
            let field_ids: Vec<_> = content_type
                .fields_of_type(field_type_id)
                .map(|field| field.id)
                .collect();
            if field_ids.is_empty() {
                continue;
            }
            for field_id in field_ids {
                content_type.remove_field(field_id)?;
            }
            affected.push(content_type);
        }

        tracing::debug!(content_types = affected.len(), "removing field definitions");
        self.content_types.save_all(&mut affected).await?;

        field_type.delete()?;
        self.save(field_type).await
    }
}
