//! Save orchestration for content types.

use std::collections::BTreeSet;
use std::sync::Arc;

use event_store::ClaimSet;

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::field_type::FieldType;
use crate::queriers::ContentTypeQuerier;
use crate::repository::{ContentTypeRepository, FieldTypeRepository};
use crate::uniqueness::{content_type_scope, into_name_conflict, name_already_used, name_claims};
use crate::value_objects::FieldTypeId;

use super::{ContentType, ContentTypeEvent};

/// Enforces realm-wide name uniqueness of content types and checks the field
/// types their definitions point to.
pub struct ContentTypeManager {
    content_types: Arc<dyn ContentTypeRepository>,
    field_types: Arc<dyn FieldTypeRepository>,
    querier: Arc<dyn ContentTypeQuerier>,
}

impl ContentTypeManager {
    pub fn new(
        content_types: Arc<dyn ContentTypeRepository>,
        field_types: Arc<dyn FieldTypeRepository>,
        querier: Arc<dyn ContentTypeQuerier>,
    ) -> Self {
        Self {
            content_types,
            field_types,
            querier,
        }
    }

    /// Saves a content type.
    #[tracing::instrument(skip_all, fields(content_type_id = ?content_type.id()))]
    pub async fn save(&self, content_type: &mut ContentType) -> Result<(), DomainError> {
        if !content_type.has_changes() {
            return Ok(());
        }
        let content_type_id = content_type.content_type_id()?;
        let realm_id = content_type_id.realm_id();
        let unique_name = content_type.unique_name()?.clone();
        let scope = content_type_scope(realm_id);

        let claims = if content_type.is_deleted() {
            ClaimSet::none().release(scope)
        } else {
            self.ensure_field_types_exist(content_type).await?;

            let renamed = content_type.pending_events().iter().any(|event| {
                matches!(
                    event,
                    ContentTypeEvent::ContentTypeCreated(_)
                        | ContentTypeEvent::ContentTypeUniqueNameChanged(_)
                )
            });
            if renamed {
                if let Some(existing) = self.querier.find_id(realm_id, &unique_name).await?
                    && existing != content_type_id
                {
                    tracing::info!(%unique_name, %existing, "content type name already used");
                    return Err(name_already_used(
                        ContentType::aggregate_type(),
                        realm_id,
                        &unique_name,
                        existing.aggregate_id(),
                    ));
                }
                name_claims(scope, &unique_name)
            } else {
                ClaimSet::none()
            }
        };

        self.content_types
            .save(content_type, claims)
            .await
            .map_err(|e| {
                into_name_conflict(e, ContentType::aggregate_type(), realm_id, &unique_name)
            })
    }

    /// Soft-deletes a content type and frees its name.
    #[tracing::instrument(skip_all, fields(content_type_id = ?content_type.id()))]
    pub async fn delete(&self, content_type: &mut ContentType) -> Result<(), DomainError> {
        content_type.delete()?;
        self.save(content_type).await
    }

    /// Every field definition set since the last save must point to a live
    /// field type of the content type's realm.
    async fn ensure_field_types_exist(&self, content_type: &ContentType) -> Result<(), DomainError> {
        let referenced: BTreeSet<FieldTypeId> = content_type
            .pending_events()
            .iter()
            .filter_map(|event| match event {
                ContentTypeEvent::FieldDefinitionChanged(data) => {
                    content_type.find_field(data.field_definition.id)
                }
                _ => None,
            })
            .map(|definition| definition.field_type_id)
            .collect();
        if referenced.is_empty() {
            return Ok(());
        }

        let realm_id = content_type.content_type_id()?.realm_id();
        let ids: Vec<_> = referenced.iter().copied().collect();
        let found: BTreeSet<FieldTypeId> = self
            .field_types
            .load_many(&ids)
            .await?
            .iter()
            .filter_map(|field_type| field_type.field_type_id().ok())
            .collect();

        match referenced
            .into_iter()
            .find(|id| id.realm_id() != realm_id || !found.contains(id))
        {
            Some(missing) => Err(DomainError::not_found(FieldType::aggregate_type(), missing)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_type::FieldDefinition;
    use crate::error::ConflictError;
    use crate::field_type::{FieldTypeProperties, TagsProperties};
    use crate::testing::Fixture;
    use crate::value_objects::{ContentTypeId, FieldId, UniqueName};
    use common::RealmId;

    fn blog_article(realm_id: Option<RealmId>, name: &str) -> ContentType {
        ContentType::new(
            ContentTypeId::new(realm_id),
            UniqueName::new(name).unwrap(),
            false,
        )
    }

    async fn saved_tags(fixture: &Fixture, realm_id: Option<RealmId>) -> FieldTypeId {
        let mut tags = FieldType::new(
            FieldTypeId::new(realm_id),
            UniqueName::new("Keywords").unwrap(),
            FieldTypeProperties::Tags(TagsProperties {}),
        )
        .unwrap();
        fixture.field_type_manager().save(&mut tags).await.unwrap();
        tags.field_type_id().unwrap()
    }

    #[tokio::test]
    async fn duplicate_name_in_realm_is_a_conflict() {
        let fixture = Fixture::new();
        let manager = fixture.content_type_manager();

        let mut first = blog_article(None, "BlogArticle");
        manager.save(&mut first).await.unwrap();

        let mut second = blog_article(None, "BLOGARTICLE");
        let error = manager.save(&mut second).await.unwrap_err();
        assert!(matches!(
            error,
            DomainError::Conflict(ConflictError::UniqueNameAlreadyUsed {
                aggregate_type: "ContentType",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn definitions_must_reference_existing_field_types() {
        let fixture = Fixture::new();
        let manager = fixture.content_type_manager();
        let tags = saved_tags(&fixture, None).await;

        let mut content_type = blog_article(None, "BlogArticle");
        content_type
            .set_field(FieldDefinition::new(
                FieldId::new(),
                tags,
                UniqueName::new("Keywords").unwrap(),
            ))
            .unwrap();
        manager.save(&mut content_type).await.unwrap();

        let unknown = FieldTypeId::new(None);
        content_type
            .set_field(FieldDefinition::new(
                FieldId::new(),
                unknown,
                UniqueName::new("Other").unwrap(),
            ))
            .unwrap();
        let error = manager.save(&mut content_type).await.unwrap_err();
        assert!(matches!(
            error,
            DomainError::NotFound { aggregate_type: "FieldType", ref aggregate_id }
                if *aggregate_id == unknown.to_string()
        ));
    }

    #[tokio::test]
    async fn field_types_from_another_realm_are_not_found() {
        let fixture = Fixture::new();
        let manager = fixture.content_type_manager();
        let foreign = saved_tags(&fixture, Some(RealmId::new())).await;

        let mut content_type = blog_article(None, "BlogArticle");
        content_type
            .set_field(FieldDefinition::new(
                FieldId::new(),
                foreign,
                UniqueName::new("Keywords").unwrap(),
            ))
            .unwrap();
        let error = manager.save(&mut content_type).await.unwrap_err();
        assert!(matches!(error, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_frees_the_name() {
        let fixture = Fixture::new();
        let manager = fixture.content_type_manager();

        let mut first = blog_article(None, "BlogArticle");
        manager.save(&mut first).await.unwrap();
        manager.delete(&mut first).await.unwrap();

        let mut second = blog_article(None, "BlogArticle");
        manager.save(&mut second).await.unwrap();
        assert!(
            fixture
                .content_types()
                .load(first.content_type_id().unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }
}
