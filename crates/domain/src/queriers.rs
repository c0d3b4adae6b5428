//! Read-model ports the save orchestrators consult.
//!
//! Answers are advisory: a read model may lag behind the event log. The
//! claims recorded by the event store are the authoritative uniqueness check.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use common::RealmId;

use crate::error::DomainError;
use crate::value_objects::{ContentId, ContentTypeId, FieldId, FieldTypeId, LanguageId, UniqueName};

/// Lookups over the published and draft contents of every content type.
#[async_trait]
pub trait ContentQuerier: Send + Sync {
    /// Finds the content using a unique name in one locale of a content type.
    async fn find_id(
        &self,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        unique_name: &UniqueName,
    ) -> Result<Option<ContentId>, DomainError>;

    /// Finds the contents, other than `excluding`, already using one of the
    /// given unique field values in the same locale of a content type.
    ///
    /// Returns the conflicting content for each field id that conflicts.
    async fn find_conflicts(
        &self,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        values: &BTreeMap<FieldId, String>,
        excluding: ContentId,
    ) -> Result<BTreeMap<FieldId, ContentId>, DomainError>;

    /// Resolves the content type of existing contents.
    ///
    /// Unknown or deleted contents are absent from the result.
    async fn find_content_type_ids(
        &self,
        content_ids: &[ContentId],
    ) -> Result<HashMap<ContentId, ContentTypeId>, DomainError>;
}

#[async_trait]
pub trait ContentTypeQuerier: Send + Sync {
    /// Finds the content type using a unique name in a realm.
    async fn find_id(
        &self,
        realm_id: Option<RealmId>,
        unique_name: &UniqueName,
    ) -> Result<Option<ContentTypeId>, DomainError>;
}

#[async_trait]
pub trait FieldTypeQuerier: Send + Sync {
    /// Finds the field type using a unique name in a realm.
    async fn find_id(
        &self,
        realm_id: Option<RealmId>,
        unique_name: &UniqueName,
    ) -> Result<Option<FieldTypeId>, DomainError>;
}
