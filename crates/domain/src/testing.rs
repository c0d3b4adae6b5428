//! In-memory wiring for unit tests.
//!
//! The queriers answer by folding the event log on every call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::RealmId;
use event_store::InMemoryEventStore;

use crate::content::ContentManager;
use crate::content_type::ContentTypeManager;
use crate::error::DomainError;
use crate::field_type::FieldTypeManager;
use crate::fields::FieldValueValidatorFactory;
use crate::queriers::{ContentQuerier, ContentTypeQuerier, FieldTypeQuerier};
use crate::repository::{
    ContentRepository, ContentTypeRepository, EventSourcedRepository, FieldTypeRepository,
};
use crate::value_objects::{
    ContentId, ContentTypeId, FieldId, FieldTypeId, LanguageId, UniqueName,
};

pub(crate) type Repository = EventSourcedRepository<InMemoryEventStore>;

pub(crate) struct Fixture {
    pub repository: Arc<Repository>,
    queriers: Arc<ScanningQueriers>,
}

impl Fixture {
    pub fn new() -> Self {
        let repository = Arc::new(EventSourcedRepository::new(InMemoryEventStore::new()));
        let queriers = Arc::new(ScanningQueriers {
            repository: repository.clone(),
        });
        Self {
            repository,
            queriers,
        }
    }

    pub fn contents(&self) -> Arc<dyn ContentRepository> {
        self.repository.clone()
    }

    pub fn content_types(&self) -> Arc<dyn ContentTypeRepository> {
        self.repository.clone()
    }

    pub fn field_types(&self) -> Arc<dyn FieldTypeRepository> {
        self.repository.clone()
    }

    pub fn field_type_manager(&self) -> FieldTypeManager {
        FieldTypeManager::new(self.field_types(), self.content_types(), self.queriers.clone())
    }

    /// A manager whose read model never sees anything.
    pub fn field_type_manager_without_read_model(&self) -> FieldTypeManager {
        FieldTypeManager::new(self.field_types(), self.content_types(), Arc::new(BlindQuerier))
    }

    pub fn content_type_manager(&self) -> ContentTypeManager {
        ContentTypeManager::new(self.content_types(), self.field_types(), self.queriers.clone())
    }

    pub fn content_querier(&self) -> Arc<dyn ContentQuerier> {
        self.queriers.clone()
    }

    pub fn validator_factory(&self) -> FieldValueValidatorFactory {
        FieldValueValidatorFactory::new(self.content_querier())
    }

    pub fn content_manager(&self) -> ContentManager {
        ContentManager::new(
            self.contents(),
            self.field_types(),
            self.queriers.clone(),
            self.validator_factory(),
        )
    }

    /// A content manager whose read model never sees anything.
    pub fn content_manager_without_read_model(&self) -> ContentManager {
        let blind = Arc::new(BlindQuerier);
        ContentManager::new(
            self.contents(),
            self.field_types(),
            blind.clone(),
            self.validator_factory(),
        )
    }
}

struct ScanningQueriers {
    repository: Arc<Repository>,
}

#[async_trait]
impl ContentQuerier for ScanningQueriers {
    async fn find_id(
        &self,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        unique_name: &UniqueName,
    ) -> Result<Option<ContentId>, DomainError> {
        let contents =
            ContentRepository::load_in_realm(&*self.repository, content_type_id.realm_id()).await?;
        Ok(contents
            .into_iter()
            .filter(|content| content.content_type_id().ok() == Some(content_type_id))
            .find(|content| {
                content
                    .find_locale(language_id)
                    .is_some_and(|locale| locale.unique_name().matches(unique_name))
            })
            .and_then(|content| content.content_id().ok()))
    }

    async fn find_conflicts(
        &self,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        values: &BTreeMap<FieldId, String>,
        excluding: ContentId,
    ) -> Result<BTreeMap<FieldId, ContentId>, DomainError> {
        let contents =
            ContentRepository::load_in_realm(&*self.repository, content_type_id.realm_id()).await?;
        let mut conflicts = BTreeMap::new();
        for content in contents {
            let Ok(content_id) = content.content_id() else {
                continue;
            };
            if content_id == excluding || content.content_type_id().ok() != Some(content_type_id)
            {
                continue;
            }
            let Some(locale) = content.find_locale(language_id) else {
                continue;
            };
            for (field_id, value) in values {
                if locale.field_value(*field_id) == Some(value.as_str()) {
                    conflicts.entry(*field_id).or_insert(content_id);
                }
            }
        }
        Ok(conflicts)
    }

    async fn find_content_type_ids(
        &self,
        content_ids: &[ContentId],
    ) -> Result<HashMap<ContentId, ContentTypeId>, DomainError> {
        let contents = ContentRepository::load_many(&*self.repository, content_ids).await?;
        Ok(contents
            .into_iter()
            .filter_map(|content| Some((content.content_id().ok()?, content.content_type_id().ok()?)))
            .collect())
    }
}

#[async_trait]
impl ContentTypeQuerier for ScanningQueriers {
    async fn find_id(
        &self,
        realm_id: Option<RealmId>,
        unique_name: &UniqueName,
    ) -> Result<Option<ContentTypeId>, DomainError> {
        let content_types = ContentTypeRepository::load_in_realm(&*self.repository, realm_id).await?;
        Ok(content_types
            .into_iter()
            .find(|content_type| {
                content_type
                    .unique_name()
                    .is_ok_and(|name| name.matches(unique_name))
            })
            .and_then(|content_type| content_type.content_type_id().ok()))
    }
}

#[async_trait]
impl FieldTypeQuerier for ScanningQueriers {
    async fn find_id(
        &self,
        realm_id: Option<RealmId>,
        unique_name: &UniqueName,
    ) -> Result<Option<FieldTypeId>, DomainError> {
        let field_types = FieldTypeRepository::load_in_realm(&*self.repository, realm_id).await?;
        Ok(field_types
            .into_iter()
            .find(|field_type| {
                field_type
                    .unique_name()
                    .is_ok_and(|name| name.matches(unique_name))
            })
            .and_then(|field_type| field_type.field_type_id().ok()))
    }
}

/// Finds nothing, as a read model lagging behind the event log would.
struct BlindQuerier;

#[async_trait]
impl FieldTypeQuerier for BlindQuerier {
    async fn find_id(
        &self,
        _realm_id: Option<RealmId>,
        _unique_name: &UniqueName,
    ) -> Result<Option<FieldTypeId>, DomainError> {
        Ok(None)
    }
}

#[async_trait]
impl ContentQuerier for BlindQuerier {
    async fn find_id(
        &self,
        _content_type_id: ContentTypeId,
        _language_id: Option<LanguageId>,
        _unique_name: &UniqueName,
    ) -> Result<Option<ContentId>, DomainError> {
        Ok(None)
    }

    async fn find_conflicts(
        &self,
        _content_type_id: ContentTypeId,
        _language_id: Option<LanguageId>,
        _values: &BTreeMap<FieldId, String>,
        _excluding: ContentId,
    ) -> Result<BTreeMap<FieldId, ContentId>, DomainError> {
        Ok(BTreeMap::new())
    }

    async fn find_content_type_ids(
        &self,
        _content_ids: &[ContentId],
    ) -> Result<HashMap<ContentId, ContentTypeId>, DomainError> {
        Ok(HashMap::new())
    }
}
