//! Contents read model.
//!
//! Keeps every live content with its locales and their publication status,
//! and answers the unique name and unique value lookups of content saves.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Aggregate, Content, ContentEvent, ContentId, ContentLocale, ContentQuerier, ContentTypeId,
    DisplayName, DomainError, FieldId, LanguageId, PublishStatus, UniqueName,
};
use event_store::{EventEnvelope, Version};
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition, decode};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, PartialEq)]
pub struct LocaleSummary {
    pub unique_name: UniqueName,
    pub display_name: Option<DisplayName>,
    pub field_values: BTreeMap<FieldId, String>,
    pub status: PublishStatus,
    pub published_at: Option<DateTime<Utc>>,
}

impl LocaleSummary {
    fn new(locale: ContentLocale) -> Self {
        Self {
            unique_name: locale.unique_name().clone(),
            display_name: locale.display_name().cloned(),
            field_values: locale.field_values().clone(),
            status: PublishStatus::NotPublished,
            published_at: None,
        }
    }

    fn edit(&mut self, locale: ContentLocale) {
        self.unique_name = locale.unique_name().clone();
        self.display_name = locale.display_name().cloned();
        self.field_values = locale.field_values().clone();
        self.status = self.status.after_edit();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentSummary {
    pub content_id: ContentId,
    pub content_type_id: ContentTypeId,
    pub invariant: LocaleSummary,
    pub locales: BTreeMap<LanguageId, LocaleSummary>,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentSummary {
    /// Returns the invariant locale for `None`, a language locale otherwise.
    pub fn locale(&self, key: Option<LanguageId>) -> Option<&LocaleSummary> {
        match key {
            None => Some(&self.invariant),
            Some(language_id) => self.locales.get(&language_id),
        }
    }

    fn locale_mut(&mut self, key: Option<LanguageId>) -> Option<&mut LocaleSummary> {
        match key {
            None => Some(&mut self.invariant),
            Some(language_id) => self.locales.get_mut(&language_id),
        }
    }

    fn apply(&mut self, change: ContentEvent) {
        match change {
            ContentEvent::ContentLocaleChanged(data) => match data.language_id {
                None => self.invariant.edit(data.locale),
                Some(language_id) => match self.locales.get_mut(&language_id) {
                    Some(existing) => existing.edit(data.locale),
                    None => {
                        self.locales
                            .insert(language_id, LocaleSummary::new(data.locale));
                    }
                },
            },
            ContentEvent::ContentLocaleRemoved(data) => {
                self.locales.remove(&data.language_id);
            }
            ContentEvent::ContentLocalePublished(data) => {
                if let Some(locale) = self.locale_mut(data.language_id) {
                    locale.status = PublishStatus::Latest;
                    locale.published_at = Some(data.published_at);
                }
            }
            ContentEvent::ContentLocaleUnpublished(data) => {
                if let Some(locale) = self.locale_mut(data.language_id) {
                    locale.status = PublishStatus::NotPublished;
                    locale.published_at = None;
                }
            }
            ContentEvent::ContentCreated(_) | ContentEvent::ContentDeleted(_) => {}
        }
    }
}

#[derive(Default)]
struct ContentsState {
    contents: HashMap<ContentId, ContentSummary>,
    by_content_type: HashMap<ContentTypeId, BTreeSet<ContentId>>,
    position: ProjectionPosition,
}

impl ContentsState {
    fn of_type(&self, content_type_id: ContentTypeId) -> impl Iterator<Item = &ContentSummary> {
        self.by_content_type
            .get(&content_type_id)
            .into_iter()
            .flatten()
            .filter_map(|content_id| self.contents.get(content_id))
    }

    fn remove(&mut self, content_id: ContentId) {
        if let Some(summary) = self.contents.remove(&content_id)
            && let Some(ids) = self.by_content_type.get_mut(&summary.content_type_id)
        {
            ids.remove(&content_id);
        }
    }
}

/// Live contents of every content type.
#[derive(Clone, Default)]
pub struct ContentsView {
    state: Arc<RwLock<ContentsState>>,
}

impl ContentsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, content_id: ContentId) -> Option<ContentSummary> {
        self.state.read().await.contents.get(&content_id).cloned()
    }

    /// Lists the contents of a content type, oldest first.
    pub async fn list(&self, content_type_id: ContentTypeId) -> Vec<ContentSummary> {
        let state = self.state.read().await;
        let mut contents: Vec<_> = state.of_type(content_type_id).cloned().collect();
        contents.sort_by_key(|summary| (summary.created_at, summary.content_id));
        contents
    }

    /// Lists the contents of a content type whose locale is published.
    pub async fn list_published(
        &self,
        content_type_id: ContentTypeId,
        key: Option<LanguageId>,
    ) -> Vec<ContentSummary> {
        let mut contents = self.list(content_type_id).await;
        contents.retain(|summary| {
            summary
                .locale(key)
                .is_some_and(|locale| locale.status.is_published())
        });
        contents
    }
}

#[async_trait]
impl Projection for ContentsView {
    fn name(&self) -> &'static str {
        "ContentsView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        let change: Option<ContentEvent> = decode(event, Content::aggregate_type())?;
        let content_id = ContentId::from_aggregate_id(event.aggregate_id);

        let mut state = self.state.write().await;
        state.position = state.position.advance(event);
        match change {
            None => {}
            Some(ContentEvent::ContentCreated(data)) => {
                state
                    .by_content_type
                    .entry(data.content_type_id)
                    .or_default()
                    .insert(content_id);
                state.contents.insert(
                    content_id,
                    ContentSummary {
                        content_id: data.content_id,
                        content_type_id: data.content_type_id,
                        invariant: LocaleSummary::new(data.invariant),
                        locales: BTreeMap::new(),
                        version: event.version,
                        created_at: data.created_at,
                        updated_at: event.timestamp,
                    },
                );
            }
            Some(ContentEvent::ContentDeleted(_)) => state.remove(content_id),
            Some(change) => match state.contents.get_mut(&content_id) {
                Some(summary) => {
                    summary.apply(change);
                    summary.version = event.version;
                    summary.updated_at = event.timestamp;
                }
                None => {
                    tracing::warn!(%content_id, event_type = %event.event_type, "event for an unknown content");
                }
            },
        }
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        *self.state.write().await = ContentsState::default();
        Ok(())
    }
}

#[async_trait]
impl ContentQuerier for ContentsView {
    async fn find_id(
        &self,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        unique_name: &UniqueName,
    ) -> std::result::Result<Option<ContentId>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .of_type(content_type_id)
            .find(|summary| {
                summary
                    .locale(language_id)
                    .is_some_and(|locale| locale.unique_name.matches(unique_name))
            })
            .map(|summary| summary.content_id))
    }

    async fn find_conflicts(
        &self,
        content_type_id: ContentTypeId,
        language_id: Option<LanguageId>,
        values: &BTreeMap<FieldId, String>,
        excluding: ContentId,
    ) -> std::result::Result<BTreeMap<FieldId, ContentId>, DomainError> {
        let state = self.state.read().await;
        let mut conflicts = BTreeMap::new();
        for summary in state.of_type(content_type_id) {
            if summary.content_id == excluding {
                continue;
            }
            let Some(locale) = summary.locale(language_id) else {
                continue;
            };
            for (field_id, value) in values {
                if locale.field_values.get(field_id) == Some(value) {
                    conflicts.entry(*field_id).or_insert(summary.content_id);
                }
            }
        }
        Ok(conflicts)
    }

    async fn find_content_type_ids(
        &self,
        content_ids: &[ContentId],
    ) -> std::result::Result<HashMap<ContentId, ContentTypeId>, DomainError> {
        let state = self.state.read().await;
        Ok(content_ids
            .iter()
            .filter_map(|content_id| state.contents.get(content_id))
            .map(|summary| (summary.content_id, summary.content_type_id))
            .collect())
    }
}

impl ReadModel for ContentsView {
    fn name(&self) -> &'static str {
        "ContentsView"
    }

    fn count(&self) -> usize {
        self.state
            .try_read()
            .map(|state| state.contents.len())
            .unwrap_or(0)
    }
}
