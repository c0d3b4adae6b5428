//! Content domain events.
//!
//! Locale events carry an optional language: `None` is the invariant locale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::value_objects::{ContentId, ContentTypeId, LanguageId};

use super::ContentLocale;

/// Events that can occur on a content aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ContentEvent {
    ContentCreated(ContentCreatedData),
    ContentLocaleChanged(ContentLocaleChangedData),
    ContentLocaleRemoved(ContentLocaleRemovedData),
    ContentLocalePublished(ContentLocalePublishedData),
    ContentLocaleUnpublished(ContentLocaleUnpublishedData),
    ContentDeleted(ContentDeletedData),
}

impl DomainEvent for ContentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ContentEvent::ContentCreated(_) => "ContentCreated",
            ContentEvent::ContentLocaleChanged(_) => "ContentLocaleChanged",
            ContentEvent::ContentLocaleRemoved(_) => "ContentLocaleRemoved",
            ContentEvent::ContentLocalePublished(_) => "ContentLocalePublished",
            ContentEvent::ContentLocaleUnpublished(_) => "ContentLocaleUnpublished",
            ContentEvent::ContentDeleted(_) => "ContentDeleted",
        }
    }
}

/// Data for ContentCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCreatedData {
    pub content_id: ContentId,
    pub content_type_id: ContentTypeId,
    pub invariant: ContentLocale,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLocaleChangedData {
    pub language_id: Option<LanguageId>,
    pub locale: ContentLocale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLocaleRemovedData {
    pub language_id: LanguageId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLocalePublishedData {
    pub language_id: Option<LanguageId>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentLocaleUnpublishedData {
    pub language_id: Option<LanguageId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDeletedData {
    pub deleted_at: DateTime<Utc>,
}

// Convenience constructors
impl ContentEvent {
    pub fn created(
        content_id: ContentId,
        content_type_id: ContentTypeId,
        invariant: ContentLocale,
    ) -> Self {
        ContentEvent::ContentCreated(ContentCreatedData {
            content_id,
            content_type_id,
            invariant,
            created_at: Utc::now(),
        })
    }

    pub fn locale_changed(language_id: Option<LanguageId>, locale: ContentLocale) -> Self {
        ContentEvent::ContentLocaleChanged(ContentLocaleChangedData {
            language_id,
            locale,
        })
    }

    pub fn locale_removed(language_id: LanguageId) -> Self {
        ContentEvent::ContentLocaleRemoved(ContentLocaleRemovedData { language_id })
    }

    pub fn locale_published(language_id: Option<LanguageId>) -> Self {
        ContentEvent::ContentLocalePublished(ContentLocalePublishedData {
            language_id,
            published_at: Utc::now(),
        })
    }

    pub fn locale_unpublished(language_id: Option<LanguageId>) -> Self {
        ContentEvent::ContentLocaleUnpublished(ContentLocaleUnpublishedData { language_id })
    }

    pub fn deleted() -> Self {
        ContentEvent::ContentDeleted(ContentDeletedData {
            deleted_at: Utc::now(),
        })
    }

    /// Returns the locale whose value or status must be validated again
    /// when this event is saved.
    pub fn touched_locale(&self) -> Option<Option<LanguageId>> {
        match self {
            ContentEvent::ContentCreated(_) => Some(None),
            ContentEvent::ContentLocaleChanged(data) => Some(data.language_id),
            ContentEvent::ContentLocalePublished(data) => Some(data.language_id),
            ContentEvent::ContentLocaleRemoved(_)
            | ContentEvent::ContentLocaleUnpublished(_)
            | ContentEvent::ContentDeleted(_) => None,
        }
    }
}
