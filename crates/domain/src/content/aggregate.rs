//! Content aggregate implementation.

use std::collections::{BTreeSet, HashMap};

use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::value_objects::{ContentId, ContentTypeId, LanguageId};

use super::{ContentError, ContentEvent, ContentLocale, PublishStatus};

/// Content aggregate root.
///
/// Locale keys are `Option<LanguageId>`: `None` is the invariant locale, which
/// exists from creation on. A status is only tracked while it is published,
/// so a missing entry means [`PublishStatus::NotPublished`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    id: Option<ContentId>,
    version: Version,
    content_type_id: Option<ContentTypeId>,
    invariant: Option<ContentLocale>,
    locales: HashMap<LanguageId, ContentLocale>,
    statuses: HashMap<Option<LanguageId>, PublishStatus>,
    is_deleted: bool,
    changes: Vec<ContentEvent>,
}

impl Aggregate for Content {
    type Event = ContentEvent;

    fn aggregate_type() -> &'static str {
        "Content"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id.map(|id| id.aggregate_id())
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ContentEvent::ContentCreated(data) => {
                self.id = Some(data.content_id);
                self.content_type_id = Some(data.content_type_id);
                self.invariant = Some(data.invariant);
            }
            ContentEvent::ContentLocaleChanged(data) => {
                match data.language_id {
                    None => self.invariant = Some(data.locale),
                    Some(language_id) => {
                        self.locales.insert(language_id, data.locale);
                    }
                }
                self.apply_edit(data.language_id);
            }
            ContentEvent::ContentLocaleRemoved(data) => {
                self.locales.remove(&data.language_id);
                self.statuses.remove(&Some(data.language_id));
            }
            ContentEvent::ContentLocalePublished(data) => {
                self.statuses.insert(data.language_id, PublishStatus::Latest);
            }
            ContentEvent::ContentLocaleUnpublished(data) => {
                self.statuses.remove(&data.language_id);
            }
            ContentEvent::ContentDeleted(_) => self.is_deleted = true,
        }
    }

    fn pending_events(&self) -> &[Self::Event] {
        &self.changes
    }

    fn take_pending_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.changes)
    }
}

// Query methods
impl Content {
    pub fn content_id(&self) -> Result<ContentId, ContentError> {
        self.id.ok_or(ContentError::NotCreated)
    }

    pub fn content_type_id(&self) -> Result<ContentTypeId, ContentError> {
        self.content_type_id.ok_or(ContentError::NotCreated)
    }

    pub fn invariant(&self) -> Result<&ContentLocale, ContentError> {
        self.invariant.as_ref().ok_or(ContentError::NotCreated)
    }

    pub fn locale(&self, language_id: LanguageId) -> Option<&ContentLocale> {
        self.locales.get(&language_id)
    }

    /// Resolves a locale key: `None` is the invariant locale.
    pub fn find_locale(&self, key: Option<LanguageId>) -> Option<&ContentLocale> {
        match key {
            None => self.invariant.as_ref(),
            Some(language_id) => self.locales.get(&language_id),
        }
    }

    /// Returns the languages the content has a locale for, sorted.
    pub fn languages(&self) -> Vec<LanguageId> {
        let mut languages: Vec<_> = self.locales.keys().copied().collect();
        languages.sort();
        languages
    }

    pub fn locales(&self) -> impl Iterator<Item = (LanguageId, &ContentLocale)> {
        self.locales.iter().map(|(id, locale)| (*id, locale))
    }

    pub fn status(&self, key: Option<LanguageId>) -> PublishStatus {
        self.statuses.get(&key).copied().unwrap_or_default()
    }

    pub fn is_published(&self, key: Option<LanguageId>) -> bool {
        self.status(key).is_published()
    }

    /// Returns the locale keys whose value or status changed since the last
    /// save and that still exist, invariant first.
    pub fn touched_locale_keys(&self) -> BTreeSet<Option<LanguageId>> {
        self.changes
            .iter()
            .filter_map(ContentEvent::touched_locale)
            .filter(|key| self.find_locale(*key).is_some())
            .collect()
    }

    /// Returns the languages whose locale was removed since the last save and
    /// that were not added back.
    pub fn removed_languages(&self) -> BTreeSet<LanguageId> {
        self.changes
            .iter()
            .filter_map(|event| match event {
                ContentEvent::ContentLocaleRemoved(data) => Some(data.language_id),
                _ => None,
            })
            .filter(|language_id| !self.locales.contains_key(language_id))
            .collect()
    }
}

// Command methods
impl Content {
    /// Creates a new content with its invariant locale.
    pub fn new(id: ContentId, content_type_id: ContentTypeId, invariant: ContentLocale) -> Self {
        let mut content = Self::default();
        content.raise(ContentEvent::created(id, content_type_id, invariant));
        content
    }

    pub fn set_invariant(&mut self, locale: ContentLocale) -> Result<(), ContentError> {
        self.ensure_active()?;
        if self.invariant.as_ref() != Some(&locale) {
            self.raise(ContentEvent::locale_changed(None, locale));
        }
        Ok(())
    }

    pub fn set_locale(
        &mut self,
        language_id: LanguageId,
        locale: ContentLocale,
    ) -> Result<(), ContentError> {
        self.ensure_active()?;
        if self.locales.get(&language_id) != Some(&locale) {
            self.raise(ContentEvent::locale_changed(Some(language_id), locale));
        }
        Ok(())
    }

    /// Removes a language locale and its status. Returns false if there was none.
    pub fn remove_locale(&mut self, language_id: LanguageId) -> Result<bool, ContentError> {
        self.ensure_active()?;
        if !self.locales.contains_key(&language_id) {
            return Ok(false);
        }
        self.raise(ContentEvent::locale_removed(language_id));
        Ok(true)
    }

    /// Publishes a locale. Publishing the latest version again raises nothing.
    pub fn publish(&mut self, key: Option<LanguageId>) -> Result<(), ContentError> {
        self.ensure_active()?;
        if let Some(language_id) = key
            && !self.locales.contains_key(&language_id)
        {
            return Err(ContentError::LocaleNotFound { language_id });
        }
        if self.status(key).can_publish() {
            self.raise(ContentEvent::locale_published(key));
        }
        Ok(())
    }

    /// Unpublishes a locale. A locale that is not published, or does not
    /// exist, raises nothing.
    pub fn unpublish(&mut self, key: Option<LanguageId>) -> Result<(), ContentError> {
        self.ensure_active()?;
        if self.status(key).can_unpublish() {
            self.raise(ContentEvent::locale_unpublished(key));
        }
        Ok(())
    }

    /// Publishes the invariant and every language locale.
    pub fn publish_all(&mut self) -> Result<(), ContentError> {
        for key in self.all_keys() {
            self.publish(key)?;
        }
        Ok(())
    }

    /// Unpublishes the invariant and every language locale.
    pub fn unpublish_all(&mut self) -> Result<(), ContentError> {
        for key in self.all_keys() {
            self.unpublish(key)?;
        }
        Ok(())
    }

    /// Soft-deletes the content. Deleting twice raises nothing.
    pub fn delete(&mut self) -> Result<(), ContentError> {
        self.content_id()?;
        if !self.is_deleted {
            self.raise(ContentEvent::deleted());
        }
        Ok(())
    }

    fn all_keys(&self) -> Vec<Option<LanguageId>> {
        std::iter::once(None)
            .chain(self.languages().into_iter().map(Some))
            .collect()
    }

    fn ensure_active(&self) -> Result<(), ContentError> {
        self.content_id()?;
        if self.is_deleted {
            return Err(ContentError::Deleted);
        }
        Ok(())
    }

    fn raise(&mut self, event: ContentEvent) {
        self.apply(event.clone());
        self.changes.push(event);
    }
}

// Apply event helpers
impl Content {
    fn apply_edit(&mut self, key: Option<LanguageId>) {
        if let Some(status) = self.statuses.get_mut(&key) {
            *status = status.after_edit();
        }
    }
}
