//! Aggregate repositories.
//!
//! Repositories rebuild aggregates by folding their event history and persist
//! pending events with optimistic concurrency. Soft-deleted aggregates are
//! invisible to every load except [`load_at_version`](ContentRepository::load_at_version),
//! which serves historical reads.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{AggregateId, RealmId};
use event_store::{AppendOptions, ClaimSet, EventEnvelope, EventQuery, EventStore, Version};
use futures_util::future::try_join_all;

use crate::aggregate::{Aggregate, DomainEvent, load_from_history};
use crate::content::Content;
use crate::content_type::ContentType;
use crate::error::DomainError;
use crate::field_type::FieldType;
use crate::value_objects::{ContentId, ContentTypeId, FieldTypeId};

#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn load(&self, id: ContentId) -> Result<Option<Content>, DomainError>;

    async fn load_at_version(
        &self,
        id: ContentId,
        version: Version,
    ) -> Result<Option<Content>, DomainError>;

    /// Loads existing contents, in the order of `ids`. Unknown ids are skipped.
    async fn load_many(&self, ids: &[ContentId]) -> Result<Vec<Content>, DomainError>;

    async fn load_in_realm(&self, realm_id: Option<RealmId>) -> Result<Vec<Content>, DomainError>;

    /// Appends the pending events together with the claim changes.
    async fn save(&self, content: &mut Content, claims: ClaimSet) -> Result<(), DomainError>;
}

#[async_trait]
pub trait ContentTypeRepository: Send + Sync {
    async fn load(&self, id: ContentTypeId) -> Result<Option<ContentType>, DomainError>;

    async fn load_at_version(
        &self,
        id: ContentTypeId,
        version: Version,
    ) -> Result<Option<ContentType>, DomainError>;

    async fn load_many(&self, ids: &[ContentTypeId]) -> Result<Vec<ContentType>, DomainError>;

    async fn load_in_realm(
        &self,
        realm_id: Option<RealmId>,
    ) -> Result<Vec<ContentType>, DomainError>;

    async fn save(
        &self,
        content_type: &mut ContentType,
        claims: ClaimSet,
    ) -> Result<(), DomainError>;

    /// Saves each content type in turn, leaving their claims untouched.
    ///
    /// Stops at the first failure; content types saved before it stay saved.
    async fn save_all(&self, content_types: &mut [ContentType]) -> Result<(), DomainError>;
}

#[async_trait]
pub trait FieldTypeRepository: Send + Sync {
    async fn load(&self, id: FieldTypeId) -> Result<Option<FieldType>, DomainError>;

    async fn load_at_version(
        &self,
        id: FieldTypeId,
        version: Version,
    ) -> Result<Option<FieldType>, DomainError>;

    async fn load_many(&self, ids: &[FieldTypeId]) -> Result<Vec<FieldType>, DomainError>;

    async fn load_in_realm(&self, realm_id: Option<RealmId>)
    -> Result<Vec<FieldType>, DomainError>;

    async fn save(&self, field_type: &mut FieldType, claims: ClaimSet) -> Result<(), DomainError>;

    /// Saves each field type in turn, leaving their claims untouched.
    async fn save_all(&self, field_types: &mut [FieldType]) -> Result<(), DomainError>;
}

/// Repository over an [`EventStore`], implementing every aggregate repository.
pub struct EventSourcedRepository<S: EventStore> {
    store: S,
}

impl<S: EventStore> EventSourcedRepository<S> {
    /// Creates a new repository with the given event store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Folds the history of one aggregate, up to a version when given.
    async fn fold<A: Aggregate>(
        &self,
        id: AggregateId,
        up_to: Option<Version>,
    ) -> Result<Option<A>, DomainError> {
        let events = match up_to {
            None => self.store.get_events_for_aggregate(id).await?,
            Some(version) => {
                let query = EventQuery::for_aggregate(id).to_version(version);
                self.store.query_events(query).await?
            }
        };
        Ok(load_from_history(events)?)
    }

    async fn load_active<A: Aggregate>(&self, id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate: Option<A> = self.fold(id, None).await?;
        Ok(aggregate.filter(|aggregate| !aggregate.is_deleted()))
    }

    async fn load_many_active<A: Aggregate>(
        &self,
        ids: impl IntoIterator<Item = AggregateId>,
    ) -> Result<Vec<A>, DomainError> {
        let loads = ids.into_iter().map(|id| self.load_active::<A>(id));
        let aggregates = try_join_all(loads).await?;
        Ok(aggregates.into_iter().flatten().collect())
    }

    /// Folds every aggregate of a type in a realm, in creation order.
    async fn load_realm<A: Aggregate>(
        &self,
        realm_id: Option<RealmId>,
    ) -> Result<Vec<A>, DomainError> {
        let query = EventQuery::in_realm(A::aggregate_type(), realm_id);
        let events = self.store.query_events(query).await?;

        let mut order = Vec::new();
        let mut histories: HashMap<AggregateId, Vec<EventEnvelope>> = HashMap::new();
        for envelope in events {
            let history = histories.entry(envelope.aggregate_id).or_insert_with(|| {
                order.push(envelope.aggregate_id);
                Vec::new()
            });
            history.push(envelope);
        }

        let mut aggregates = Vec::with_capacity(order.len());
        for id in order {
            let mut history = histories.remove(&id).unwrap_or_default();
            history.sort_by_key(|envelope| envelope.version);
            if let Some(aggregate) = load_from_history::<A>(history)?
                && !aggregate.is_deleted()
            {
                aggregates.push(aggregate);
            }
        }
        Ok(aggregates)
    }

    /// Appends the pending events of an aggregate.
    ///
    /// On success the pending events are cleared and the version moves to the
    /// last appended one. On failure the aggregate is left untouched so the
    /// save can be retried.
    async fn persist<A: Aggregate>(
        &self,
        aggregate: &mut A,
        claims: ClaimSet,
    ) -> Result<(), DomainError> {
        if !aggregate.has_changes() {
            return Ok(());
        }
        let aggregate_id = aggregate.id().ok_or_else(|| {
            DomainError::InvalidState(format!(
                "{} has pending events but no id",
                A::aggregate_type()
            ))
        })?;

        let envelopes = build_envelopes::<A>(
            aggregate_id,
            aggregate.version(),
            aggregate.pending_events(),
        )?;
        let count = envelopes.len();
        let options = AppendOptions::expect_version(aggregate.version()).with_claims(claims);

        let new_version = self.store.append(envelopes, options).await?;
        aggregate.take_pending_events();
        aggregate.set_version(new_version);

        tracing::debug!(
            aggregate_type = A::aggregate_type(),
            %aggregate_id,
            events = count,
            version = new_version.as_i64(),
            "aggregate saved"
        );
        Ok(())
    }
}

/// Builds event envelopes numbered after the current version.
fn build_envelopes<A: Aggregate>(
    aggregate_id: AggregateId,
    current_version: Version,
    events: &[A::Event],
) -> Result<Vec<EventEnvelope>, DomainError> {
    let mut envelopes = Vec::with_capacity(events.len());

    for (i, event) in events.iter().enumerate() {
        let version = current_version.after(i + 1);
        let envelope = EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type(A::aggregate_type())
            .event_type(event.event_type())
            .version(version)
            .payload(event)?
            .build()?;
        envelopes.push(envelope);
    }

    Ok(envelopes)
}

#[async_trait]
impl<S: EventStore> ContentRepository for EventSourcedRepository<S> {
    #[tracing::instrument(skip(self))]
    async fn load(&self, id: ContentId) -> Result<Option<Content>, DomainError> {
        self.load_active(id.aggregate_id()).await
    }

    async fn load_at_version(
        &self,
        id: ContentId,
        version: Version,
    ) -> Result<Option<Content>, DomainError> {
        self.fold(id.aggregate_id(), Some(version)).await
    }

    async fn load_many(&self, ids: &[ContentId]) -> Result<Vec<Content>, DomainError> {
        self.load_many_active(ids.iter().map(ContentId::aggregate_id))
            .await
    }

    async fn load_in_realm(&self, realm_id: Option<RealmId>) -> Result<Vec<Content>, DomainError> {
        self.load_realm(realm_id).await
    }

    #[tracing::instrument(skip(self, content, claims), fields(content_id = ?content.id()))]
    async fn save(&self, content: &mut Content, claims: ClaimSet) -> Result<(), DomainError> {
        self.persist(content, claims).await
    }
}

#[async_trait]
impl<S: EventStore> ContentTypeRepository for EventSourcedRepository<S> {
    #[tracing::instrument(skip(self))]
    async fn load(&self, id: ContentTypeId) -> Result<Option<ContentType>, DomainError> {
        self.load_active(id.aggregate_id()).await
    }

    async fn load_at_version(
        &self,
        id: ContentTypeId,
        version: Version,
    ) -> Result<Option<ContentType>, DomainError> {
        self.fold(id.aggregate_id(), Some(version)).await
    }

    async fn load_many(&self, ids: &[ContentTypeId]) -> Result<Vec<ContentType>, DomainError> {
        self.load_many_active(ids.iter().map(ContentTypeId::aggregate_id))
            .await
    }

    async fn load_in_realm(
        &self,
        realm_id: Option<RealmId>,
    ) -> Result<Vec<ContentType>, DomainError> {
        self.load_realm(realm_id).await
    }

    #[tracing::instrument(skip(self, content_type, claims), fields(content_type_id = ?content_type.id()))]
    async fn save(
        &self,
        content_type: &mut ContentType,
        claims: ClaimSet,
    ) -> Result<(), DomainError> {
        self.persist(content_type, claims).await
    }

    async fn save_all(&self, content_types: &mut [ContentType]) -> Result<(), DomainError> {
        for content_type in content_types.iter_mut() {
            self.persist(content_type, ClaimSet::none()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: EventStore> FieldTypeRepository for EventSourcedRepository<S> {
    #[tracing::instrument(skip(self))]
    async fn load(&self, id: FieldTypeId) -> Result<Option<FieldType>, DomainError> {
        self.load_active(id.aggregate_id()).await
    }

    async fn load_at_version(
        &self,
        id: FieldTypeId,
        version: Version,
    ) -> Result<Option<FieldType>, DomainError> {
        self.fold(id.aggregate_id(), Some(version)).await
    }

    async fn load_many(&self, ids: &[FieldTypeId]) -> Result<Vec<FieldType>, DomainError> {
        self.load_many_active(ids.iter().map(FieldTypeId::aggregate_id))
            .await
    }

    async fn load_in_realm(
        &self,
        realm_id: Option<RealmId>,
    ) -> Result<Vec<FieldType>, DomainError> {
        self.load_realm(realm_id).await
    }

    #[tracing::instrument(skip(self, field_type, claims), fields(field_type_id = ?field_type.id()))]
    async fn save(&self, field_type: &mut FieldType, claims: ClaimSet) -> Result<(), DomainError> {
        self.persist(field_type, claims).await
    }

    async fn save_all(&self, field_types: &mut [FieldType]) -> Result<(), DomainError> {
        for field_type in field_types.iter_mut() {
            self.persist(field_type, ClaimSet::none()).await?;
        }
        Ok(())
    }
}
