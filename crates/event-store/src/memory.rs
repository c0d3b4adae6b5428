use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::RwLock;

use crate::{
    AggregateId, ClaimSet, EventEnvelope, EventQuery, EventStoreError, Result, UniqueClaim,
    Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// The log plus the claim table, guarded by one lock so that an append
/// checks and writes both without interleaving.
#[derive(Default)]
struct Log {
    events: Vec<EventEnvelope>,
    claims: HashMap<UniqueClaim, AggregateId>,
}

impl Log {
    fn stream_of(&self, aggregate_id: AggregateId) -> impl Iterator<Item = &EventEnvelope> {
        self.events
            .iter()
            .filter(move |e| e.aggregate_id == aggregate_id)
    }

    fn version_of(&self, aggregate_id: AggregateId) -> Option<Version> {
        self.stream_of(aggregate_id).map(|e| e.version).max()
    }

    /// First claim in `set` already owned by an aggregate other than `owner`.
    fn conflicting_claim<'a>(
        &self,
        owner: AggregateId,
        set: &'a ClaimSet,
    ) -> Option<(&'a UniqueClaim, AggregateId)> {
        set.claims.iter().find_map(|claim| {
            self.claims
                .get(claim)
                .filter(|holder| **holder != owner)
                .map(|holder| (claim, *holder))
        })
    }

    fn apply_claims(&mut self, owner: AggregateId, set: ClaimSet) {
        let released = set.released_scopes;
        self.claims
            .retain(|claim, holder| *holder != owner || !released.contains(&claim.scope));
        self.claims
            .extend(set.claims.into_iter().map(|claim| (claim, owner)));
    }
}

/// Event store kept entirely in process memory.
///
/// Behaves like [`PostgresEventStore`](crate::PostgresEventStore) for
/// versions and claims; used by tests, benches and embedded engines.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    log: Arc<RwLock<Log>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events in the log.
    pub async fn event_count(&self) -> usize {
        self.log.read().await.events.len()
    }

    /// Claims currently held by `owner`, sorted.
    pub async fn claims_of(&self, owner: AggregateId) -> Vec<UniqueClaim> {
        let log = self.log.read().await;
        let mut claims: Vec<_> = log
            .claims
            .iter()
            .filter_map(|(claim, holder)| (*holder == owner).then(|| claim.clone()))
            .collect();
        claims.sort();
        claims
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let first_version = events[0].version;
        let mut log = self.log.write().await;
        let current = log.version_of(aggregate_id).unwrap_or_default();

        let stale = options.expected_version.is_some_and(|v| v != current);
        if stale || first_version <= current {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        if let Some((claim, owner)) = log.conflicting_claim(aggregate_id, &options.claims) {
            tracing::debug!(%aggregate_id, %owner, scope = %claim.scope, key = %claim.key, "unique claim rejected");
            return Err(EventStoreError::UniqueConstraintViolation {
                scope: claim.scope.clone(),
                key: claim.key.clone(),
                value: claim.value.clone(),
                owner,
            });
        }

        log.apply_claims(aggregate_id, options.claims);
        let last_version = events.last().map_or(current, |e| e.version);
        metrics::counter!("event_store_appends_total", "backend" => "memory")
            .increment(events.len() as u64);
        log.events.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let log = self.log.read().await;
        let mut events: Vec<_> = log.stream_of(aggregate_id).cloned().collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let matches = |e: &EventEnvelope| {
            query.aggregate_id.is_none_or(|id| e.aggregate_id == id)
                && query
                    .aggregate_type
                    .as_ref()
                    .is_none_or(|t| &e.aggregate_type == t)
                && query.realm.is_none_or(|realm| realm.matches(e.realm_id()))
                && query
                    .event_types
                    .as_ref()
                    .is_none_or(|types| types.contains(&e.event_type))
                && query.includes_version(e.version)
        };

        let log = self.log.read().await;
        Ok(log.events.iter().filter(|e| matches(*e)).cloned().collect())
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        let snapshot = self.log.read().await.events.clone();
        Ok(Box::pin(stream::iter(snapshot.into_iter().map(Ok))))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        Ok(self.log.read().await.version_of(aggregate_id))
    }

    async fn claim_owner(&self, claim: &UniqueClaim) -> Result<Option<AggregateId>> {
        Ok(self.log.read().await.claims.get(claim).copied())
    }
}
