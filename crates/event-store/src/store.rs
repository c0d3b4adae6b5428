use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{
    AggregateId, ClaimSet, EventEnvelope, EventQuery, EventStoreError, Result, UniqueClaim,
    Version,
};

/// How an append is checked and which claims travel with it.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Version the stream must be at; `None` skips the check.
    pub expected_version: Option<Version>,

    /// Released and recorded in the same transaction as the events.
    pub claims: ClaimSet,
}

impl AppendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
            ..Default::default()
        }
    }

    /// The stream must not exist yet.
    pub fn expect_new() -> Self {
        Self::expect_version(Version::initial())
    }

    pub fn with_claims(mut self, claims: ClaimSet) -> Self {
        self.claims = claims;
        self
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Append-only log of aggregate events with a table of unique claims.
///
/// Appends are atomic: the version check, the claim check, the claim
/// release/record and the event insert either all happen or none do.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends one aggregate's events and returns the stream's new version.
    ///
    /// Fails with `ConcurrencyConflict` when the stream is not at
    /// `options.expected_version`, and with `UniqueConstraintViolation`
    /// when another aggregate owns one of the claims.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// One aggregate's events, oldest first.
    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>>;

    /// Events matching `query`, in append order.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// The whole log in append order. The order is stable, so a position
    /// in this stream identifies an event across calls.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// `None` when the aggregate has no events.
    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;

    async fn claim_owner(&self, claim: &UniqueClaim) -> Result<Option<AggregateId>>;
}

/// Checks that a batch is non-empty, targets a single aggregate and carries
/// consecutive versions.
pub fn validate_events_for_append(events: &[EventEnvelope]) -> Result<()> {
    let invalid = |reason: String| Err(EventStoreError::InvalidAppend(reason));
    let Some(first) = events.first() else {
        return invalid("nothing to append".to_string());
    };

    for (offset, event) in events.iter().enumerate().skip(1) {
        if event.aggregate_id != first.aggregate_id
            || event.aggregate_type != first.aggregate_type
        {
            return invalid(format!(
                "event {} belongs to {} {}, batch started with {} {}",
                event.event_id,
                event.aggregate_type,
                event.aggregate_id,
                first.aggregate_type,
                first.aggregate_id
            ));
        }
        let expected = first.version.after(offset);
        if event.version != expected {
            return invalid(format!(
                "expected version {expected}, got {}",
                event.version
            ));
        }
    }

    Ok(())
}
