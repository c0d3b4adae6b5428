//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::{EventEnvelope, Version};
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    ///
    /// This is used for serialization and event store filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// Mutation methods on an aggregate validate their input, then *raise* an
/// event: the event is applied to the in-memory state right away and kept as
/// pending until a repository persists it. State is therefore always a pure
/// fold over the aggregate's history.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate type name.
    ///
    /// Used for event store organization and routing.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the version of the last persisted event.
    ///
    /// Version starts at 0 for a new aggregate and does not move while
    /// events are pending.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by repositories after loading or persisting events.
    fn set_version(&mut self, version: Version);

    /// Returns true once the aggregate has been soft-deleted.
    fn is_deleted(&self) -> bool;

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state and event, it must always produce the same new state
    /// - It must not have side effects
    /// - It must not fail (events represent facts that have happened)
    fn apply(&mut self, event: Self::Event);

    /// Returns the events raised since the aggregate was loaded or last saved.
    fn pending_events(&self) -> &[Self::Event];

    /// Removes and returns the pending events.
    fn take_pending_events(&mut self) -> Vec<Self::Event>;

    /// Returns true if there are events waiting to be persisted.
    fn has_changes(&self) -> bool {
        !self.pending_events().is_empty()
    }

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

/// Rebuilds an aggregate by folding stored envelopes over its default state.
///
/// Returns `None` when there is no history.
pub fn load_from_history<A: Aggregate>(
    envelopes: impl IntoIterator<Item = EventEnvelope>,
) -> Result<Option<A>, serde_json::Error> {
    let mut aggregate = A::default();
    let mut loaded = false;

    for envelope in envelopes {
        let event: A::Event = envelope.decode()?;
        aggregate.apply(event);
        aggregate.set_version(envelope.version);
        loaded = true;
    }

    Ok(loaded.then_some(aggregate))
}
