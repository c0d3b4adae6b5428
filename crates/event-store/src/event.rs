use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AggregateId, EventStoreError, RealmId, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an event in its aggregate's stream.
///
/// A stream with no events is at version 0; its first event is version 1.
/// Appends name the version they expect to find, which is how concurrent
/// writers of the same aggregate are detected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The version of an aggregate that has no events yet.
    pub fn initial() -> Self {
        Self(0)
    }

    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// The version reached after appending `count` events.
    pub fn after(&self, count: usize) -> Self {
        Self(self.0 + count as i64)
    }

    pub fn is_initial(&self) -> bool {
        self.0 == 0
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored event: the serialized domain event plus where it belongs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Name of the domain event, e.g. `ContentLocalePublished`.
    pub event_type: String,

    /// Stream the event belongs to; carries the realm of the aggregate.
    pub aggregate_id: AggregateId,

    /// `Content`, `ContentType` or `FieldType`.
    pub aggregate_type: String,

    /// Version of the aggregate once this event is applied.
    pub version: Version,

    pub timestamp: DateTime<Utc>,

    /// Domain events serialize as `{"type": ..., "data": ...}`.
    pub payload: serde_json::Value,

    pub metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelope {
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }

    /// Realm of the aggregate the event belongs to; `None` for global aggregates.
    pub fn realm_id(&self) -> Option<RealmId> {
        self.aggregate_id.realm_id()
    }

    /// Deserializes the payload into a domain event.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.payload)
    }
}

/// Builder for [`EventEnvelope`].
///
/// `event_id` and `timestamp` default to a fresh id and the current time;
/// the other fields must be set before [`build`](Self::build).
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    version: Option<Version>,
    timestamp: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelopeBuilder {
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Serializes `payload` as the event body.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Fails with [`EventStoreError::IncompleteEnvelope`] naming the first
    /// missing field.
    pub fn build(self) -> Result<EventEnvelope> {
        let missing = EventStoreError::IncompleteEnvelope;
        Ok(EventEnvelope {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self.event_type.ok_or(missing("event_type"))?,
            aggregate_id: self.aggregate_id.ok_or(missing("aggregate_id"))?,
            aggregate_type: self.aggregate_type.ok_or(missing("aggregate_type"))?,
            version: self.version.ok_or(missing("version"))?,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            payload: self.payload.ok_or(missing("payload"))?,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Renamed {
        unique_name: String,
    }

    fn renamed(aggregate_id: AggregateId) -> EventEnvelope {
        EventEnvelope::builder()
            .event_type("Renamed")
            .aggregate_id(aggregate_id)
            .aggregate_type("FieldType")
            .version(Version::first())
            .payload(&Renamed {
                unique_name: "Slug".to_string(),
            })
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn versions_count_appended_events() {
        assert!(Version::initial().is_initial());
        assert_eq!(Version::initial().next(), Version::first());
        assert_eq!(Version::first().after(3), Version::new(4));
        assert_eq!(Version::new(4).after(0), Version::new(4));
        assert!(Version::first() < Version::new(2));
    }

    #[test]
    fn envelopes_carry_the_realm_of_their_stream() {
        let realm = RealmId::new();
        assert_eq!(renamed(AggregateId::in_realm(Some(realm))).realm_id(), Some(realm));
        assert_eq!(renamed(AggregateId::new()).realm_id(), None);
    }

    #[test]
    fn payload_round_trips_through_decode() {
        let envelope = renamed(AggregateId::new());

        assert_eq!(envelope.payload["unique_name"], "Slug");
        assert_eq!(
            envelope.decode::<Renamed>().unwrap(),
            Renamed {
                unique_name: "Slug".to_string()
            }
        );
        assert!(envelope.decode::<Version>().is_err());
        assert!(envelope.metadata.is_empty());
    }

    #[test]
    fn metadata_and_raw_payloads_are_kept() {
        let envelope = EventEnvelope::builder()
            .event_type("TestEvent")
            .aggregate_id(AggregateId::new())
            .aggregate_type("Content")
            .version(Version::new(7))
            .payload_raw(serde_json::json!({"type": "ContentDeleted"}))
            .metadata("correlation_id", serde_json::json!("123"))
            .build()
            .unwrap();

        assert_eq!(envelope.version, Version::new(7));
        assert_eq!(
            envelope.metadata.get("correlation_id"),
            Some(&serde_json::json!("123"))
        );
    }

    #[test]
    fn build_names_the_first_missing_field() {
        let result = EventEnvelope::builder().event_type("TestEvent").build();
        assert!(matches!(
            result,
            Err(EventStoreError::IncompleteEnvelope("aggregate_id"))
        ));
        assert!(matches!(
            EventEnvelope::builder().build(),
            Err(EventStoreError::IncompleteEnvelope("event_type"))
        ));
    }
}
