//! Projection trait and position tracking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_store::EventEnvelope;
use serde::de::DeserializeOwned;

use crate::Result;

/// How far into the event log a projection has read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events handled, including the ones the projection ignored.
    pub events_processed: u64,

    /// Timestamp of the last handled event.
    pub last_event_at: Option<DateTime<Utc>>,
}

impl ProjectionPosition {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns the position after `event`.
    pub fn advance(&self, event: &EventEnvelope) -> Self {
        Self {
            events_processed: self.events_processed + 1,
            last_event_at: Some(event.timestamp),
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// Folds the event log into a read model.
///
/// A projection sees every event of the log, in append order, and must
/// advance its position even for events it ignores.
#[async_trait]
pub trait Projection: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &EventEnvelope) -> Result<()>;

    async fn position(&self) -> ProjectionPosition;

    /// Drops everything the projection holds, back to position zero.
    async fn reset(&self) -> Result<()>;
}

/// Decodes the payload of `event` if it belongs to `aggregate_type`.
pub(crate) fn decode<E: DeserializeOwned>(
    event: &EventEnvelope,
    aggregate_type: &str,
) -> Result<Option<E>> {
    if event.aggregate_type != aggregate_type {
        return Ok(None);
    }
    Ok(Some(event.decode()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use event_store::Version;

    fn envelope(aggregate_type: &str, payload: serde_json::Value) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type(aggregate_type)
            .event_type("Probe")
            .version(Version::first())
            .payload_raw(payload)
            .build()
            .unwrap()
    }

    #[test]
    fn position_advances_with_the_event_timestamp() {
        let event = envelope("Content", serde_json::json!({}));
        let position = ProjectionPosition::zero().advance(&event);
        assert_eq!(position.events_processed, 1);
        assert_eq!(position.last_event_at, Some(event.timestamp));
        assert_eq!(position.advance(&event).to_string(), "position(2)");
    }

    #[test]
    fn decode_skips_other_aggregate_types() {
        let event = envelope("FieldType", serde_json::json!({ "n": 1 }));
        let decoded: Option<serde_json::Value> = decode(&event, "Content").unwrap();
        assert!(decoded.is_none());

        let decoded: Option<serde_json::Value> = decode(&event, "FieldType").unwrap();
        assert_eq!(decoded, Some(serde_json::json!({ "n": 1 })));
    }

    #[test]
    fn decode_reports_malformed_payloads() {
        #[derive(Debug, serde::Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            n: u32,
        }
        let event = envelope("Content", serde_json::json!({ "n": "one" }));
        assert!(decode::<Shape>(&event, "Content").is_err());
    }
}
