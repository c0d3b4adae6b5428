//! Feeds the event log to projections.

use event_store::{EventEnvelope, EventStore};
use futures_util::StreamExt;

use crate::Result;
use crate::projection::Projection;

/// Delivers events from an event store to registered projections.
///
/// Catch-up streams the whole log and hands each projection only the events
/// past its position, so it is safe to run after every write.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    pub fn register(&mut self, projection: Box<dyn Projection>) {
        self.projections.push(projection);
    }

    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Brings every projection up to the end of the log.
    ///
    /// Returns the number of deliveries made across all projections.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<u64> {
        let mut positions = Vec::with_capacity(self.projections.len());
        for projection in &self.projections {
            positions.push(projection.position().await.events_processed);
        }

        let mut stream = self.store.stream_all_events().await?;
        let mut index: u64 = 0;
        let mut delivered: u64 = 0;
        while let Some(event) = stream.next().await {
            let event = event?;
            index += 1;
            for (projection, position) in self.projections.iter().zip(&positions) {
                if *position < index {
                    projection.handle(&event).await?;
                    metrics::counter!("projections_events_processed", "projection" => projection.name())
                        .increment(1);
                    delivered += 1;
                }
            }
        }

        if delivered > 0 {
            tracing::debug!(events = index, delivered, "projections caught up");
        }
        Ok(delivered)
    }

    /// Delivers one event to every projection.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<()> {
        for projection in &self.projections {
            projection.handle(event).await?;
            metrics::counter!("projections_events_processed", "projection" => projection.name())
                .increment(1);
        }
        Ok(())
    }

    /// Resets every projection and replays the whole log.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<u64> {
        for projection in &self.projections {
            projection.reset().await?;
            tracing::info!(projection = projection.name(), "projection reset");
        }
        self.run_catch_up().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use common::AggregateId;
    use event_store::{AppendOptions, InMemoryEventStore, Version};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Counts the events it has seen.
    #[derive(Clone, Default)]
    struct Tally {
        position: Arc<RwLock<ProjectionPosition>>,
    }

    impl Tally {
        async fn seen(&self) -> u64 {
            self.position.read().await.events_processed
        }
    }

    #[async_trait]
    impl Projection for Tally {
        fn name(&self) -> &'static str {
            "Tally"
        }

        async fn handle(&self, event: &EventEnvelope) -> Result<()> {
            let mut position = self.position.write().await;
            *position = position.advance(event);
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    async fn store_with(events: i64) -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        if events > 0 {
            let aggregate_id = AggregateId::new();
            let envelopes = (1..=events)
                .map(|version| {
                    EventEnvelope::builder()
                        .aggregate_id(aggregate_id)
                        .aggregate_type("Probe")
                        .event_type("Probed")
                        .version(Version::new(version))
                        .payload_raw(serde_json::json!({ "version": version }))
                        .build()
                        .unwrap()
                })
                .collect();
            store.append(envelopes, AppendOptions::new()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn catch_up_delivers_each_event_once() {
        let store = store_with(3).await;
        let tally = Tally::default();
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(tally.clone()));

        assert_eq!(processor.run_catch_up().await.unwrap(), 3);
        assert_eq!(tally.seen().await, 3);

        assert_eq!(processor.run_catch_up().await.unwrap(), 0);
        assert_eq!(tally.seen().await, 3);
    }

    #[tokio::test]
    async fn late_projection_catches_up_alone() {
        let store = store_with(2).await;
        let early = Tally::default();
        let late = Tally::default();

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(early.clone()));
        processor.run_catch_up().await.unwrap();
        processor.register(Box::new(late.clone()));

        assert_eq!(processor.run_catch_up().await.unwrap(), 2);
        assert_eq!(early.seen().await, 2);
        assert_eq!(late.seen().await, 2);
        assert_eq!(processor.projection_count(), 2);
    }

    #[tokio::test]
    async fn rebuild_replays_from_zero() {
        let store = store_with(2).await;
        let tally = Tally::default();
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(tally.clone()));

        processor.run_catch_up().await.unwrap();
        assert_eq!(processor.rebuild_all().await.unwrap(), 2);
        assert_eq!(tally.seen().await, 2);
    }

    #[tokio::test]
    async fn empty_log_delivers_nothing() {
        let tally = Tally::default();
        let mut processor = ProjectionProcessor::new(store_with(0).await);
        processor.register(Box::new(tally.clone()));

        assert_eq!(processor.run_catch_up().await.unwrap(), 0);
        assert_eq!(tally.position().await, ProjectionPosition::zero());
    }

    #[tokio::test]
    async fn process_event_reaches_every_projection() {
        let first = Tally::default();
        let second = Tally::default();
        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(first.clone()));
        processor.register(Box::new(second.clone()));

        let event = EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type("Probe")
            .event_type("Probed")
            .version(Version::first())
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap();
        processor.process_event(&event).await.unwrap();

        assert_eq!(first.seen().await, 1);
        assert_eq!(second.seen().await, 1);
    }
}
