//! Event log helpers for view tests.

use domain::{
    Content, ContentRepository, ContentType, ContentTypeRepository, EventSourcedRepository,
    FieldType, FieldTypeRepository,
};
use event_store::{ClaimSet, InMemoryEventStore};

use crate::{Projection, ProjectionProcessor};

/// An in-memory event log written through the domain repositories.
pub(crate) struct Log {
    store: InMemoryEventStore,
    repository: EventSourcedRepository<InMemoryEventStore>,
}

impl Log {
    pub fn new() -> Self {
        let store = InMemoryEventStore::new();
        Self {
            repository: EventSourcedRepository::new(store.clone()),
            store,
        }
    }

    pub async fn field_type(&self, field_type: &mut FieldType) {
        FieldTypeRepository::save(&self.repository, field_type, ClaimSet::none())
            .await
            .unwrap();
    }

    pub async fn content_type(&self, content_type: &mut ContentType) {
        ContentTypeRepository::save(&self.repository, content_type, ClaimSet::none())
            .await
            .unwrap();
    }

    pub async fn content(&self, content: &mut Content) {
        ContentRepository::save(&self.repository, content, ClaimSet::none())
            .await
            .unwrap();
    }

    /// Feeds the events the view has not seen yet.
    pub async fn project(&self, view: impl Projection + 'static) {
        let mut processor = ProjectionProcessor::new(self.store.clone());
        processor.register(Box::new(view));
        processor.run_catch_up().await.unwrap();
    }
}
