//! Host for the content engine.
//!
//! Wires an event store to the aggregate repository, the read models and the
//! managers, and bootstraps configuration, logging and metrics for the
//! `content-engine` binary.
//!
//! Every write goes through a manager and is followed by a read model
//! catch-up, so the advisory uniqueness checks of the next write see it.

pub mod config;
pub mod error;
pub mod telemetry;

use std::sync::Arc;

use domain::{
    Content, ContentManager, ContentType, ContentTypeId, ContentTypeManager,
    ContentTypeRepository, DomainError, EventSourcedRepository, FieldType, FieldTypeManager,
    FieldValueValidatorFactory,
};
use event_store::EventStore;
use projections::{ContentTypesView, ContentsView, FieldTypesView, ProjectionProcessor, ReadModel};

pub use config::{EngineConfig, LogFormat};
pub use error::EngineError;

/// The content engine over an event store.
pub struct Engine<S: EventStore + Clone + 'static> {
    repository: Arc<EventSourcedRepository<S>>,
    processor: ProjectionProcessor<S>,
    field_types_view: FieldTypesView,
    content_types_view: ContentTypesView,
    contents_view: ContentsView,
    field_types: FieldTypeManager,
    content_types: ContentTypeManager,
    contents: ContentManager,
}

impl<S: EventStore + Clone + 'static> Engine<S> {
    /// Builds the engine with empty read models; call [`catch_up`](Self::catch_up)
    /// before serving writes against an existing log.
    pub fn new(store: S) -> Self {
        let repository = Arc::new(EventSourcedRepository::new(store.clone()));

        let field_types_view = FieldTypesView::new();
        let content_types_view = ContentTypesView::new();
        let contents_view = ContentsView::new();

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(field_types_view.clone()));
        processor.register(Box::new(content_types_view.clone()));
        processor.register(Box::new(contents_view.clone()));

        let contents_querier = Arc::new(contents_view.clone());
        Self {
            field_types: FieldTypeManager::new(
                repository.clone(),
                repository.clone(),
                Arc::new(field_types_view.clone()),
            ),
            content_types: ContentTypeManager::new(
                repository.clone(),
                repository.clone(),
                Arc::new(content_types_view.clone()),
            ),
            contents: ContentManager::new(
                repository.clone(),
                repository.clone(),
                contents_querier.clone(),
                FieldValueValidatorFactory::new(contents_querier),
            ),
            repository,
            processor,
            field_types_view,
            content_types_view,
            contents_view,
        }
    }

    /// The repository over the event log; loads are always current.
    pub fn repository(&self) -> &EventSourcedRepository<S> {
        &self.repository
    }

    pub fn field_types_view(&self) -> &FieldTypesView {
        &self.field_types_view
    }

    pub fn content_types_view(&self) -> &ContentTypesView {
        &self.content_types_view
    }

    pub fn contents_view(&self) -> &ContentsView {
        &self.contents_view
    }

    /// Brings the read models up to the end of the log.
    pub async fn catch_up(&self) -> Result<u64, EngineError> {
        Ok(self.processor.run_catch_up().await?)
    }

    /// Publishes the entry count of each read model as a gauge.
    pub fn record_read_model_sizes(&self) {
        let read_models: [&dyn ReadModel; 3] = [
            &self.field_types_view,
            &self.content_types_view,
            &self.contents_view,
        ];
        for read_model in read_models {
            metrics::gauge!("read_model_entries", "read_model" => read_model.name())
                .set(read_model.count() as f64);
        }
    }

    /// Clears the read models and replays the whole log.
    pub async fn rebuild(&self) -> Result<u64, EngineError> {
        tracing::info!("rebuilding read models");
        Ok(self.processor.rebuild_all().await?)
    }

    pub async fn save_field_type(&self, field_type: &mut FieldType) -> Result<(), EngineError> {
        self.field_types.save(field_type).await?;
        self.catch_up().await?;
        Ok(())
    }

    /// Deletes a field type and strips it from every content type using it.
    pub async fn delete_field_type(&self, field_type: &mut FieldType) -> Result<(), EngineError> {
        self.field_types.delete(field_type).await?;
        self.catch_up().await?;
        Ok(())
    }

    pub async fn save_content_type(
        &self,
        content_type: &mut ContentType,
    ) -> Result<(), EngineError> {
        self.content_types.save(content_type).await?;
        self.catch_up().await?;
        Ok(())
    }

    pub async fn delete_content_type(
        &self,
        content_type: &mut ContentType,
    ) -> Result<(), EngineError> {
        self.content_types.delete(content_type).await?;
        self.catch_up().await?;
        Ok(())
    }

    /// Loads a live content type from the log.
    pub async fn content_type(
        &self,
        content_type_id: ContentTypeId,
    ) -> Result<ContentType, EngineError> {
        ContentTypeRepository::load(&*self.repository, content_type_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ContentType", content_type_id).into())
    }

    /// Saves a content against the current version of its content type.
    pub async fn save_content(&self, content: &mut Content) -> Result<(), EngineError> {
        let content_type_id = content.content_type_id().map_err(DomainError::from)?;
        let content_type = self.content_type(content_type_id).await?;
        self.contents.save(content, &content_type).await?;
        self.catch_up().await?;
        Ok(())
    }
}
