//! End-to-end scenarios for the content engine over an in-memory event store.
//!
//! Each test drives the engine facade: managers persist through the event
//! store and the read models catch up after every write.

use domain::field_type::{NumberProperties, StringProperties};
use domain::validation::codes;
use domain::{
    Aggregate, ConflictError, Content, ContentEvent, ContentId, ContentLocale, ContentRepository,
    ContentType, ContentTypeId, DisplayName, DomainError, FieldDefinition, FieldId, FieldType,
    FieldTypeId, FieldTypeProperties, LanguageId, PublishStatus, UniqueName,
};
use engine::{Engine, EngineError};
use event_store::{EventQuery, EventStore, InMemoryEventStore, Version};

fn name(value: &str) -> UniqueName {
    UniqueName::new(value).unwrap()
}

fn domain_error(error: EngineError) -> DomainError {
    match error {
        EngineError::Domain(error) => error,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

/// The `BlogArticle` content type: variant, with a required unique invariant
/// `Slug` backed by a 1..=100 character string field type.
struct Blog {
    engine: Engine<InMemoryEventStore>,
    slug_text: FieldType,
    article: ContentType,
    slug: FieldId,
}

impl Blog {
    async fn new() -> Self {
        let engine = Engine::new(InMemoryEventStore::new());

        let mut slug_text = FieldType::new(
            FieldTypeId::new(None),
            name("SlugText"),
            FieldTypeProperties::String(StringProperties {
                min_length: Some(1),
                max_length: Some(100),
                pattern: None,
            }),
        )
        .unwrap();
        engine.save_field_type(&mut slug_text).await.unwrap();

        let mut article = ContentType::new(ContentTypeId::new(None), name("BlogArticle"), false);
        let slug = FieldDefinition::new(
            FieldId::new(),
            slug_text.field_type_id().unwrap(),
            name("Slug"),
        )
        .invariant(true)
        .required(true)
        .unique(true);
        article.set_field(slug.clone()).unwrap();
        engine.save_content_type(&mut article).await.unwrap();

        Self {
            engine,
            slug_text,
            article,
            slug: slug.id,
        }
    }

    fn post(&self, unique_name: &str, slug: &str) -> Content {
        Content::new(
            ContentId::new(None),
            self.article.content_type_id().unwrap(),
            ContentLocale::new(name(unique_name)).with_field_value(self.slug, slug),
        )
    }

    /// Scenario 1: content A with slug `my-post`.
    async fn post_one(&self) -> Content {
        let mut content = self.post("post-1", "my-post");
        self.engine.save_content(&mut content).await.unwrap();
        content
    }

    async fn reload(&self, content: &Content) -> Content {
        ContentRepository::load(self.engine.repository(), content.content_id().unwrap())
            .await
            .unwrap()
            .unwrap()
    }
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn a_valid_content_is_saved() {
        let blog = Blog::new().await;
        let a = blog.post_one().await;

        assert!(!a.has_changes());
        let summary = blog
            .engine
            .contents_view()
            .get(a.content_id().unwrap())
            .await
            .unwrap();
        assert_eq!(summary.invariant.unique_name.as_str(), "post-1");
        assert_eq!(summary.invariant.field_values.get(&blog.slug).unwrap(), "my-post");
    }

    #[tokio::test]
    async fn a_duplicate_slug_conflicts_with_the_first_content() {
        let blog = Blog::new().await;
        let a = blog.post_one().await;

        let mut b = blog.post("post-2", "my-post");
        let error = domain_error(blog.engine.save_content(&mut b).await.unwrap_err());

        match error {
            DomainError::Conflict(ConflictError::ContentFieldValueConflict {
                content_id,
                language_id,
                conflicts,
                ..
            }) => {
                assert_eq!(content_id, b.content_id().unwrap());
                assert_eq!(language_id, None);
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[&blog.slug], a.content_id().unwrap());
            }
            other => panic!("expected a field value conflict, got {other:?}"),
        }
        assert!(b.has_changes());
    }

    #[tokio::test]
    async fn editing_a_published_locale_makes_it_stale_until_republished() {
        let blog = Blog::new().await;
        let mut a = blog.post_one().await;

        a.publish(None).unwrap();
        blog.engine.save_content(&mut a).await.unwrap();
        assert_eq!(a.status(None), PublishStatus::Latest);

        let renamed = a
            .invariant()
            .unwrap()
            .clone()
            .with_display_name(Some(DisplayName::new("My first post").unwrap()));
        a.set_invariant(renamed).unwrap();
        blog.engine.save_content(&mut a).await.unwrap();
        assert_eq!(a.status(None), PublishStatus::Published);

        a.publish(None).unwrap();
        blog.engine.save_content(&mut a).await.unwrap();
        assert_eq!(a.status(None), PublishStatus::Latest);

        let summary = blog
            .engine
            .contents_view()
            .get(a.content_id().unwrap())
            .await
            .unwrap();
        assert_eq!(summary.invariant.status, PublishStatus::Latest);
        assert_eq!(blog.reload(&a).await.status(None), PublishStatus::Latest);
    }

    #[tokio::test]
    async fn a_published_content_cannot_lose_a_required_value() {
        let blog = Blog::new().await;
        let mut a = blog.post_one().await;
        a.publish(None).unwrap();
        blog.engine.save_content(&mut a).await.unwrap();

        let without_slug = a.invariant().unwrap().clone().without_field_value(blog.slug);
        a.set_invariant(without_slug).unwrap();
        let error = domain_error(blog.engine.save_content(&mut a).await.unwrap_err());

        let validation = error.as_validation().unwrap();
        let required: Vec<_> = validation.with_code(codes::REQUIRED_FIELD).collect();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].field_id, Some(blog.slug));

        let stored = blog.reload(&a).await;
        assert_eq!(stored.invariant().unwrap().field_value(blog.slug), Some("my-post"));
    }

    #[tokio::test]
    async fn deleting_a_field_type_strips_its_definitions() {
        let mut blog = Blog::new().await;
        let slug_text_id = blog.slug_text.field_type_id().unwrap();

        blog.engine
            .delete_field_type(&mut blog.slug_text)
            .await
            .unwrap();

        let article = blog
            .engine
            .content_type(blog.article.content_type_id().unwrap())
            .await
            .unwrap();
        assert_eq!(article.fields_of_type(slug_text_id).count(), 0);
        assert!(article.fields().is_empty());

        let summary = blog
            .engine
            .content_types_view()
            .get(blog.article.content_type_id().unwrap())
            .await
            .unwrap();
        assert!(summary.fields.is_empty());
        assert!(blog.engine.field_types_view().get(slug_text_id).await.is_none());
        assert!(
            blog.engine
                .content_types_view()
                .using_field_type(slug_text_id)
                .await
                .is_empty()
        );
    }
}

mod properties {
    use super::*;

    async fn event_count(blog: &Blog, content: &Content) -> usize {
        blog.engine
            .repository()
            .store()
            .get_events_for_aggregate(content.content_id().unwrap().aggregate_id())
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn publish_and_unpublish_are_idempotent() {
        let blog = Blog::new().await;
        let mut a = blog.post_one().await;

        a.publish(None).unwrap();
        a.publish(None).unwrap();
        assert_eq!(a.pending_events().len(), 1);
        blog.engine.save_content(&mut a).await.unwrap();
        assert_eq!(event_count(&blog, &a).await, 2);

        a.unpublish(None).unwrap();
        blog.engine.save_content(&mut a).await.unwrap();
        a.unpublish(None).unwrap();
        assert!(!a.has_changes());
        assert_eq!(event_count(&blog, &a).await, 3);
    }

    #[tokio::test]
    async fn variant_edits_never_revalidate_invariant_values() {
        let mut blog = Blog::new().await;
        let mut a = blog.post_one().await;

        // Tighten the slug type so the stored invariant value no longer fits.
        blog.slug_text
            .set_properties(FieldTypeProperties::String(StringProperties {
                min_length: Some(1),
                max_length: Some(3),
                pattern: None,
            }))
            .unwrap();
        blog.engine
            .save_field_type(&mut blog.slug_text)
            .await
            .unwrap();

        let english = LanguageId::new();
        a.set_locale(english, ContentLocale::new(name("post-1")))
            .unwrap();
        blog.engine.save_content(&mut a).await.unwrap();

        // Touching the invariant locale itself does run its validators.
        let retouched = a
            .invariant()
            .unwrap()
            .clone()
            .with_field_value(blog.slug, "my-post-2");
        a.set_invariant(retouched).unwrap();
        let error = domain_error(blog.engine.save_content(&mut a).await.unwrap_err());
        assert!(error.as_validation().unwrap().has_code(codes::MAXIMUM_LENGTH));
    }

    #[tokio::test]
    async fn a_unique_value_is_held_by_one_content_at_a_time() {
        let blog = Blog::new().await;
        let a = blog.post_one().await;

        // Reusing the slug after `a` is deleted is fine; reusing it before is not.
        let mut b = blog.post("post-2", "my-post");
        assert!(blog.engine.save_content(&mut b).await.is_err());

        let mut a = blog.reload(&a).await;
        a.delete().unwrap();
        blog.engine.save_content(&mut a).await.unwrap();
        blog.engine.save_content(&mut b).await.unwrap();
        assert_eq!(
            blog.engine
                .contents_view()
                .list(blog.article.content_type_id().unwrap())
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn invariant_content_types_only_accept_invariant_fields() {
        let number = FieldTypeId::new(None);
        let mut invariant_type =
            ContentType::new(ContentTypeId::new(None), name("Settings"), true);

        for (required, unique, indexed) in [(false, false, false), (true, true, true)] {
            let error = invariant_type
                .set_field(
                    FieldDefinition::new(FieldId::new(), number, name("Limit"))
                        .required(required)
                        .unique(unique)
                        .indexed(indexed),
                )
                .unwrap_err();
            let error = DomainError::from(error);
            assert!(error.as_validation().unwrap().has_code(codes::INVARIANT));
        }
        assert!(invariant_type.fields().is_empty());
    }

    #[tokio::test]
    async fn folding_history_in_two_steps_matches_one_fold() {
        let blog = Blog::new().await;
        let mut a = blog.post_one().await;
        let english = LanguageId::new();
        a.set_locale(english, ContentLocale::new(name("post-1-en")))
            .unwrap();
        a.publish(None).unwrap();
        blog.engine.save_content(&mut a).await.unwrap();
        let midpoint = a.version();

        a.publish(Some(english)).unwrap();
        a.unpublish(None).unwrap();
        blog.engine.save_content(&mut a).await.unwrap();

        let content_id = a.content_id().unwrap();
        let repository = blog.engine.repository();
        let full = ContentRepository::load(repository, content_id)
            .await
            .unwrap()
            .unwrap();

        let mut stepped = ContentRepository::load_at_version(repository, content_id, midpoint)
            .await
            .unwrap()
            .unwrap();
        let query =
            EventQuery::for_aggregate(content_id.aggregate_id()).from_version(midpoint.next());
        let later: Vec<ContentEvent> = repository
            .store()
            .query_events(query)
            .await
            .unwrap()
            .iter()
            .map(|envelope| envelope.decode().unwrap())
            .collect();
        stepped.apply_events(later);
        stepped.set_version(full.version());

        assert_eq!(stepped, full);
        assert_eq!(full, a);
        assert_eq!(full.version(), Version::new(5));
    }

    #[tokio::test]
    async fn numbers_are_validated_against_the_field_type() {
        let blog = Blog::new().await;
        let mut rating = FieldType::new(
            FieldTypeId::new(None),
            name("Rating"),
            FieldTypeProperties::Number(NumberProperties {
                min_value: Some(1.0),
                max_value: Some(5.0),
                step: Some(1.0),
            }),
        )
        .unwrap();
        blog.engine.save_field_type(&mut rating).await.unwrap();

        let mut article = blog
            .engine
            .content_type(blog.article.content_type_id().unwrap())
            .await
            .unwrap();
        let stars = FieldDefinition::new(FieldId::new(), rating.field_type_id().unwrap(), name("Stars"))
            .invariant(true);
        article.set_field(stars.clone()).unwrap();
        blog.engine.save_content_type(&mut article).await.unwrap();

        let mut content = Content::new(
            ContentId::new(None),
            article.content_type_id().unwrap(),
            ContentLocale::new(name("rated"))
                .with_field_value(blog.slug, "rated")
                .with_field_value(stars.id, "7"),
        );
        let error = domain_error(blog.engine.save_content(&mut content).await.unwrap_err());
        let failures: Vec<_> = error
            .as_validation()
            .unwrap()
            .with_code(codes::LESS_THAN_OR_EQUAL)
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].field_id, Some(stars.id));
        assert_eq!(failures[0].attempted_value.as_deref(), Some("7"));
    }
}

mod read_models {
    use super::*;

    #[tokio::test]
    async fn rebuild_matches_incremental_catch_up() {
        let blog = Blog::new().await;
        let a = blog.post_one().await;
        let mut b = blog.post("post-2", "second");
        blog.engine.save_content(&mut b).await.unwrap();

        let before = blog
            .engine
            .contents_view()
            .list(blog.article.content_type_id().unwrap())
            .await;
        blog.engine.rebuild().await.unwrap();
        let after = blog
            .engine
            .contents_view()
            .list(blog.article.content_type_id().unwrap())
            .await;

        assert_eq!(before, after);
        assert_eq!(after.len(), 2);
        assert!(after.iter().any(|c| Some(c.content_id) == a.content_id().ok()));
    }

    #[tokio::test]
    async fn missing_content_types_are_not_found() {
        let blog = Blog::new().await;
        let mut orphan = Content::new(
            ContentId::new(None),
            ContentTypeId::new(None),
            ContentLocale::new(name("orphan")),
        );
        let error = domain_error(blog.engine.save_content(&mut orphan).await.unwrap_err());
        assert!(matches!(
            error,
            DomainError::NotFound {
                aggregate_type: "ContentType",
                ..
            }
        ));
    }
}
