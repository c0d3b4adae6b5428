//! The engine over PostgreSQL.
//!
//! These tests need Docker, so they are ignored by default. Run with:
//!
//! ```bash
//! cargo test -p engine --test postgres_engine -- --ignored
//! ```

use std::sync::Arc;

use domain::field_type::StringProperties;
use domain::{
    ConflictError, Content, ContentId, ContentLocale, ContentType, ContentTypeId, DomainError,
    FieldDefinition, FieldId, FieldType, FieldTypeId, FieldTypeProperties, UniqueName,
};
use engine::{Engine, EngineError};
use event_store::PostgresEventStore;
use projections::ReadModel;
use serial_test::serial;
use sqlx::postgres::PgPoolOptions;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// A migrated store with empty tables.
async fn fresh_store() -> PostgresEventStore {
    let info = get_container_info().await;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();
    let store = PostgresEventStore::new(pool);
    store.run_migrations().await.unwrap();
    sqlx::query("TRUNCATE TABLE events, unique_claims")
        .execute(store.pool())
        .await
        .unwrap();
    store
}

fn name(value: &str) -> UniqueName {
    UniqueName::new(value).unwrap()
}

/// Creates the `BlogArticle` schema and returns it with its slug field id.
async fn blog_article(engine: &Engine<PostgresEventStore>) -> (ContentType, FieldId) {
    let mut text = FieldType::new(
        FieldTypeId::new(None),
        name("SlugText"),
        FieldTypeProperties::String(StringProperties::default()),
    )
    .unwrap();
    engine.save_field_type(&mut text).await.unwrap();

    let mut article = ContentType::new(ContentTypeId::new(None), name("BlogArticle"), false);
    let slug = FieldDefinition::new(FieldId::new(), text.field_type_id().unwrap(), name("Slug"))
        .invariant(true)
        .unique(true);
    article.set_field(slug.clone()).unwrap();
    engine.save_content_type(&mut article).await.unwrap();
    (article, slug.id)
}

fn post(article: &ContentType, slug: FieldId, unique_name: &str, value: &str) -> Content {
    Content::new(
        ContentId::new(None),
        article.content_type_id().unwrap(),
        ContentLocale::new(name(unique_name)).with_field_value(slug, value),
    )
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn claims_hold_across_engine_instances() {
    let store = fresh_store().await;
    let first = Engine::new(store.clone());
    let (article, slug) = blog_article(&first).await;

    // The second engine starts before any content exists and never catches up,
    // so its read model cannot see the first engine's write.
    let second = Engine::new(store);
    second.catch_up().await.unwrap();

    let mut a = post(&article, slug, "post-1", "my-post");
    first.save_content(&mut a).await.unwrap();

    let mut b = post(&article, slug, "post-2", "my-post");
    let error = second.save_content(&mut b).await.unwrap_err();
    match error {
        EngineError::Domain(DomainError::Conflict(ConflictError::ContentFieldValueConflict {
            conflicts,
            ..
        })) => assert_eq!(conflicts[&slug], a.content_id().unwrap()),
        other => panic!("expected a field value conflict, got {other:?}"),
    }
}

/// `len` printable characters that do not compress.
fn incompressible(len: usize, mut seed: u64) -> String {
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            char::from(b'!' + (seed % 94) as u8)
        })
        .collect()
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn long_unique_values_are_saved_and_still_conflict() {
    let store = fresh_store().await;
    let first = Engine::new(store.clone());
    let (article, slug) = blog_article(&first).await;
    let second = Engine::new(store);
    second.catch_up().await.unwrap();

    let value = incompressible(20_000, 0x9E37_79B9_7F4A_7C15);
    let mut a = post(&article, slug, "long-1", &value);
    first.save_content(&mut a).await.unwrap();

    let mut other = post(&article, slug, "long-2", &incompressible(20_000, 42));
    first.save_content(&mut other).await.unwrap();

    let mut b = post(&article, slug, "long-3", &value);
    let error = second.save_content(&mut b).await.unwrap_err();
    match error {
        EngineError::Domain(DomainError::Conflict(ConflictError::ContentFieldValueConflict {
            conflicts,
            ..
        })) => assert_eq!(conflicts[&slug], a.content_id().unwrap()),
        other => panic!("expected a field value conflict, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn a_restarted_engine_catches_up_from_the_log() {
    let store = fresh_store().await;
    let engine = Engine::new(store.clone());
    let (article, slug) = blog_article(&engine).await;
    for (i, value) in ["one", "two", "three"].into_iter().enumerate() {
        let mut content = post(&article, slug, &format!("post-{i}"), value);
        engine.save_content(&mut content).await.unwrap();
    }
    drop(engine);

    let restarted = Engine::new(store);
    assert_eq!(restarted.contents_view().count(), 0);
    restarted.catch_up().await.unwrap();

    assert_eq!(restarted.field_types_view().count(), 1);
    assert_eq!(restarted.content_types_view().count(), 1);
    assert_eq!(
        restarted
            .contents_view()
            .list(article.content_type_id().unwrap())
            .await
            .len(),
        3
    );
}
