use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::stream;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AggregateId, ClaimSet, EventEnvelope, EventId, EventQuery, EventStoreError, RealmFilter,
    Result, UniqueClaim, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

const SELECT_EVENTS: &str = "SELECT id, event_type, aggregate_id, aggregate_type, version, \
     timestamp, payload, metadata FROM events";

const SELECT_CLAIM_OWNER: &str =
    "SELECT owner_id FROM unique_claims WHERE scope = $1 AND claim_key = $2 AND claim_value = $3";

/// Event store on PostgreSQL.
///
/// `events` holds the log, globally ordered by its `sequence` column, with
/// a unique `(aggregate_id, version)` constraint. `unique_claims` holds the
/// claim table; its primary key on `(scope, claim_key, claim_value)` is what
/// finally enforces uniqueness between concurrent writers.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn decode_row(row: PgRow) -> Result<EventEnvelope> {
        let metadata: HashMap<String, serde_json::Value> =
            serde_json::from_value(row.try_get("metadata")?)?;
        let stream_key: String = row.try_get("aggregate_id")?;

        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            aggregate_id: stream_key.parse()?,
            aggregate_type: row.try_get("aggregate_type")?,
            version: Version::new(row.try_get("version")?),
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
            metadata,
        })
    }

    async fn insert_event(
        tx: &mut Transaction<'_, Postgres>,
        event: &EventEnvelope,
        stream_key: &str,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO events
                (id, event_type, aggregate_id, realm_id, aggregate_type, version, timestamp, payload, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.event_id.as_uuid())
        .bind(&event.event_type)
        .bind(stream_key)
        .bind(event.realm_id().map(|realm| realm.as_uuid()))
        .bind(&event.aggregate_type)
        .bind(event.version.as_i64())
        .bind(event.timestamp)
        .bind(&event.payload)
        .bind(sqlx::types::Json(&event.metadata))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Releases the owner's claims in the released scopes, then records the
    /// new claims. A claim already held by someone else aborts the append.
    async fn apply_claims(
        tx: &mut Transaction<'_, Postgres>,
        owner: AggregateId,
        claims: &ClaimSet,
    ) -> Result<()> {
        let owner_key = owner.encode();

        if !claims.released_scopes.is_empty() {
            sqlx::query("DELETE FROM unique_claims WHERE owner_id = $1 AND scope = ANY($2)")
                .bind(&owner_key)
                .bind(&claims.released_scopes)
                .execute(&mut **tx)
                .await?;
        }

        for claim in &claims.claims {
            Self::record_claim(tx, owner, &owner_key, claim).await?;
        }

        Ok(())
    }

    /// Records one claim for `owner`. A holder that releases the claim between
    /// our insert and our lookup leaves it free, so the insert is retried.
    async fn record_claim(
        tx: &mut Transaction<'_, Postgres>,
        owner: AggregateId,
        owner_key: &str,
        claim: &UniqueClaim,
    ) -> Result<()> {
        loop {
            let inserted = sqlx::query(
                "INSERT INTO unique_claims (scope, claim_key, claim_value, owner_id) \
                 VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
            )
            .bind(&claim.scope)
            .bind(&claim.key)
            .bind(&claim.value)
            .bind(owner_key)
            .execute(&mut **tx)
            .await?
            .rows_affected();
            if inserted == 1 {
                return Ok(());
            }

            let holder: Option<String> = sqlx::query_scalar(SELECT_CLAIM_OWNER)
                .bind(&claim.scope)
                .bind(&claim.key)
                .bind(&claim.value)
                .fetch_optional(&mut **tx)
                .await?;
            match holder {
                None => {
                    tracing::debug!(aggregate_id = %owner, scope = %claim.scope, key = %claim.key, "claim released concurrently, retrying");
                }
                Some(holder) if holder == owner_key => return Ok(()),
                Some(holder) => {
                    tracing::debug!(aggregate_id = %owner, owner = %holder, scope = %claim.scope, key = %claim.key, "unique claim rejected");
                    return Err(EventStoreError::UniqueConstraintViolation {
                        scope: claim.scope.clone(),
                        key: claim.key.clone(),
                        value: claim.value.clone(),
                        owner: holder.parse()?,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let stream_key = aggregate_id.encode();
        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
                .bind(&stream_key)
                .fetch_one(&mut *tx)
                .await?;
        let current = current.map(Version::new).unwrap_or_default();
        let conflict = |actual: Version| EventStoreError::ConcurrencyConflict {
            aggregate_id,
            expected: options.expected_version.unwrap_or(current),
            actual,
        };

        if options.expected_version.is_some_and(|v| v != current) {
            return Err(conflict(current));
        }

        for event in &events {
            // A concurrent writer got to this version between our read and
            // our insert.
            Self::insert_event(&mut tx, event, &stream_key)
                .await
                .map_err(|e| {
                    let raced = matches!(&e, sqlx::Error::Database(db)
                        if db.constraint() == Some("unique_aggregate_version"));
                    if raced {
                        conflict(event.version)
                    } else {
                        EventStoreError::Database(e)
                    }
                })?;
        }

        Self::apply_claims(&mut tx, aggregate_id, &options.claims).await?;
        tx.commit().await?;

        metrics::counter!("event_store_appends_total", "backend" => "postgres")
            .increment(events.len() as u64);
        Ok(events.last().map_or(current, |e| e.version))
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        self.query_events(EventQuery::for_aggregate(aggregate_id))
            .await
            .map(|mut events| {
                events.sort_by_key(|e| e.version);
                events
            })
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let mut sql = QueryBuilder::<Postgres>::new(SELECT_EVENTS);
        sql.push(" WHERE TRUE");

        if let Some(id) = query.aggregate_id {
            sql.push(" AND aggregate_id = ").push_bind(id.encode());
        }
        if let Some(aggregate_type) = query.aggregate_type {
            sql.push(" AND aggregate_type = ").push_bind(aggregate_type);
        }
        match query.realm {
            Some(RealmFilter::Global) => {
                sql.push(" AND realm_id IS NULL");
            }
            Some(RealmFilter::Realm(realm)) => {
                sql.push(" AND realm_id = ").push_bind(realm.as_uuid());
            }
            None => {}
        }
        if let Some(event_types) = query.event_types {
            sql.push(" AND event_type = ANY(")
                .push_bind(event_types)
                .push(")");
        }
        if let Some(from) = query.from_version {
            sql.push(" AND version >= ").push_bind(from.as_i64());
        }
        if let Some(to) = query.to_version {
            sql.push(" AND version <= ").push_bind(to.as_i64());
        }
        sql.push(" ORDER BY sequence ASC");

        let rows = sql.build().fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::decode_row).collect()
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        // Fetched eagerly; the stream must not hold a pool connection.
        let rows = sqlx::query(&format!("{SELECT_EVENTS} ORDER BY sequence ASC"))
            .fetch_all(&self.pool)
            .await?;

        let events: Vec<_> = rows.into_iter().map(Self::decode_row).collect();
        Ok(Box::pin(stream::iter(events)))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM events WHERE aggregate_id = $1")
                .bind(aggregate_id.encode())
                .fetch_one(&self.pool)
                .await?;

        Ok(version.map(Version::new))
    }

    async fn claim_owner(&self, claim: &UniqueClaim) -> Result<Option<AggregateId>> {
        let holder: Option<String> = sqlx::query_scalar(SELECT_CLAIM_OWNER)
            .bind(&claim.scope)
            .bind(&claim.key)
            .bind(&claim.value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(holder.map(|key| key.parse::<AggregateId>()).transpose()?)
    }
}
