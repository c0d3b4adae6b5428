//! Append-only event log for the content engine.
//!
//! Besides events, the store records *unique claims*: `(scope, key, value)`
//! triples owned by one aggregate and written in the same transaction as its
//! events. They are the storage-level uniqueness constraint that backs the
//! advisory read-model checks done by the domain managers.

pub mod claims;
pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use claims::{ClaimSet, UniqueClaim};
pub use common::{AggregateId, RealmId};
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use query::{EventQuery, RealmFilter};
pub use store::{AppendOptions, EventStore, EventStream};
