//! Identifier types shared by every crate of the content engine.

mod types;

pub use types::{AggregateId, AggregateIdError, RealmId};
