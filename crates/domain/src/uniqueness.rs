//! Unique claim scopes and keys.
//!
//! Scopes:
//! - `content-type/{realm|global}` and `field-type/{realm|global}`, keyed by
//!   `unique_name` with the normalized name as value
//! - `content/{contentTypeId}/{languageId|invariant}`, keyed by `unique_name`
//!   and by `field/{fieldId}` with the SHA-256 of the stored field value

use common::{AggregateId, RealmId};
use event_store::{ClaimSet, EventStoreError, UniqueClaim};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{ConflictError, DomainError};
use crate::value_objects::{ContentTypeId, FieldId, LanguageId, UniqueName};

pub const UNIQUE_NAME_KEY: &str = "unique_name";

const FIELD_KEY_PREFIX: &str = "field/";

pub fn content_type_scope(realm_id: Option<RealmId>) -> String {
    format!("content-type/{}", realm_segment(realm_id))
}

pub fn field_type_scope(realm_id: Option<RealmId>) -> String {
    format!("field-type/{}", realm_segment(realm_id))
}

pub fn content_scope(content_type_id: ContentTypeId, language_id: Option<LanguageId>) -> String {
    match language_id {
        Some(language_id) => format!("content/{content_type_id}/{language_id}"),
        None => format!("content/{content_type_id}/invariant"),
    }
}

fn realm_segment(realm_id: Option<RealmId>) -> String {
    realm_id.map_or_else(|| "global".to_string(), |realm_id| realm_id.to_string())
}

pub fn field_key(field_id: FieldId) -> String {
    format!("{FIELD_KEY_PREFIX}{field_id}")
}

/// Parses the field id out of a `field/{fieldId}` claim key.
pub fn parse_field_key(key: &str) -> Option<FieldId> {
    key.strip_prefix(FIELD_KEY_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
        .map(FieldId::from_uuid)
}

pub fn unique_name_claim(scope: &str, unique_name: &UniqueName) -> UniqueClaim {
    UniqueClaim::new(scope, UNIQUE_NAME_KEY, unique_name.normalized())
}

/// Field values have no length bound, so the claim holds their digest to
/// keep every claim row within index limits.
pub fn field_value_claim(scope: &str, field_id: FieldId, value: &str) -> UniqueClaim {
    let digest = Sha256::digest(value.as_bytes());
    UniqueClaim::new(scope, field_key(field_id), hex::encode(digest))
}

/// Replaces the claims of a name scope with one name claim.
pub fn name_claims(scope: String, unique_name: &UniqueName) -> ClaimSet {
    let claim = unique_name_claim(&scope, unique_name);
    ClaimSet::none().release(scope).claim(claim)
}

/// Turns a claim violation raised while saving a named schema aggregate into
/// the conflict the read-model check reports. Other errors pass through.
pub(crate) fn into_name_conflict(
    error: DomainError,
    aggregate_type: &'static str,
    realm_id: Option<RealmId>,
    unique_name: &UniqueName,
) -> DomainError {
    match error {
        DomainError::EventStore(EventStoreError::UniqueConstraintViolation { owner, .. }) => {
            record_conflict(aggregate_type, "storage");
            ConflictError::UniqueNameAlreadyUsed {
                aggregate_type,
                realm_id,
                unique_name: unique_name.clone(),
                conflicting_id: owner,
            }
            .into()
        }
        other => other,
    }
}

/// Builds the conflict for a name already used by another aggregate.
pub(crate) fn name_already_used(
    aggregate_type: &'static str,
    realm_id: Option<RealmId>,
    unique_name: &UniqueName,
    conflicting_id: AggregateId,
) -> DomainError {
    record_conflict(aggregate_type, "read_model");
    ConflictError::UniqueNameAlreadyUsed {
        aggregate_type,
        realm_id,
        unique_name: unique_name.clone(),
        conflicting_id,
    }
    .into()
}

pub(crate) fn record_conflict(aggregate_type: &'static str, source: &'static str) {
    metrics::counter!(
        "uniqueness_conflicts_total",
        "aggregate" => aggregate_type,
        "source" => source
    )
    .increment(1);
}
