use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a realm (tenant).
///
/// Realms are the isolation boundary for schemas, contents and uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealmId(Uuid);

impl RealmId {
    /// Creates a new random realm ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a realm ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RealmId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when decoding an encoded aggregate stream key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateIdError {
    #[error("invalid stream key '{0}': expected '<entity>' or '<realm>:<entity>'")]
    Malformed(String),

    #[error("invalid stream key '{key}': {reason}")]
    InvalidUuid { key: String, reason: String },
}

/// Identifier of an aggregate stream.
///
/// An aggregate is identified by an optional realm and an entity id. Both are
/// encoded into a single opaque stream key, `"{realm}:{entity}"` or
/// `"{entity}"` for realm-less aggregates, which is what the event store
/// indexes and what serialization produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregateId {
    realm_id: Option<RealmId>,
    entity_id: Uuid,
}

impl AggregateId {
    /// Creates a new realm-less aggregate ID with a random entity id.
    pub fn new() -> Self {
        Self::from_parts(None, Uuid::new_v4())
    }

    /// Creates a new aggregate ID with a random entity id, scoped to a realm.
    pub fn in_realm(realm_id: Option<RealmId>) -> Self {
        Self::from_parts(realm_id, Uuid::new_v4())
    }

    /// Creates an aggregate ID from its realm and entity parts.
    pub fn from_parts(realm_id: Option<RealmId>, entity_id: Uuid) -> Self {
        Self {
            realm_id,
            entity_id,
        }
    }

    /// Returns the realm this aggregate belongs to, if any.
    pub fn realm_id(&self) -> Option<RealmId> {
        self.realm_id
    }

    /// Returns the entity part of the identifier.
    pub fn entity_id(&self) -> Uuid {
        self.entity_id
    }

    /// Returns the encoded stream key.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.realm_id {
            Some(realm_id) => write!(f, "{realm_id}:{}", self.entity_id),
            None => write!(f, "{}", self.entity_id),
        }
    }
}

impl FromStr for AggregateId {
    type Err = AggregateIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            Uuid::parse_str(part).map_err(|e| AggregateIdError::InvalidUuid {
                key: s.to_string(),
                reason: e.to_string(),
            })
        };

        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(entity), None, None) if !entity.is_empty() => {
                Ok(Self::from_parts(None, parse(entity)?))
            }
            (Some(realm), Some(entity), None) => Ok(Self::from_parts(
                Some(RealmId::from_uuid(parse(realm)?)),
                parse(entity)?,
            )),
            _ => Err(AggregateIdError::Malformed(s.to_string())),
        }
    }
}

impl Serialize for AggregateId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AggregateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}
