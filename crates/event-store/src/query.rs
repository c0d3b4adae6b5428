use crate::{AggregateId, RealmId, Version};

/// Realm scope of an event query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealmFilter {
    /// Only aggregates without a realm.
    Global,
    /// Only aggregates of the given realm.
    Realm(RealmId),
}

impl RealmFilter {
    /// Returns true if an aggregate in `realm_id` is inside this scope.
    pub fn matches(&self, realm_id: Option<RealmId>) -> bool {
        match self {
            Self::Global => realm_id.is_none(),
            Self::Realm(realm) => realm_id == Some(*realm),
        }
    }
}

impl From<Option<RealmId>> for RealmFilter {
    fn from(realm_id: Option<RealmId>) -> Self {
        realm_id.map_or(Self::Global, Self::Realm)
    }
}

/// Filter over the event log. Unset criteria match everything; results come
/// back in append order.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub aggregate_id: Option<AggregateId>,
    pub aggregate_type: Option<String>,
    pub realm: Option<RealmFilter>,
    /// Any of these event types.
    pub event_types: Option<Vec<String>>,
    /// Inclusive.
    pub from_version: Option<Version>,
    /// Inclusive.
    pub to_version: Option<Version>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events of one aggregate.
    pub fn for_aggregate(aggregate_id: AggregateId) -> Self {
        Self::new().aggregate_id(aggregate_id)
    }

    /// Events of every aggregate of a type within a realm scope.
    pub fn in_realm(aggregate_type: impl Into<String>, realm: impl Into<RealmFilter>) -> Self {
        Self::new().aggregate_type(aggregate_type).realm(realm)
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn realm(mut self, realm: impl Into<RealmFilter>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn event_types<I, T>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.event_types = Some(event_types.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_version(mut self, version: Version) -> Self {
        self.from_version = Some(version);
        self
    }

    pub fn to_version(mut self, version: Version) -> Self {
        self.to_version = Some(version);
        self
    }

    /// Returns true if the event at `version` is inside the version range.
    pub fn includes_version(&self, version: Version) -> bool {
        self.from_version.is_none_or(|from| version >= from)
            && self.to_version.is_none_or(|to| version <= to)
    }
}
