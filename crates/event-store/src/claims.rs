//! Unique claims recorded alongside appended events.

use serde::{Deserialize, Serialize};

/// A `(scope, key, value)` triple reserved by one aggregate.
///
/// No two aggregates may own the same triple. The scope is the uniqueness
/// domain (for example all field types of a realm), the key names what is
/// unique inside it and the value is the normalized value being reserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueClaim {
    pub scope: String,
    pub key: String,
    pub value: String,
}

impl UniqueClaim {
    /// Creates a new claim.
    pub fn new(scope: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Claims to apply atomically with an append.
///
/// Every claim the appending aggregate owns in one of `released_scopes` is
/// dropped first, then `claims` are recorded. Releasing a scope and claiming
/// inside it again in the same set replaces the aggregate's claims there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    pub released_scopes: Vec<String>,
    pub claims: Vec<UniqueClaim>,
}

impl ClaimSet {
    /// Creates an empty claim set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Releases the aggregate's claims in a scope.
    pub fn release(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !self.released_scopes.contains(&scope) {
            self.released_scopes.push(scope);
        }
        self
    }

    /// Adds a claim.
    pub fn claim(mut self, claim: UniqueClaim) -> Self {
        if !self.claims.contains(&claim) {
            self.claims.push(claim);
        }
        self
    }

    /// Merges another claim set into this one.
    pub fn merge(mut self, other: ClaimSet) -> Self {
        for scope in other.released_scopes {
            self = self.release(scope);
        }
        for claim in other.claims {
            self = self.claim(claim);
        }
        self
    }

    /// Returns true when the set neither releases nor claims anything.
    pub fn is_empty(&self) -> bool {
        self.released_scopes.is_empty() && self.claims.is_empty()
    }
}
