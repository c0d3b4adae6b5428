//! Identifiers and validated text values shared by the schema and content aggregates.

use std::fmt;
use std::str::FromStr;

use common::{AggregateId, AggregateIdError, RealmId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{ValidationError, ValidationFailure, codes};

/// Maximum length, in characters, of names, display names and placeholders.
pub const MAX_NAME_LENGTH: usize = 255;

macro_rules! aggregate_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(AggregateId);

        impl $name {
            /// Creates a new random id in the given realm.
            pub fn new(realm_id: Option<RealmId>) -> Self {
                Self(AggregateId::in_realm(realm_id))
            }

            pub fn from_aggregate_id(id: AggregateId) -> Self {
                Self(id)
            }

            pub fn aggregate_id(&self) -> AggregateId {
                self.0
            }

            pub fn realm_id(&self) -> Option<RealmId> {
                self.0.realm_id()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = AggregateIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<$name> for AggregateId {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

aggregate_id!(
    /// Identifier of a [`Content`](crate::content::Content).
    ContentId
);
aggregate_id!(
    /// Identifier of a [`ContentType`](crate::content_type::ContentType).
    ContentTypeId
);
aggregate_id!(
    /// Identifier of a [`FieldType`](crate::field_type::FieldType).
    FieldTypeId
);

/// Identifier of a field definition inside a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(Uuid);

impl FieldId {
    /// Creates a new random field ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a language a content locale is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(Uuid);

impl LanguageId {
    /// Creates a new random language ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for LanguageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn check_length(
    value: &str,
    property_name: &str,
) -> Result<(), ValidationFailure> {
    if value.is_empty() {
        return Err(
            ValidationFailure::new(codes::NOT_EMPTY, "The value cannot be empty.", property_name)
                .with_value(value),
        );
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationFailure::new(
            codes::MAXIMUM_LENGTH,
            format!("The value must be at most {MAX_NAME_LENGTH} characters long."),
            property_name,
        )
        .with_value(value));
    }
    Ok(())
}

/// A unique name: letters, digits and `- . _ @ +`, at most 255 characters.
///
/// Uniqueness comparisons are case-insensitive and go through
/// [`UniqueName::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueName(String);

impl UniqueName {
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();
        check_length(value, "UniqueName")?;

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_alphanumeric() && !"-._@+".contains(*c))
        {
            return Err(ValidationFailure::new(
                codes::ALLOWED_CHARACTERS,
                format!("The character '{c}' is not allowed in a unique name."),
                "UniqueName",
            )
            .with_value(value)
            .into());
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the upper-cased form used for uniqueness checks.
    pub fn normalized(&self) -> String {
        self.0.to_uppercase()
    }

    /// Returns true if both names are equal ignoring case.
    pub fn matches(&self, other: &UniqueName) -> bool {
        self.normalized() == other.normalized()
    }
}

impl fmt::Display for UniqueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! optional_text {
    ($(#[$meta:meta])* $name:ident, $property:literal, $bounded:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
                let value = value.as_ref().trim();
                if $bounded {
                    check_length(value, $property)?;
                } else if value.is_empty() {
                    return Err(ValidationFailure::new(
                        codes::NOT_EMPTY,
                        "The value cannot be empty.",
                        $property,
                    )
                    .into());
                }
                Ok(Self(value.to_string()))
            }

            /// Builds an optional value; blank text becomes `None`.
            pub fn try_from_optional(
                value: Option<&str>,
            ) -> Result<Option<Self>, ValidationError> {
                match value.map(str::trim) {
                    Some(value) if !value.is_empty() => Self::new(value).map(Some),
                    _ => Ok(None),
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

optional_text!(
    /// A human readable name, at most 255 characters.
    DisplayName,
    "DisplayName",
    true
);
optional_text!(
    /// Free text describing an entity.
    Description,
    "Description",
    false
);
optional_text!(
    /// Hint shown in an empty input, at most 255 characters.
    Placeholder,
    "Placeholder",
    true
);
