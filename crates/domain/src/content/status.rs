//! Publication status of a content locale.

use serde::{Deserialize, Serialize};

/// The publication status of one locale of a content.
///
/// Transitions:
/// ```text
/// NotPublished ──publish──► Latest ──edit──► Published
///      ▲                      ▲  │               │
///      │                      │  └──unpublish──┐ │
///      │                      └────publish─────┼─┘
///      └────────────────unpublish──────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PublishStatus {
    /// The locale has never been published, or was unpublished.
    #[default]
    NotPublished,

    /// The published version is the current value of the locale.
    Latest,

    /// The locale was edited after it was last published.
    Published,
}

impl PublishStatus {
    /// Returns true if a publish would change this status.
    pub fn can_publish(&self) -> bool {
        !matches!(self, PublishStatus::Latest)
    }

    /// Returns true if an unpublish would change this status.
    pub fn can_unpublish(&self) -> bool {
        self.is_published()
    }

    /// Returns true for both published states.
    pub fn is_published(&self) -> bool {
        matches!(self, PublishStatus::Latest | PublishStatus::Published)
    }

    /// Returns the status an edit of the locale leads to.
    pub fn after_edit(&self) -> Self {
        match self {
            PublishStatus::Latest => PublishStatus::Published,
            other => *other,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::NotPublished => "NotPublished",
            PublishStatus::Latest => "Latest",
            PublishStatus::Published => "Published",
        }
    }
}

impl std::fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
