//! Content aggregate and related types.
//!
//! A content holds one invariant locale and any number of language locales,
//! each with its own publication status.

mod aggregate;
mod events;
mod locale;
mod manager;
mod status;

pub use aggregate::Content;
pub use events::{
    ContentCreatedData, ContentDeletedData, ContentEvent, ContentLocaleChangedData,
    ContentLocalePublishedData, ContentLocaleRemovedData, ContentLocaleUnpublishedData,
};
pub use locale::ContentLocale;
pub use manager::ContentManager;
pub use status::PublishStatus;

use thiserror::Error;

use crate::error::DomainError;
use crate::value_objects::LanguageId;

/// Errors that can occur during content operations.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The content has not been created yet.
    #[error("Content has not been created")]
    NotCreated,

    /// The content has been deleted.
    #[error("Content has been deleted")]
    Deleted,

    /// The content has no locale for the language.
    #[error("The content has no locale for language {language_id}")]
    LocaleNotFound { language_id: LanguageId },
}

impl From<ContentError> for DomainError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::LocaleNotFound { language_id } => {
                DomainError::not_found("ContentLocale", language_id)
            }
            e @ (ContentError::NotCreated | ContentError::Deleted) => {
                DomainError::InvalidState(e.to_string())
            }
        }
    }
}
