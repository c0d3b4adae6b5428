//! Read model views implementing the querier ports.

pub mod content_types;
pub mod contents;
pub mod field_types;

pub use content_types::{ContentTypeSummary, ContentTypesView};
pub use contents::{ContentSummary, ContentsView, LocaleSummary};
pub use field_types::{FieldTypeSummary, FieldTypesView};
