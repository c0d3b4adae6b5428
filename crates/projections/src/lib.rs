//! Read models over the content engine's event log.
//!
//! This crate provides the query side:
//! - [`Projection`] trait for folding events into read models
//! - [`ReadModel`] trait for query access to the folded data
//! - [`ProjectionProcessor`] for feeding events from the store to projections
//! - Views for field types, content types and contents; they implement the
//!   querier ports the domain managers consult

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod views;

#[cfg(test)]
mod testing;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use views::{ContentTypesView, ContentsView, FieldTypesView};
