//! Read model trait for query-side views.

/// A view answering lookups from the projected event log.
pub trait ReadModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the number of live entries, or 0 while the view is being written.
    fn count(&self) -> usize;
}
