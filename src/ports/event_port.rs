//! # Event Port
//!
//! Observers subscribe to the pipeline's progress through this trait
//! rather than parsing console output.

use crate::domain::events::FetchEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &FetchEvent);
}

/// Sink that drops every event. Useful for components that run outside
/// an orchestrated run.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &FetchEvent) {}
}
