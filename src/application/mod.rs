//! Application layer: content sources, page rendering and the orchestrator
//! that ties them to the event bus.

pub mod error;
pub mod render;
pub mod source;
pub mod weaver;
