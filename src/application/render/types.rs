use thiserror::Error;
use time::Date;

use crate::domain::content::ContentRecord;

/// Rendering request passed into the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub record: &'a ContentRecord,
    /// Date printed in the page header. Supplied by the caller so rendering
    /// stays deterministic.
    pub generated_on: Date,
}

impl<'a> RenderRequest<'a> {
    pub fn new(record: &'a ContentRecord, generated_on: Date) -> Self {
        Self {
            record,
            generated_on,
        }
    }
}

/// Deterministic rendering result returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub html: String,
    /// Sections that produced markup.
    pub rendered_sections: usize,
    /// Sections with an unrecognized tag, rendered as nothing.
    pub dropped_sections: usize,
    pub contains_code: bool,
    /// Bar charts or metric gauges are present.
    pub contains_charts: bool,
}

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("date stamp could not be formatted: {message}")]
    DateStamp { message: String },
}

/// Implementations must be pure and deterministic: the same request yields
/// identical output or the same error.
pub trait RenderService: Send + Sync {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutput, RenderError>;
}
