//! Page rendering.
//!
//! The renderer is pure: it turns a [`ContentRecord`](crate::domain::content::ContentRecord)
//! plus a date stamp into one markup string and reports what it produced.
//! Every record-supplied string is escaped on the way out. Storing and
//! publishing the result is the caller's business.

mod service;
mod types;

pub use service::{RingGeometry, SectionRenderService, bar_chart, metric_card, ring_geometry};
pub use types::{RenderError, RenderOutput, RenderRequest, RenderService};
