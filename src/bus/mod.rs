//! Synchronous publish/subscribe bus.
//!
//! The bus decouples the request side (a shell reading topics) from the
//! orchestrator and from whatever presents the results. Delivery is
//! synchronous and ordered: `publish` runs every handler subscribed to the
//! event's channel, in subscription order, before returning. A failing or
//! panicking handler is logged and skipped; it never reaches the publisher
//! or its siblings.

mod events;
mod router;

pub use events::{Channel, Envelope, Epoch, RequestId, WeaverEvent};
pub use router::{EventBus, Handler, HandlerError};
