use std::any::Any;
use std::collections::HashMap;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::util::lock::{rw_read, rw_write};

use super::events::{Channel, Envelope, Epoch, WeaverEvent};

const SOURCE: &str = "bus::router";

/// Subscriber callback. Handlers run on the publisher's thread.
pub type Handler = dyn Fn(&Envelope) -> Result<(), HandlerError> + Send + Sync;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("handler rejected event: {reason}")]
    Rejected { reason: String },
}

impl HandlerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Channel-keyed fan-out of [`WeaverEvent`]s.
///
/// Subscriptions are permanent for the lifetime of the bus. The handler list
/// for a channel is snapshotted before dispatch, so a handler may publish or
/// subscribe re-entrantly; handlers added during a dispatch only see later
/// publications.
pub struct EventBus {
    handlers: RwLock<HashMap<Channel, Vec<Arc<Handler>>>>,
    epoch_counter: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn subscribe<F>(&self, channel: Channel, handler: F)
    where
        F: Fn(&Envelope) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let mut handlers = rw_write(&self.handlers, SOURCE, "subscribe");
        let list = handlers.entry(channel).or_default();
        list.push(Arc::new(handler));
        debug!(
            channel = channel.as_str(),
            subscribers = list.len(),
            "Bus handler subscribed"
        );
    }

    /// Deliver `event` to every handler on its channel.
    ///
    /// Returns the number of handlers that completed without error. Events on
    /// a channel without subscribers are dropped.
    pub fn publish(&self, event: WeaverEvent) -> usize {
        let channel = event.channel();
        let handlers: Vec<Arc<Handler>> = rw_read(&self.handlers, SOURCE, "publish")
            .get(&channel)
            .cloned()
            .unwrap_or_default();

        let envelope = Envelope::new(event, self.next_epoch());

        if handlers.is_empty() {
            trace!(
                channel = channel.as_str(),
                event_epoch = envelope.epoch,
                "Bus event discarded: no subscribers"
            );
            return 0;
        }

        debug!(
            channel = channel.as_str(),
            event_id = %envelope.id,
            event_epoch = envelope.epoch,
            subscribers = handlers.len(),
            "Bus event published"
        );

        let mut delivered = 0;
        for (index, handler) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(&envelope))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    warn!(
                        channel = channel.as_str(),
                        event_id = %envelope.id,
                        handler_index = index,
                        error = %err,
                        "Bus handler failed"
                    );
                }
                Err(payload) => {
                    error!(
                        channel = channel.as_str(),
                        event_id = %envelope.id,
                        handler_index = index,
                        panic = panic_message(payload.as_ref()),
                        "Bus handler panicked"
                    );
                }
            }
        }

        delivered
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        rw_read(&self.handlers, SOURCE, "subscriber_count")
            .get(&channel)
            .map_or(0, Vec::len)
    }

    fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
