//! Typed bus events.
//!
//! Each [`WeaverEvent`] variant travels on its own [`Channel`]. Publications
//! are wrapped in an [`Envelope`] carrying an id, a process-local epoch and a
//! timestamp so log lines from different subscribers can be correlated.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::topic::TopicKey;

/// Monotonic publication counter, unique per bus.
pub type Epoch = u64;

/// Sequence number assigned by the orchestrator to each accepted request.
///
/// Larger ids were accepted later; subscribers can use this to discard
/// results that arrive after a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    SearchRequested,
    LoadingStarted,
    RenderReady,
    RequestFailed,
    LibraryChanged,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::SearchRequested,
        Channel::LoadingStarted,
        Channel::RenderReady,
        Channel::RequestFailed,
        Channel::LibraryChanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::SearchRequested => "search_requested",
            Channel::LoadingStarted => "loading_started",
            Channel::RenderReady => "render_ready",
            Channel::RequestFailed => "request_failed",
            Channel::LibraryChanged => "library_changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeaverEvent {
    /// A raw, un-normalized topic typed by the user.
    SearchRequested { query: String },
    /// The orchestrator accepted `query` and started working on it.
    LoadingStarted { query: String, request: RequestId },
    /// A complete page body is ready for display.
    RenderReady {
        key: TopicKey,
        html: Arc<str>,
        request: RequestId,
        from_cache: bool,
    },
    /// The request could not be served; `message` is safe to show to users.
    RequestFailed {
        query: String,
        message: String,
        request: RequestId,
    },
    /// Every generated key so far, in the order pages were first generated.
    LibraryChanged { keys: Vec<TopicKey> },
}

impl WeaverEvent {
    pub fn channel(&self) -> Channel {
        match self {
            WeaverEvent::SearchRequested { .. } => Channel::SearchRequested,
            WeaverEvent::LoadingStarted { .. } => Channel::LoadingStarted,
            WeaverEvent::RenderReady { .. } => Channel::RenderReady,
            WeaverEvent::RequestFailed { .. } => Channel::RequestFailed,
            WeaverEvent::LibraryChanged { .. } => Channel::LibraryChanged,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub id: Uuid,
    pub epoch: Epoch,
    pub timestamp: OffsetDateTime,
    pub event: WeaverEvent,
}

impl Envelope {
    pub fn new(event: WeaverEvent, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            timestamp: OffsetDateTime::now_utc(),
            event,
        }
    }

    pub fn channel(&self) -> Channel {
        self.event.channel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_maps_to_its_own_channel() {
        let key = TopicKey::normalize("topic").expect("non-empty key");
        let events = [
            WeaverEvent::SearchRequested {
                query: "Topic".into(),
            },
            WeaverEvent::LoadingStarted {
                query: "Topic".into(),
                request: RequestId::new(1),
            },
            WeaverEvent::RenderReady {
                key: key.clone(),
                html: Arc::from("<div></div>"),
                request: RequestId::new(1),
                from_cache: false,
            },
            WeaverEvent::RequestFailed {
                query: "Topic".into(),
                message: "nope".into(),
                request: RequestId::new(1),
            },
            WeaverEvent::LibraryChanged { keys: vec![key] },
        ];

        let channels: Vec<Channel> = events.iter().map(WeaverEvent::channel).collect();
        assert_eq!(channels, Channel::ALL.to_vec());
    }

    #[test]
    fn envelope_ids_are_unique() {
        let first = Envelope::new(
            WeaverEvent::SearchRequested { query: "a".into() },
            0,
        );
        let second = Envelope::new(
            WeaverEvent::SearchRequested { query: "a".into() },
            1,
        );
        assert_ne!(first.id, second.id);
        assert!(!first.id.is_nil());
        assert_eq!(first.channel(), Channel::SearchRequested);
    }

    #[test]
    fn request_ids_order_by_sequence() {
        assert!(RequestId::new(1) < RequestId::new(2));
        assert_eq!(RequestId::new(7).to_string(), "#7");
    }
}
