//! The orchestrator.
//!
//! [`Weaver`] owns the page cache and drives each request through
//! `Idle → Loading → Resolved | Failed`:
//!
//! 1. blank queries are ignored outright;
//! 2. `LoadingStarted` is published with the raw query;
//! 3. a fresh cache entry is published as `RenderReady` without touching the
//!    content source;
//! 4. otherwise the source is consulted and the record rendered and cached,
//!    then `RenderReady` and `LibraryChanged` are published;
//! 5. any failure publishes `RequestFailed` with [`TANGLED_WEB`] and leaves
//!    the cache untouched.
//!
//! Concurrent requests for the same key share one fetch-and-render. A
//! `RenderReady` for a request that has been overtaken by a newer one is not
//! published, so a slow answer cannot replace a newer page. `LibraryChanged`
//! only ever follows a published render of freshly woven content; a page
//! woven for a superseded request is announced by the next library update.

mod state;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::application::error::{AppError, ErrorReport};
use crate::application::render::{RenderRequest, RenderService};
use crate::application::source::ContentSource;
use crate::bus::{Channel, EventBus, HandlerError, RequestId, WeaverEvent};
use crate::cache::{CacheLookup, CachedPage, InFlight, PageCache};
use crate::domain::error::DomainError;
use crate::domain::topic::TopicKey;
use crate::util::clock::{Clock, SystemClock};

pub use state::RequestState;

/// The only failure text subscribers ever see.
pub const TANGLED_WEB: &str = "The Weaver encountered a tangled web.";

const SOURCE: &str = "application::weaver";

const METRIC_REQUEST_FAILED: &str = "weaver_request_failed_total";
const METRIC_RENDER_MS: &str = "weaver_render_ms";

type WeaveResult = Result<Arc<CachedPage>, Arc<AppError>>;

/// How a call to [`Weaver::process_request`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// The query was blank; nothing was published.
    Ignored,
    Resolved {
        key: TopicKey,
        html: Arc<str>,
        from_cache: bool,
    },
    Failed {
        key: TopicKey,
    },
}

/// Everything needed to produce a page, detached from the orchestrator so the
/// work can outlive the request that started it.
#[derive(Clone)]
struct Pipeline {
    source: Arc<dyn ContentSource>,
    renderer: Arc<dyn RenderService>,
    cache: Arc<PageCache>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    async fn weave(self, key: TopicKey) -> WeaveResult {
        self.weave_page(&key).await.map_err(Arc::new)
    }

    async fn weave_page(&self, key: &TopicKey) -> Result<Arc<CachedPage>, AppError> {
        let record = self.source.fetch(key).await?;

        let now = self.clock.now();
        let started = Instant::now();
        let output = self
            .renderer
            .render(&RenderRequest::new(&record, now.date()))?;
        histogram!(METRIC_RENDER_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        debug!(
            key = %key,
            rendered_sections = output.rendered_sections,
            dropped_sections = output.dropped_sections,
            contains_code = output.contains_code,
            contains_charts = output.contains_charts,
            "Page woven"
        );

        Ok(self
            .cache
            .insert(CachedPage::new(key.clone(), output.html, record, now)))
    }
}

/// Tracks the state of one request and rejects illegal moves.
struct RequestTracker {
    request: RequestId,
    state: RequestState,
}

impl RequestTracker {
    fn new(request: RequestId) -> Self {
        Self {
            request,
            state: RequestState::Idle,
        }
    }

    fn advance(&mut self, next: RequestState) -> Result<(), DomainError> {
        self.state = self.state.transition(next)?;
        debug!(request = %self.request, state = %self.state, "Request state changed");
        Ok(())
    }
}

/// Decrements the active-request count when a spawned request finishes.
struct ActiveRequest {
    active: Arc<watch::Sender<usize>>,
}

impl ActiveRequest {
    fn start(active: &Arc<watch::Sender<usize>>) -> Self {
        active.send_modify(|count| *count += 1);
        Self {
            active: Arc::clone(active),
        }
    }
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        self.active
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}

pub struct Weaver {
    bus: Arc<EventBus>,
    pipeline: Pipeline,
    inflight: InFlight<WeaveResult>,
    request_seq: AtomicU64,
    active: Arc<watch::Sender<usize>>,
}

impl Weaver {
    pub fn new(
        bus: Arc<EventBus>,
        source: Arc<dyn ContentSource>,
        renderer: Arc<dyn RenderService>,
        cache: Arc<PageCache>,
    ) -> Self {
        let (active, _) = watch::channel(0);
        Self {
            bus,
            pipeline: Pipeline {
                source,
                renderer,
                cache,
                clock: Arc::new(SystemClock),
            },
            inflight: InFlight::new(),
            request_seq: AtomicU64::new(0),
            active: Arc::new(active),
        }
    }

    /// Replace the wall clock used for cache timestamps and page dates.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.pipeline.clock = clock;
        self
    }

    pub fn cache(&self) -> &PageCache {
        &self.pipeline.cache
    }

    /// Subscribe to `SearchRequested` on the bus.
    ///
    /// Each request is spawned onto the Tokio runtime current at publish
    /// time; publishing outside a runtime fails the handler. The
    /// subscription holds only a weak reference to the orchestrator.
    pub fn attach(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.bus
            .subscribe(Channel::SearchRequested, move |envelope| {
                let WeaverEvent::SearchRequested { query } = &envelope.event else {
                    return Ok(());
                };
                let weaver = weak
                    .upgrade()
                    .ok_or_else(|| HandlerError::rejected("weaver has been dropped"))?;
                let handle = Handle::try_current().map_err(|err| {
                    HandlerError::rejected(format!("no async runtime available: {err}"))
                })?;

                let query = query.clone();
                let active = ActiveRequest::start(&weaver.active);
                handle.spawn(async move {
                    let _active = active;
                    weaver.process_request(&query).await;
                });
                Ok(())
            });
        info!("Weaver attached to search requests");
    }

    /// Wait until every request spawned through [`Weaver::attach`] has finished.
    pub async fn idle(&self) {
        let mut receiver = self.active.subscribe();
        if receiver.wait_for(|count| *count == 0).await.is_err() {
            warn!("Active request tracker closed while waiting for idle");
        }
    }

    /// Number of spawned requests still running.
    pub fn active_requests(&self) -> usize {
        *self.active.borrow()
    }

    /// Handle one raw query end to end.
    pub async fn process_request(&self, raw: &str) -> RequestOutcome {
        let Some(key) = TopicKey::normalize(raw) else {
            debug!("Ignoring blank request");
            return RequestOutcome::Ignored;
        };

        let request = self.next_request_id();
        let mut tracker = RequestTracker::new(request);

        match self.drive(raw, &key, &mut tracker).await {
            Ok(outcome) => outcome,
            Err(error) => self.fail(raw, key, &mut tracker, &error),
        }
    }

    async fn drive(
        &self,
        raw: &str,
        key: &TopicKey,
        tracker: &mut RequestTracker,
    ) -> Result<RequestOutcome, Arc<AppError>> {
        tracker.advance(RequestState::Loading).map_err(invariant)?;
        self.bus.publish(WeaverEvent::LoadingStarted {
            query: raw.to_string(),
            request: tracker.request,
        });

        let now = self.pipeline.clock.now();
        let (page, from_cache) = match self.pipeline.cache.lookup(key, now) {
            CacheLookup::Fresh(page) => (page, true),
            lookup => {
                if let CacheLookup::Stale(stale) = &lookup {
                    info!(
                        key = %key,
                        created_at = %stale.created_at,
                        "Refreshing stale page"
                    );
                }
                let pipeline = self.pipeline.clone();
                let owned_key = key.clone();
                let (result, participation) = self
                    .inflight
                    .run(key, move || pipeline.weave(owned_key))
                    .await;
                debug!(key = %key, request = %tracker.request, ?participation, "Weave settled");
                (result?, false)
            }
        };

        tracker.advance(RequestState::Resolved).map_err(invariant)?;
        let rendered = self.publish_render(&page, tracker.request, from_cache);
        // Only the newest request renders; it alone announces the library.
        if rendered && !from_cache {
            self.bus.publish(WeaverEvent::LibraryChanged {
                keys: self.pipeline.cache.keys(),
            });
        }

        Ok(RequestOutcome::Resolved {
            key: key.clone(),
            html: Arc::clone(&page.html),
            from_cache,
        })
    }

    /// Publish `RenderReady` unless a newer request has been accepted.
    /// Returns whether the event was sent.
    fn publish_render(&self, page: &CachedPage, request: RequestId, from_cache: bool) -> bool {
        let latest = self.request_seq.load(Ordering::SeqCst);
        if request.get() < latest {
            debug!(
                key = %page.key,
                request = %request,
                latest,
                "Suppressed render for superseded request"
            );
            return false;
        }

        self.bus.publish(WeaverEvent::RenderReady {
            key: page.key.clone(),
            html: Arc::clone(&page.html),
            request,
            from_cache,
        });
        true
    }

    fn fail(
        &self,
        raw: &str,
        key: TopicKey,
        tracker: &mut RequestTracker,
        error: &AppError,
    ) -> RequestOutcome {
        if let Err(err) = tracker.advance(RequestState::Failed) {
            warn!(request = %tracker.request, error = %err, "Request failed outside loading state");
        }

        counter!(METRIC_REQUEST_FAILED).increment(1);
        let report = ErrorReport::from_error(SOURCE, error);
        error!(
            key = %key,
            request = %tracker.request,
            causes = ?report.messages,
            "Weave request failed"
        );

        self.bus.publish(WeaverEvent::RequestFailed {
            query: raw.to_string(),
            message: TANGLED_WEB.to_string(),
            request: tracker.request,
        });
        RequestOutcome::Failed { key }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::new(self.request_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn invariant(error: DomainError) -> Arc<AppError> {
    Arc::new(AppError::from(error))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::application::render::SectionRenderService;
    use crate::application::source::SourceError;
    use crate::bus::Envelope;
    use crate::domain::content::{ContentRecord, Section};

    struct SlowSource {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl ContentSource for SlowSource {
        async fn fetch(&self, key: &TopicKey) -> Result<ContentRecord, SourceError> {
            let delay = self
                .delays
                .lock()
                .expect("delay lock")
                .pop()
                .unwrap_or_default();
            tokio::time::sleep(delay).await;
            Ok(ContentRecord::new(
                key.display_title(),
                "meta",
                vec![Section::paragraph(key.as_str())],
            ))
        }
    }

    fn weaver_with_delays(delays: Vec<Duration>) -> (Arc<EventBus>, Weaver) {
        let bus = Arc::new(EventBus::new());
        let weaver = Weaver::new(
            Arc::clone(&bus),
            Arc::new(SlowSource {
                delays: Mutex::new(delays),
            }),
            Arc::new(SectionRenderService::new()),
            Arc::new(PageCache::default()),
        );
        (bus, weaver)
    }

    fn record_channel(bus: &EventBus, channel: Channel) -> Arc<Mutex<Vec<Envelope>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        bus.subscribe(channel, move |envelope| {
            sink.lock().expect("log lock").push(envelope.clone());
            Ok(())
        });
        log
    }

    #[tokio::test]
    async fn blank_queries_publish_nothing() {
        let (bus, weaver) = weaver_with_delays(Vec::new());
        let loading = record_channel(&bus, Channel::LoadingStarted);

        assert_eq!(weaver.process_request("   ").await, RequestOutcome::Ignored);
        assert!(loading.lock().expect("log lock").is_empty());
        assert!(weaver.cache().is_empty());
    }

    #[tokio::test]
    async fn superseded_render_is_not_published() {
        // Delays are popped from the back: the first request is slow.
        let (bus, weaver) =
            weaver_with_delays(vec![Duration::from_millis(1), Duration::from_millis(40)]);
        let renders = record_channel(&bus, Channel::RenderReady);

        let (slow, fast) = tokio::join!(
            weaver.process_request("slow topic"),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                weaver.process_request("fast topic").await
            }
        );

        assert!(matches!(slow, RequestOutcome::Resolved { .. }));
        assert!(matches!(fast, RequestOutcome::Resolved { .. }));

        let published: Vec<String> = renders
            .lock()
            .expect("log lock")
            .iter()
            .filter_map(|envelope| match &envelope.event {
                WeaverEvent::RenderReady { key, .. } => Some(key.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(published, vec!["fast topic"]);
        assert_eq!(weaver.cache().len(), 2);
    }

    #[test]
    fn attach_outside_runtime_fails_the_handler() {
        let (bus, weaver) = weaver_with_delays(Vec::new());
        let weaver = Arc::new(weaver);
        weaver.attach();

        let delivered = std::thread::spawn(move || {
            bus.publish(WeaverEvent::SearchRequested {
                query: "anything".into(),
            })
        })
        .join()
        .expect("publisher thread");

        assert_eq!(delivered, 0);
        assert_eq!(weaver.active_requests(), 0);
    }
}
