#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use weaver::application::render::SectionRenderService;
use weaver::application::source::{Catalog, ContentSource, SourceError};
use weaver::application::weaver::Weaver;
use weaver::bus::{Channel, Envelope, EventBus, WeaverEvent};
use weaver::cache::{CacheConfig, PageCache};
use weaver::domain::content::ContentRecord;
use weaver::domain::topic::TopicKey;
use weaver::util::clock::Clock;

/// Built-in catalog lookups with a fixed delay and a call counter.
pub struct CountingSource {
    catalog: Catalog,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn new(delay: Duration) -> Self {
        Self {
            catalog: Catalog::builtin().expect("builtin catalog should parse"),
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for CountingSource {
    async fn fetch(&self, key: &TopicKey) -> Result<ContentRecord, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.catalog.lookup(key))
    }
}

pub struct FailingSource;

#[async_trait]
impl ContentSource for FailingSource {
    async fn fetch(&self, _key: &TopicKey) -> Result<ContentRecord, SourceError> {
        Err(SourceError::unavailable("simulated outage"))
    }
}

pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: time::Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().expect("clock lock")
    }
}

pub struct Harness {
    pub bus: Arc<EventBus>,
    pub weaver: Arc<Weaver>,
    pub events: Arc<Mutex<Vec<WeaverEvent>>>,
}

impl Harness {
    pub fn new(source: Arc<dyn ContentSource>, cache: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let bus = Arc::new(EventBus::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        for channel in Channel::ALL {
            let sink = Arc::clone(&events);
            bus.subscribe(channel, move |envelope: &Envelope| {
                sink.lock()
                    .expect("event log lock")
                    .push(envelope.event.clone());
                Ok(())
            });
        }

        let weaver = Weaver::new(
            Arc::clone(&bus),
            source,
            Arc::new(SectionRenderService::new()),
            Arc::new(PageCache::new(cache)),
        )
        .with_clock(clock);

        Self {
            bus,
            weaver: Arc::new(weaver),
            events,
        }
    }

    pub fn events(&self) -> Vec<WeaverEvent> {
        self.events.lock().expect("event log lock").clone()
    }

    pub fn library_updates(&self) -> Vec<Vec<String>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                WeaverEvent::LibraryChanged { keys } => {
                    Some(keys.iter().map(ToString::to_string).collect())
                }
                _ => None,
            })
            .collect()
    }

    pub fn renders(&self) -> Vec<(String, bool)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                WeaverEvent::RenderReady {
                    key, from_cache, ..
                } => Some((key.to_string(), from_cache)),
                _ => None,
            })
            .collect()
    }
}
