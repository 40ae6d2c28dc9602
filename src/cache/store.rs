//! Cache storage.
//!
//! Entries are never mutated after insertion; a re-fetch replaces the whole
//! entry while keeping the key's original position in the library order.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use metrics::counter;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::domain::content::ContentRecord;
use crate::domain::topic::TopicKey;
use crate::util::lock::{rw_read, rw_write};

use super::config::CacheConfig;

const SOURCE: &str = "cache::store";

const METRIC_CACHE_HIT: &str = "weaver_cache_hit_total";
const METRIC_CACHE_MISS: &str = "weaver_cache_miss_total";
const METRIC_CACHE_STALE: &str = "weaver_cache_stale_total";

/// A woven page: rendered markup plus the record it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
    pub key: TopicKey,
    pub html: Arc<str>,
    pub record: ContentRecord,
    pub created_at: OffsetDateTime,
}

impl CachedPage {
    pub fn new(
        key: TopicKey,
        html: impl Into<Arc<str>>,
        record: ContentRecord,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            key,
            html: html.into(),
            record,
            created_at,
        }
    }

    pub fn age(&self, now: OffsetDateTime) -> Duration {
        now - self.created_at
    }
}

#[derive(Debug, Clone)]
pub enum CacheLookup {
    Fresh(Arc<CachedPage>),
    /// Present but older than the staleness window; callers should re-fetch.
    Stale(Arc<CachedPage>),
    Missing,
}

#[derive(Default)]
struct Entries {
    pages: HashMap<TopicKey, Arc<CachedPage>>,
    order: Vec<TopicKey>,
}

/// In-memory page store owned by the orchestrator.
pub struct PageCache {
    config: CacheConfig,
    entries: RwLock<Entries>,
}

impl PageCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(Entries::default()),
        }
    }

    /// Look up `key`, classifying the entry against the staleness window at `now`.
    pub fn lookup(&self, key: &TopicKey, now: OffsetDateTime) -> CacheLookup {
        let page = rw_read(&self.entries, SOURCE, "lookup")
            .pages
            .get(key)
            .cloned();

        match page {
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                CacheLookup::Missing
            }
            Some(page) => match self.config.stale_after() {
                Some(limit) if page.age(now) >= limit => {
                    counter!(METRIC_CACHE_STALE).increment(1);
                    debug!(
                        key = %key,
                        age_seconds = page.age(now).whole_seconds(),
                        "Cache entry is stale"
                    );
                    CacheLookup::Stale(page)
                }
                _ => {
                    counter!(METRIC_CACHE_HIT).increment(1);
                    CacheLookup::Fresh(page)
                }
            },
        }
    }

    /// Raw read without the staleness check.
    pub fn get(&self, key: &TopicKey) -> Option<Arc<CachedPage>> {
        rw_read(&self.entries, SOURCE, "get").pages.get(key).cloned()
    }

    /// Store `page`, replacing any previous entry for the same key.
    pub fn insert(&self, page: CachedPage) -> Arc<CachedPage> {
        let page = Arc::new(page);
        let mut entries = rw_write(&self.entries, SOURCE, "insert");
        if entries
            .pages
            .insert(page.key.clone(), Arc::clone(&page))
            .is_none()
        {
            entries.order.push(page.key.clone());
        }
        page
    }

    /// Every cached key, in first-insertion order.
    pub fn keys(&self) -> Vec<TopicKey> {
        rw_read(&self.entries, SOURCE, "keys").order.clone()
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
