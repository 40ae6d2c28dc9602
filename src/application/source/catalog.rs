use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SourceSettings;
use crate::domain::content::ContentRecord;
use crate::domain::topic::TopicKey;

use super::{ContentSource, SourceError};

const BUILTIN_CATALOG: &str = include_str!("../../../data/catalog.json");
const BUILTIN_ORIGIN: &str = "builtin";

#[derive(Debug, Deserialize)]
struct RawCatalog {
    default: ContentRecord,
    #[serde(default)]
    topics: BTreeMap<String, ContentRecord>,
}

/// Static topic table plus the record served for everything else.
#[derive(Debug, Clone)]
pub struct Catalog {
    default: ContentRecord,
    topics: HashMap<TopicKey, ContentRecord>,
}

impl Catalog {
    pub fn new(default: ContentRecord, topics: HashMap<TopicKey, ContentRecord>) -> Self {
        Self { default, topics }
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, SourceError> {
        Self::from_json(BUILTIN_ORIGIN, BUILTIN_CATALOG)
    }

    /// Parse a catalog document. Topic keys are normalized on load; keys that
    /// normalize to nothing or collide with another key are rejected.
    pub fn from_json(origin: &str, json: &str) -> Result<Self, SourceError> {
        let raw: RawCatalog = serde_json::from_str(json)
            .map_err(|err| SourceError::invalid_catalog(origin, err.to_string()))?;

        let mut topics = HashMap::with_capacity(raw.topics.len());
        for (raw_key, record) in raw.topics {
            let key = TopicKey::normalize(&raw_key).ok_or_else(|| {
                SourceError::invalid_catalog(origin, "topic keys must not be blank")
            })?;
            if topics.insert(key.clone(), record).is_some() {
                return Err(SourceError::invalid_catalog(
                    origin,
                    format!("topic `{key}` is defined more than once"),
                ));
            }
        }

        debug!(origin, topics = topics.len(), "Catalog parsed");
        Ok(Self::new(raw.default, topics))
    }

    pub async fn from_path(path: &Path) -> Result<Self, SourceError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_json(&path.display().to_string(), &json)?;
        info!(path = %path.display(), topics = catalog.len(), "Loaded catalog file");
        Ok(catalog)
    }

    /// Exact match, or the default record titled after the key.
    pub fn lookup(&self, key: &TopicKey) -> ContentRecord {
        match self.topics.get(key) {
            Some(record) => record.clone(),
            None => self.default.clone().with_title(key.display_title()),
        }
    }

    pub fn contains(&self, key: &TopicKey) -> bool {
        self.topics.contains_key(key)
    }

    /// Known topic keys, sorted.
    pub fn topics(&self) -> Vec<TopicKey> {
        let mut keys: Vec<TopicKey> = self.topics.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn default_record(&self) -> &ContentRecord {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Inclusive range of simulated fetch delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    min_ms: u64,
    max_ms: u64,
}

impl LatencyProfile {
    /// Bounds given in the wrong order are swapped.
    pub fn new(min: Duration, max: Duration) -> Self {
        let min_ms = duration_millis(min);
        let max_ms = duration_millis(max);
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub const fn none() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let millis = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(millis)
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl From<&SourceSettings> for LatencyProfile {
    fn from(settings: &SourceSettings) -> Self {
        Self::new(settings.latency_min, settings.latency_max)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// [`ContentSource`] backed by a [`Catalog`], sleeping for a sampled delay
/// before every answer. Never fails.
pub struct CatalogSource {
    catalog: Arc<Catalog>,
    latency: LatencyProfile,
}

impl CatalogSource {
    pub fn new(catalog: Arc<Catalog>, latency: LatencyProfile) -> Self {
        Self { catalog, latency }
    }
}

#[async_trait]
impl ContentSource for CatalogSource {
    async fn fetch(&self, key: &TopicKey) -> Result<ContentRecord, SourceError> {
        let delay = self.latency.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let record = self.catalog.lookup(key);
        debug!(
            key = %key,
            matched = self.catalog.contains(key),
            delay_ms = duration_millis(delay),
            sections = record.sections.len(),
            "Catalog fetch resolved"
        );
        Ok(record)
    }
}
