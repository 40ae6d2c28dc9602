use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::counter;
use tracing::debug;

use crate::domain::topic::TopicKey;

const METRIC_INFLIGHT_JOINED: &str = "weaver_inflight_joined_total";

/// How a caller took part in a [`InFlight::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participation {
    /// Started the work.
    Leader,
    /// Joined work another caller had already started.
    Follower,
}

/// Registry of work currently running per topic key.
///
/// At most one unit of work per key is in flight; callers arriving while it
/// runs await the same shared future and receive a clone of its output. The
/// entry is removed when the leader finishes (or is dropped), so a later call
/// starts fresh work.
pub struct InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    tasks: Arc<DashMap<TopicKey, Shared<BoxFuture<'static, T>>>>,
}

impl<T> InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// Run `work` for `key`, or join the run already in flight.
    ///
    /// `work` is only invoked when this caller becomes the leader.
    pub async fn run<F, Fut>(&self, key: &TopicKey, work: F) -> (T, Participation)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (shared, guard) = match self.tasks.entry(key.clone()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), None),
            Entry::Vacant(vacant) => {
                let shared = work().boxed().shared();
                vacant.insert(shared.clone());
                let guard = InFlightGuard {
                    key: key.clone(),
                    tasks: Arc::clone(&self.tasks),
                };
                (shared, Some(guard))
            }
        };

        let participation = if guard.is_some() {
            Participation::Leader
        } else {
            counter!(METRIC_INFLIGHT_JOINED).increment(1);
            debug!(key = %key, "Joined in-flight work");
            Participation::Follower
        };

        let output = shared.await;
        drop(guard);
        (output, participation)
    }

    /// Number of keys with work currently running.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<T> Default for InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

struct InFlightGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    key: TopicKey,
    tasks: Arc<DashMap<TopicKey, Shared<BoxFuture<'static, T>>>>,
}

impl<T> Drop for InFlightGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.tasks.remove(&self.key);
    }
}
