//! Page cache for woven topics.
//!
//! - [`PageCache`]: rendered markup plus its source record, keyed by
//!   normalized topic, with a read-time staleness check
//! - [`InFlight`]: collapses concurrent work for the same key so only one
//!   fetch and render runs at a time
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! stale_after_seconds = 604800  # 7 days; 0 keeps entries forever
//! ```

mod config;
mod inflight;
mod store;

pub use config::CacheConfig;
pub use inflight::{InFlight, Participation};
pub use store::{CacheLookup, CachedPage, PageCache};
