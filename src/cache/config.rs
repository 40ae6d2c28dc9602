//! Cache configuration.

use time::Duration;

const DEFAULT_STALE_AFTER_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Age after which an entry is re-fetched on read. Zero disables staleness.
    pub stale_after_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_after_seconds: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            stale_after_seconds: settings.stale_after_seconds,
        }
    }
}

impl CacheConfig {
    /// Returns `None` when entries never go stale.
    pub fn stale_after(&self) -> Option<Duration> {
        if self.stale_after_seconds == 0 {
            return None;
        }
        let seconds = i64::try_from(self.stale_after_seconds).unwrap_or(i64::MAX);
        Some(Duration::seconds(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_week() {
        let config = CacheConfig::default();
        assert_eq!(config.stale_after(), Some(Duration::days(7)));
    }

    #[test]
    fn zero_disables_staleness() {
        let config = CacheConfig {
            stale_after_seconds: 0,
        };
        assert_eq!(config.stale_after(), None);
    }

    #[test]
    fn oversized_values_saturate() {
        let config = CacheConfig {
            stale_after_seconds: u64::MAX,
        };
        assert_eq!(config.stale_after(), Some(Duration::seconds(i64::MAX)));
    }
}
