//! Wall-clock seam.
//!
//! The orchestrator timestamps cache entries and stamps rendered pages with
//! the current date; both go through [`Clock`] so staleness can be exercised
//! without waiting a week.

use time::OffsetDateTime;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
