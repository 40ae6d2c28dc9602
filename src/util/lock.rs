//! Poison-tolerant `RwLock` access.
//!
//! Bus handlers run arbitrary user code under `catch_unwind`; a panic while a
//! guard is held must not take the bus or the page cache down with it.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), owner, op, "read")
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    owner: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), owner, op, "write")
}

fn recover<G>(
    result: LockResult<G>,
    owner: &'static str,
    op: &'static str,
    mode: &'static str,
) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            owner,
            op, mode, "Lock poisoned by an earlier panic; continuing with inner state"
        );
        poisoned.into_inner()
    })
}
