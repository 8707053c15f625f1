//! The process-wide default store.
//!
//! Scoped timers and `#[timed]` functions record here unless told to use another store. The
//! store is created on first use, lives as long as the process and is shared by all threads
//! behind a mutex. [`reset_default_store`] returns it to its empty state.
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::store::MeasurementStore;

static DEFAULT_STORE: OnceLock<Mutex<MeasurementStore>> = OnceLock::new();

/// A handle to the process-wide default store, usable wherever a
/// [`TimingTarget`](crate::TimingTarget) is expected.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStore;

/// Acquires an exclusive lock on the default store, blocking until it's available.
///
/// Don't hold on to the guard while timing code against the default store, or the timer will
/// wait for the lock forever.
pub fn default_store() -> MutexGuard<'static, MeasurementStore> {
    DEFAULT_STORE
        .get_or_init(|| Mutex::new(MeasurementStore::new()))
        .lock()
        // The store is consistent after every call, so a panic elsewhere can't corrupt it.
        .unwrap_or_else(PoisonError::into_inner)
}

/// Drops all measurements of the default store and restarts its wall clock.
pub fn reset_default_store() {
    default_store().reset();
}

/// Prints a report of the default store listing the `max_items` slowest measurements.
pub fn print_report(max_items: usize) {
    let report = default_store().report(max_items);
    println!("{report}");
}
