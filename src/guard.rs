//! Scoped timing: start a measurement now and stop it when the scope ends.
//!
//! A [`TimedGuard`] starts its measurement when created and stops it when dropped, so the
//! measurement is stopped on every way out of the scope: falling off the end, an early
//! `return`, `?` propagating an error, or a panic unwinding through it.
//!
//! ```rust
//! use aeon::{default_store, timed_scope};
//!
//! fn complicated_function() {
//!     let _timer = timed_scope("complicated_function", "docs").unwrap();
//!     // Complicated control flow here, maybe with lots of `return` points.
//! } // `_timer` goes out of scope, the measurement is stopped.
//!
//! complicated_function();
//! assert_eq!(default_store().calls("complicated_function", "docs").unwrap(), 1);
//! ```
//!
//! Guards work with any store that can be reached through a shared reference, see
//! [`TimingTarget`]. The `#[timed]` attribute expands to a guard around the function body.
use std::cell::RefCell;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use log::error;

use crate::error::AeonError;
use crate::global::{default_store, DefaultStore};
use crate::store::{MeasurementStore, DEFAULT_GROUP};

/// A store reachable through a shared reference, which scoped timers record to.
///
/// Implementations only hold on to the store for the duration of `with_store`, never while the
/// timed code runs, so timed code may use the same store itself.
pub trait TimingTarget {
    fn with_store<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R;
}

impl TimingTarget for DefaultStore {
    fn with_store<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R {
        f(&mut default_store())
    }
}

impl TimingTarget for Mutex<MeasurementStore> {
    fn with_store<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R {
        f(&mut self.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// # Panics
///
/// Panics if the store is already borrowed when a timer starts or stops.
impl TimingTarget for RefCell<MeasurementStore> {
    fn with_store<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}

impl<T: TimingTarget, F: FnOnce() -> T> TimingTarget for LazyLock<T, F> {
    fn with_store<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R {
        LazyLock::force(self).with_store(f)
    }
}

impl<T: TimingTarget> TimingTarget for &T {
    fn with_store<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R {
        (**self).with_store(f)
    }
}

impl<T: TimingTarget> TimingTarget for Arc<T> {
    fn with_store<R>(&self, f: impl FnOnce(&mut MeasurementStore) -> R) -> R {
        self.as_ref().with_store(f)
    }
}

/// Keeps a measurement running for as long as it lives.
#[must_use = "the measurement stops as soon as the guard is dropped"]
pub struct TimedGuard<'a, T: TimingTarget> {
    target: &'a T,
    name: String,
    group: String,
    stopped: bool,
}

impl<'a, T: TimingTarget> TimedGuard<'a, T> {
    /// Starts the measurement `name` of `group` in `target`.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::InvalidState`] if the measurement is already running, for example
    /// because a timed function calls itself.
    pub fn start(
        target: &'a T,
        name: impl Into<String>,
        group: impl Into<String>,
    ) -> Result<Self, AeonError> {
        let name = name.into();
        let group = group.into();
        target.with_store(|store| store.start(&name, &group))?;
        Ok(TimedGuard {
            target,
            name,
            group,
            stopped: false,
        })
    }

    /// Like [`TimedGuard::start`] for callers that can't return the error.
    ///
    /// # Panics
    ///
    /// Panics if the measurement can't be started.
    pub fn enter(target: &'a T, name: impl Into<String>, group: impl Into<String>) -> Self {
        match Self::start(target, name, group) {
            Ok(guard) => guard,
            Err(error) => panic!("{error}"),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Stops the measurement before the end of the scope. Unlike dropping the guard, this
    /// reports a failure to stop, such as the store having been reset in the meantime.
    ///
    /// # Errors
    ///
    /// Returns the error of [`MeasurementStore::stop`].
    pub fn finish(mut self) -> Result<(), AeonError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), AeonError> {
        self.stopped = true;
        self.target
            .with_store(|store| store.stop(&self.name, &self.group))
    }
}

impl<T: TimingTarget> Drop for TimedGuard<'_, T> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        if let Err(error) = self.stop() {
            error!("failed to stop timed scope: {error}");
        }
    }
}

/// Starts the measurement `name` of `group` in the default store and stops it when the returned
/// guard is dropped.
///
/// # Errors
///
/// Returns [`AeonError::InvalidState`] if the measurement is already running.
pub fn timed_scope(
    name: impl Into<String>,
    group: impl Into<String>,
) -> Result<TimedGuard<'static, DefaultStore>, AeonError> {
    TimedGuard::start(&DefaultStore, name, group)
}

/// Like [`timed_scope`] in the default group.
///
/// # Errors
///
/// Returns [`AeonError::InvalidState`] if the measurement is already running.
pub fn timed_scope_default(
    name: impl Into<String>,
) -> Result<TimedGuard<'static, DefaultStore>, AeonError> {
    timed_scope(name, DEFAULT_GROUP)
}

/// Runs `f` as the measurement `name` of `group` in `target` and returns its result.
///
/// If `f` panics, the measurement is stopped and the panic continues unchanged.
///
/// # Errors
///
/// Returns [`AeonError::InvalidState`] if the measurement is already running, in which case `f`
/// doesn't run, or the error of stopping the measurement after `f` returned.
pub fn measure<T: TimingTarget, R>(
    target: &T,
    name: impl Into<String>,
    group: impl Into<String>,
    f: impl FnOnce() -> R,
) -> Result<R, AeonError> {
    let guard = TimedGuard::start(target, name, group)?;
    let result = f();
    guard.finish()?;
    Ok(result)
}

/// The group of a free function: the last segment of its module path.
#[doc(hidden)]
#[must_use]
pub fn module_group(module_path: &'static str) -> &'static str {
    module_path.rsplit("::").next().unwrap_or(module_path)
}

/// The group of a method: the bare name of its `Self` type, without path or generics.
#[doc(hidden)]
#[must_use]
pub fn type_group(type_name: &'static str) -> &'static str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}
