//! The registry of all measurements of one independent timing context.
//!
//! Measurements are identified by their group and name together; the same name may appear in
//! any number of groups. A measurement is created by the first [`MeasurementStore::start`] for
//! its key and lives until the store is reset.
//!
//! ```rust
//! use aeon::{MeasurementStore, DEFAULT_GROUP};
//!
//! let mut store = MeasurementStore::new();
//! store.start("load", "Config").unwrap();
//! // ...work...
//! store.start_next("parse", "Config").unwrap();
//! // ...more work...
//! store.stop_last().unwrap();
//!
//! assert_eq!(store.calls("load", "Config").unwrap(), 1);
//! assert!(!store.exists("load", DEFAULT_GROUP));
//! ```
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::Equivalent;
use log::debug;

use crate::clock::{Clock, MonotonicClock};
use crate::error::AeonError;
use crate::hashing::IndexMap;
use crate::measurement::Measurement;

/// The group used when the caller doesn't choose one.
pub const DEFAULT_GROUP: &str = "default";

/// The identity of a measurement within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeasurementKey {
    // Field order must match `KeyRef` so that both hash identically.
    pub group: String,
    pub name: String,
}

impl MeasurementKey {
    #[must_use]
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        MeasurementKey {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}::{}", self.group, self.name)
    }
}

/// A borrowed `MeasurementKey` for lookups that don't allocate.
#[derive(Hash)]
struct KeyRef<'a> {
    group: &'a str,
    name: &'a str,
}

impl Equivalent<MeasurementKey> for KeyRef<'_> {
    fn equivalent(&self, key: &MeasurementKey) -> bool {
        self.group == key.group && self.name == key.name
    }
}

/// Owns the measurements of one timing context and drives their start/stop transitions.
///
/// The store does no locking of its own. Share it between threads behind a `Mutex`.
#[derive(Debug)]
pub struct MeasurementStore {
    measurements: IndexMap<MeasurementKey, Measurement>,
    /// Index of the measurement started last, as long as it is still running. Measurements are
    /// only ever removed all at once, so indices stay valid until `reset` clears this too.
    last_started: Option<usize>,
    created_at: Instant,
    clock: Arc<dyn Clock>,
}

impl Default for MeasurementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementStore {
    /// Creates an empty store timed by the host's monotonic clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    /// Creates an empty store timed by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MeasurementStore {
            measurements: IndexMap::default(),
            last_started: None,
            created_at: clock.now(),
            clock,
        }
    }

    /// The instant the store was created or last reset.
    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub(crate) fn now(&self) -> Instant {
        self.clock.now()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Starts the measurement `name` of `group`, creating it if it doesn't exist yet. It becomes
    /// the last started measurement.
    ///
    /// Other measurements may keep running; starting one doesn't stop any other.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::InvalidState`] if the measurement is already running.
    pub fn start(&mut self, name: &str, group: &str) -> Result<(), AeonError> {
        let now = self.clock.now();
        let entry = self.measurements.entry(MeasurementKey::new(name, group));
        let index = entry.index();
        let measurement = entry.or_insert_with(|| {
            debug!("creating measurement '{group}::{name}'");
            Measurement::new(name, group)
        });
        measurement.start_at(now)?;
        self.last_started = Some(index);
        Ok(())
    }

    /// Stops the measurement `name` of `group`. If it was the last started measurement, no
    /// measurement is tracked as last started afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::UnknownMeasurement`] if the measurement was never started and
    /// [`AeonError::InvalidState`] if it isn't running.
    pub fn stop(&mut self, name: &str, group: &str) -> Result<(), AeonError> {
        let now = self.clock.now();
        let index = self.index_of(name, group)?;
        self.measurements[index].stop_at(now)?;
        if self.last_started == Some(index) {
            self.last_started = None;
        }
        Ok(())
    }

    /// Stops the measurement started last, so that sequential measurements started by hand don't
    /// need to repeat its name.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::NoMeasurementRunning`] if no measurement is tracked as last started.
    pub fn stop_last(&mut self) -> Result<(), AeonError> {
        let index = self.last_started.ok_or(AeonError::NoMeasurementRunning)?;
        let now = self.clock.now();
        self.measurements[index].stop_at(now)?;
        self.last_started = None;
        Ok(())
    }

    /// Stops the measurement started last and starts `name` of `group` in its place.
    ///
    /// Nothing changes if the call fails.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::NoMeasurementRunning`] if no measurement is tracked as last started
    /// and [`AeonError::InvalidState`] if `name` of `group` is a different measurement that is
    /// already running.
    pub fn start_next(&mut self, name: &str, group: &str) -> Result<(), AeonError> {
        let last = self.last_started.ok_or(AeonError::NoMeasurementRunning)?;
        if let Some(index) = self.measurements.get_index_of(&KeyRef { group, name }) {
            let next = &self.measurements[index];
            if index != last && next.is_running() {
                return Err(next.invalid_state());
            }
        }
        self.stop_last()?;
        self.start(name, group)
    }

    /// Returns the measurement `name` of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::UnknownMeasurement`] if the measurement was never started.
    pub fn get(&self, name: &str, group: &str) -> Result<&Measurement, AeonError> {
        let index = self.index_of(name, group)?;
        Ok(&self.measurements[index])
    }

    #[must_use]
    pub fn exists(&self, name: &str, group: &str) -> bool {
        self.measurements.contains_key(&KeyRef { group, name })
    }

    /// All measurements in the order they were first started.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Measurement> + '_ {
        self.measurements.values()
    }

    /// The measurement started last, if it is still running.
    #[must_use]
    pub fn last_started(&self) -> Option<&Measurement> {
        self.last_started.map(|index| &self.measurements[index])
    }

    /// Drops all measurements and restarts the wall clock.
    pub fn reset(&mut self) {
        debug!(
            "resetting measurement store with {} measurements",
            self.measurements.len()
        );
        self.measurements.clear();
        self.last_started = None;
        self.created_at = self.clock.now();
    }

    /// The number of calls to the measurement `name` of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::UnknownMeasurement`] if the measurement was never started.
    pub fn calls(&self, name: &str, group: &str) -> Result<usize, AeonError> {
        self.get(name, group).map(Measurement::calls)
    }

    /// The total runtime of the measurement `name` of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::UnknownMeasurement`] if the measurement was never started.
    pub fn time(&self, name: &str, group: &str) -> Result<Duration, AeonError> {
        self.get(name, group).map(Measurement::total_runtime)
    }

    /// The average runtime of one call to the measurement `name` of `group`.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::UnknownMeasurement`] if the measurement was never started.
    pub fn time_per_call(&self, name: &str, group: &str) -> Result<Duration, AeonError> {
        self.get(name, group)?.time_per_call()
    }

    fn index_of(&self, name: &str, group: &str) -> Result<usize, AeonError> {
        self.measurements
            .get_index_of(&KeyRef { group, name })
            .ok_or_else(|| {
                debug!(
                    "known measurements (in format group::name): [{}]",
                    self.measurements
                        .keys()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                AeonError::UnknownMeasurement {
                    name: name.to_string(),
                    group: group.to_string(),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store_with_manual_clock() -> (MeasurementStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (MeasurementStore::with_clock(clock.clone()), clock)
    }

    #[test]
    fn start_creates_and_runs_measurement() {
        let mut store = MeasurementStore::new();
        store.start("one", "test_series").unwrap();

        let measurement = store.get("one", "test_series").unwrap();
        assert!(measurement.is_running());
        assert_eq!(measurement.calls(), 1);
        assert_eq!(store.last_started().map(Measurement::name), Some("one"));
    }

    #[test]
    fn start_then_stop_records_one_call_and_elapsed_time() {
        let (mut store, clock) = store_with_manual_clock();
        store.start("one", "test_series").unwrap();
        clock.advance(Duration::from_millis(30));
        store.stop("one", "test_series").unwrap();

        let measurement = store.get("one", "test_series").unwrap();
        assert!(!measurement.is_running());
        assert_eq!(measurement.calls(), 1);
        assert_eq!(measurement.total_runtime(), Duration::from_millis(30));
        assert!(store.last_started().is_none());
    }

    #[test]
    fn restarting_a_stopped_measurement_accumulates() {
        let (mut store, clock) = store_with_manual_clock();
        for _ in 0..3 {
            store.start("tick", DEFAULT_GROUP).unwrap();
            clock.advance(Duration::from_millis(10));
            store.stop("tick", DEFAULT_GROUP).unwrap();
            clock.advance(Duration::from_millis(5));
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.calls("tick", DEFAULT_GROUP).unwrap(), 3);
        assert_eq!(
            store.time("tick", DEFAULT_GROUP).unwrap(),
            Duration::from_millis(30)
        );
        assert_eq!(
            store.time_per_call("tick", DEFAULT_GROUP).unwrap(),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn double_start_is_invalid_state_and_changes_nothing() {
        let (mut store, clock) = store_with_manual_clock();
        store.start("one", DEFAULT_GROUP).unwrap();
        clock.advance(Duration::from_millis(5));

        let result = store.start("one", DEFAULT_GROUP);
        assert!(matches!(
            result,
            Err(AeonError::InvalidState { running: true, .. })
        ));
        let measurement = store.get("one", DEFAULT_GROUP).unwrap();
        assert_eq!(measurement.calls(), 1);
        assert_eq!(measurement.total_runtime(), Duration::ZERO);
        assert!(measurement.is_running());
    }

    #[test]
    fn stopping_unknown_measurement_fails() {
        let mut store = MeasurementStore::new();
        match store.stop("one", "test_series") {
            Err(AeonError::UnknownMeasurement { name, group }) => {
                assert_eq!(name, "one");
                assert_eq!(group, "test_series");
            }
            other => panic!("expected UnknownMeasurement, got {other:?}"),
        }
    }

    #[test]
    fn stopping_twice_is_invalid_state() {
        let mut store = MeasurementStore::new();
        store.start("one", DEFAULT_GROUP).unwrap();
        store.stop("one", DEFAULT_GROUP).unwrap();
        assert!(matches!(
            store.stop("one", DEFAULT_GROUP),
            Err(AeonError::InvalidState { running: false, .. })
        ));
    }

    #[test]
    fn group_is_part_of_identity() {
        let mut store = MeasurementStore::new();
        store.start("run", "Alpha").unwrap();
        store.start("run", "Beta").unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.exists("run", "Alpha"));
        assert!(store.exists("run", "Beta"));
        assert!(!store.exists("run", DEFAULT_GROUP));
        assert!(matches!(
            store.get("run", DEFAULT_GROUP),
            Err(AeonError::UnknownMeasurement { .. })
        ));
    }

    #[test]
    fn separator_in_names_does_not_collide() {
        let mut store = MeasurementStore::new();
        store.start("b::c", "a").unwrap();
        store.start("c", "a::b").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn there_is_a_default_group() {
        let mut store = MeasurementStore::new();
        store.start("one", DEFAULT_GROUP).unwrap();
        assert_eq!(store.get("one", "default").unwrap().group(), "default");
    }

    #[test]
    fn stop_last_without_running_measurement_fails() {
        let mut store = MeasurementStore::new();
        assert!(matches!(
            store.stop_last(),
            Err(AeonError::NoMeasurementRunning)
        ));
    }

    #[test]
    fn stop_last_stops_the_last_started_measurement() {
        let mut store = MeasurementStore::new();
        store.start("a", DEFAULT_GROUP).unwrap();
        store.stop_last().unwrap();
        assert!(matches!(
            store.stop("a", DEFAULT_GROUP),
            Err(AeonError::InvalidState { running: false, .. })
        ));
        assert!(matches!(
            store.stop_last(),
            Err(AeonError::NoMeasurementRunning)
        ));
    }

    #[test]
    fn start_next_stops_last_and_starts_next() {
        let (mut store, clock) = store_with_manual_clock();
        store.start("a", DEFAULT_GROUP).unwrap();
        clock.advance(Duration::from_millis(7));
        store.start_next("b", DEFAULT_GROUP).unwrap();

        let a = store.get("a", DEFAULT_GROUP).unwrap();
        assert!(!a.is_running());
        assert_eq!(a.total_runtime(), Duration::from_millis(7));
        assert!(store.get("b", DEFAULT_GROUP).unwrap().is_running());
        assert_eq!(store.last_started().map(Measurement::name), Some("b"));
        assert!(matches!(
            store.stop("a", DEFAULT_GROUP),
            Err(AeonError::InvalidState { .. })
        ));
    }

    #[test]
    fn start_next_requires_a_last_started_measurement() {
        let mut store = MeasurementStore::new();
        assert!(matches!(
            store.start_next("two", DEFAULT_GROUP),
            Err(AeonError::NoMeasurementRunning)
        ));
        assert!(!store.exists("two", DEFAULT_GROUP));
    }

    #[test]
    fn start_next_into_another_running_measurement_changes_nothing() {
        let mut store = MeasurementStore::new();
        store.start("one", DEFAULT_GROUP).unwrap();
        store.start("two", DEFAULT_GROUP).unwrap();

        assert!(matches!(
            store.start_next("one", DEFAULT_GROUP),
            Err(AeonError::InvalidState { running: true, .. })
        ));
        assert!(store.get("one", DEFAULT_GROUP).unwrap().is_running());
        assert!(store.get("two", DEFAULT_GROUP).unwrap().is_running());
        assert_eq!(store.last_started().map(Measurement::name), Some("two"));
    }

    #[test]
    fn start_next_can_restart_the_last_measurement() {
        let mut store = MeasurementStore::new();
        store.start("loop", DEFAULT_GROUP).unwrap();
        store.start_next("loop", DEFAULT_GROUP).unwrap();
        let measurement = store.get("loop", DEFAULT_GROUP).unwrap();
        assert!(measurement.is_running());
        assert_eq!(measurement.calls(), 2);
    }

    #[test]
    fn more_than_one_measurement_can_run_at_the_same_time() {
        let mut store = MeasurementStore::new();
        store.start("one", DEFAULT_GROUP).unwrap();
        store.start("two", DEFAULT_GROUP).unwrap();
        assert!(store.get("one", DEFAULT_GROUP).unwrap().is_running());
        assert!(store.get("two", DEFAULT_GROUP).unwrap().is_running());

        store.stop_last().unwrap();
        assert!(!store.get("two", DEFAULT_GROUP).unwrap().is_running());
        store.stop("one", DEFAULT_GROUP).unwrap();
    }

    #[test]
    fn stopping_another_measurement_keeps_last_started() {
        let mut store = MeasurementStore::new();
        store.start("outer", DEFAULT_GROUP).unwrap();
        store.start("inner", DEFAULT_GROUP).unwrap();
        store.stop("outer", DEFAULT_GROUP).unwrap();
        assert_eq!(store.last_started().map(Measurement::name), Some("inner"));
        store.stop_last().unwrap();
        assert!(!store.get("inner", DEFAULT_GROUP).unwrap().is_running());
    }

    #[test]
    fn all_lists_measurements_in_insertion_order() {
        let mut store = MeasurementStore::new();
        for name in ["zeta", "alpha", "mid"] {
            store.start(name, DEFAULT_GROUP).unwrap();
            store.stop(name, DEFAULT_GROUP).unwrap();
        }
        store.start("alpha", DEFAULT_GROUP).unwrap();
        let names: Vec<_> = store.all().map(Measurement::name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn reset_clears_everything_and_restamps_creation() {
        let (mut store, clock) = store_with_manual_clock();
        let created = store.created_at();
        store.start("foo", DEFAULT_GROUP).unwrap();
        clock.advance(Duration::from_secs(2));

        store.reset();
        assert!(store.is_empty());
        assert!(!store.exists("foo", DEFAULT_GROUP));
        assert!(store.last_started().is_none());
        assert_eq!(store.created_at() - created, Duration::from_secs(2));
        assert!(matches!(
            store.stop_last(),
            Err(AeonError::NoMeasurementRunning)
        ));

        // Idempotent, and the store is usable afterwards.
        store.reset();
        store.start("foo", DEFAULT_GROUP).unwrap();
        assert_eq!(store.calls("foo", DEFAULT_GROUP).unwrap(), 1);
    }

    #[test]
    fn queries_on_unknown_measurements_fail() {
        let store = MeasurementStore::new();
        assert!(matches!(
            store.calls("nope", DEFAULT_GROUP),
            Err(AeonError::UnknownMeasurement { .. })
        ));
        assert!(matches!(
            store.time("nope", DEFAULT_GROUP),
            Err(AeonError::UnknownMeasurement { .. })
        ));
        assert!(matches!(
            store.time_per_call("nope", DEFAULT_GROUP),
            Err(AeonError::UnknownMeasurement { .. })
        ));
    }

    #[test]
    fn store_remains_usable_after_errors() {
        let mut store = MeasurementStore::new();
        assert!(store.stop("ghost", DEFAULT_GROUP).is_err());
        assert!(store.stop_last().is_err());
        store.start("real", DEFAULT_GROUP).unwrap();
        assert!(store.start("real", DEFAULT_GROUP).is_err());
        store.stop("real", DEFAULT_GROUP).unwrap();
        assert_eq!(store.calls("real", DEFAULT_GROUP).unwrap(), 1);
    }

    #[test]
    fn key_displays_group_then_name() {
        assert_eq!(MeasurementKey::new("parse", "Parser").to_string(), "Parser::parse");
    }
}
