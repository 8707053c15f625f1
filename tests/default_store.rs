//! Exercises the process-wide store end to end. These tests reset the default store, so they
//! live in their own test binary and run one at a time.
use std::sync::{LazyLock, Mutex, MutexGuard};

use aeon::{
    default_store, print_report, reset_default_store, timed, timed_scope, timed_scope_default,
    AeonError, ReportOptions, DEFAULT_GROUP,
};
use tempfile::TempDir;

static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

fn serial() -> MutexGuard<'static, ()> {
    let guard = TEST_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    reset_default_store();
    guard
}

#[timed]
fn step() {}

struct Pipeline;

impl Pipeline {
    #[timed]
    fn run(&self) {
        step();
        step();
    }
}

#[test]
fn everything_records_to_the_default_store() {
    let _serial = serial();

    Pipeline.run();
    {
        let _scope = timed_scope("scope", "default_store").unwrap();
    }
    {
        let _scope = timed_scope_default("unnamed_group_scope").unwrap();
    }
    default_store().start("manual", DEFAULT_GROUP).unwrap();
    default_store().stop_last().unwrap();

    let store = default_store();
    assert_eq!(store.len(), 5);
    assert_eq!(store.calls("run", "Pipeline").unwrap(), 1);
    assert_eq!(store.calls("step", "default_store").unwrap(), 2);
    assert_eq!(store.calls("scope", "default_store").unwrap(), 1);
    assert_eq!(store.calls("unnamed_group_scope", DEFAULT_GROUP).unwrap(), 1);
    assert!(store.all().all(|m| !m.is_running()));
    assert!(store.last_started().is_none());
}

#[test]
fn reset_forgets_measurements() {
    let _serial = serial();

    step();
    assert!(default_store().exists("step", "default_store"));

    reset_default_store();
    let store = default_store();
    assert!(store.is_empty());
    assert!(store.last_started().is_none());
    assert!(matches!(
        store.calls("step", "default_store"),
        Err(AeonError::UnknownMeasurement { .. })
    ));
}

#[test]
fn scope_outliving_a_reset_is_not_fatal() {
    let _serial = serial();

    let scope = timed_scope("orphan", DEFAULT_GROUP).unwrap();
    reset_default_store();
    assert!(matches!(
        scope.finish(),
        Err(AeonError::UnknownMeasurement { .. })
    ));

    {
        let _scope = timed_scope("orphan", DEFAULT_GROUP).unwrap();
        reset_default_store();
    }
    assert!(default_store().is_empty());
}

#[test]
fn reports_of_the_default_store() {
    let _serial = serial();

    Pipeline.run();
    print_report(2);

    let text = default_store().to_string();
    assert!(text.contains("Pipeline"));
    assert!(text.contains("step"));

    let report = default_store().report(1);
    assert_eq!(report.measurements.len(), 1);
    assert_eq!(report.groups.len(), 3);
    let total_share: f64 = report.groups.iter().map(|g| g.share).sum();
    assert!((total_share - 100.0).abs() < 1e-6);

    let temp_dir = TempDir::new().unwrap();
    let mut options = ReportOptions::new();
    options.directory(temp_dir.path()).file_prefix("e2e_");
    let path = default_store().write_report(&options).unwrap();
    assert!(path.exists());
    assert!(matches!(
        default_store().write_report(&options),
        Err(AeonError::OutputFileExists(_))
    ));
}
