//! Call counts and wall-clock runtime for designated pieces of code.
//!
//! Aeon is a lightweight instrumentation registry. Code is timed by name, a *measurement* per
//! `(group, name)` pair accumulates how often that code ran and for how long, and a report
//! summarizes the slowest measurements and how the process' wall time divides up among groups.
//!
//! There are three ways to time code:
//! * Start and stop measurements explicitly on a [`MeasurementStore`], for example
//!   `default_store().start("parse", "Parser")`. [`MeasurementStore::stop_last`] and
//!   [`MeasurementStore::start_next`] support timing consecutive sections with little ceremony.
//! * Hold a [`TimedGuard`] for the duration of a scope, see [`timed_scope`] and [`measure`].
//!   The measurement is stopped however the scope is left.
//! * Annotate a function or method with `#[timed]`. Free functions are grouped by the last
//!   segment of their module path, methods by the name of their `Self` type.
//!
//! ```rust
//! use aeon::{default_store, timed};
//!
//! struct Parser;
//!
//! impl Parser {
//!     #[timed]
//!     fn parse(&self, input: &str) -> usize {
//!         input.split_whitespace().count()
//!     }
//! }
//!
//! let parser = Parser;
//! assert_eq!(parser.parse("two words"), 2);
//! assert_eq!(default_store().calls("parse", "Parser").unwrap(), 1);
//! println!("{}", default_store().report(10));
//! ```
//!
//! Most programs only need the process-wide [`default_store`]. Independent stores, each with
//! their own wall clock, are created with [`MeasurementStore::new`] and can be handed to guards
//! and `#[timed(store = ...)]` when wrapped in a `Mutex` or `RefCell`.
// Lets `#[timed]` refer to `::aeon` from inside this crate as well.
extern crate self as aeon;

pub mod clock;
pub mod error;
pub mod file;
pub mod global;
pub mod guard;
pub mod hashing;
pub mod log;
pub mod measurement;
pub mod numeric;
pub mod options;
pub mod report;
pub mod store;

pub use aeon_derive::timed;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::AeonError;
pub use file::write_report_to_file;
pub use global::{default_store, print_report, reset_default_store, DefaultStore};
pub use guard::{measure, timed_scope, timed_scope_default, TimedGuard, TimingTarget};
pub use measurement::Measurement;
pub use options::ReportOptions;
pub use report::{GroupTiming, MeasurementRow, Report, DEFAULT_MAX_ITEMS};
pub use store::{MeasurementKey, MeasurementStore, DEFAULT_GROUP};
