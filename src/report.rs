//! Aggregates over a store and their rendering as a ranked text report.
//!
//! Nothing here has state of its own. A [`Report`] is a snapshot computed from the store at one
//! instant, so its numbers are consistent with each other even while measurements keep running.
//!
//! ## Example output
//! ```ignore
//! Timings: showing up to 10 slowest items.
//!
//! Group        Name          Calls        Total    Per call
//! ---------------------------------------------------------
//! Parser       parse_file       12  1s 200ms 4us  100ms 333us
//! Lexer        next_token    4,211     250ms 12us      59us
//!
//! Timings grouped by class or module.
//!
//! Group           Time  % wall time
//! ---------------------------------
//! Parser   1s 200ms 4us      79.92%
//! Lexer        250ms 12us    16.65%
//! untimed       51ms 47us     3.43%
//!
//! Total wall time 0:00:01.
//! ```
//!
//! The `untimed` row is the part of the wall time that no measurement covered. When
//! measurements overlap, their sum can exceed the wall time; the row is then called `redundant`
//! and its share is negative, so that the shares of all rows always add up to 100%.
use std::fmt::{self, Display};
use std::time::Duration;

use humantime::format_duration;

use crate::hashing::IndexMap;
use crate::measurement::Measurement;
use crate::store::MeasurementStore;

/// How many measurements a report lists unless told otherwise.
pub const DEFAULT_MAX_ITEMS: usize = 10;
/// Label of the residual row when measurements cover more than the wall time.
pub const REDUNDANT_LABEL: &str = "redundant";
/// Label of the residual row when measurements cover less than the wall time.
pub const UNTIMED_LABEL: &str = "untimed";

const MEASUREMENTS_HEADERS: &[&str] = &["Group", "Name", "Calls", "Total", "Per call"];
const GROUPS_HEADERS: &[&str] = &["Group", "Time", "% wall time"];

/// Total runtime of one group and its share of the wall time in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTiming {
    pub group: String,
    pub time: Duration,
    pub share: f64,
    /// True for the synthetic `redundant`/`untimed` row.
    pub residual: bool,
}

/// One measurement as listed in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub group: String,
    pub name: String,
    pub calls: usize,
    pub total_runtime: Duration,
    /// `None` only for a measurement without calls.
    pub time_per_call: Option<Duration>,
}

impl From<&Measurement> for MeasurementRow {
    fn from(measurement: &Measurement) -> Self {
        MeasurementRow {
            group: measurement.group().to_string(),
            name: measurement.name().to_string(),
            calls: measurement.calls(),
            total_runtime: measurement.total_runtime(),
            time_per_call: measurement.time_per_call().ok(),
        }
    }
}

/// A snapshot of a store's timings.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// The cap on listed measurements this report was made with.
    pub max_items: usize,
    /// The slowest measurements by total runtime, at most `max_items` of them.
    pub measurements: Vec<MeasurementRow>,
    /// All groups plus the residual row, slowest first.
    pub groups: Vec<GroupTiming>,
    pub total_runtime: Duration,
    pub wall_time: Duration,
}

/// `100 * part / whole`, or 0 when `whole` is zero.
fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        100.0 * part / whole
    } else {
        0.0
    }
}

impl MeasurementStore {
    /// The sum of the runtimes of all measurements.
    #[must_use]
    pub fn total_runtime(&self) -> Duration {
        self.all().map(Measurement::total_runtime).sum()
    }

    /// The time that has elapsed since the store was created or last reset.
    #[must_use]
    pub fn total_walltime(&self) -> Duration {
        self.now().saturating_duration_since(self.created_at())
    }

    /// The runtime of each group with its share of the wall time, plus one row for the
    /// difference between the recorded time and the wall time, sorted by decreasing runtime.
    ///
    /// With zero wall time every share is 0.
    #[must_use]
    pub fn grouped_timings(&self) -> Vec<GroupTiming> {
        self.grouped_timings_for(self.total_walltime())
    }

    /// Takes a snapshot of the `max_items` slowest measurements and of the grouped timings.
    #[must_use]
    pub fn report(&self, max_items: usize) -> Report {
        let wall_time = self.total_walltime();

        let mut measurements: Vec<_> = self.all().collect();
        // Stable, so ties keep the order in which measurements were first started.
        measurements.sort_by(|a, b| b.total_runtime().cmp(&a.total_runtime()));
        let measurements = measurements
            .into_iter()
            .take(max_items)
            .map(MeasurementRow::from)
            .collect();

        Report {
            max_items,
            measurements,
            groups: self.grouped_timings_for(wall_time),
            total_runtime: self.total_runtime(),
            wall_time,
        }
    }

    fn grouped_timings_for(&self, wall_time: Duration) -> Vec<GroupTiming> {
        let mut per_group: IndexMap<&str, Duration> = IndexMap::default();
        for measurement in self.all() {
            *per_group.entry(measurement.group()).or_default() += measurement.total_runtime();
        }

        let wall = wall_time.as_secs_f64();
        let mut timings: Vec<GroupTiming> = per_group
            .into_iter()
            .map(|(group, time)| GroupTiming {
                group: group.to_string(),
                time,
                share: percent_of(time.as_secs_f64(), wall),
                residual: false,
            })
            .collect();

        let recorded_time = self.total_runtime();
        let recorded = recorded_time.as_secs_f64();
        let (label, difference) = if recorded_time > wall_time {
            (REDUNDANT_LABEL, recorded_time - wall_time)
        } else {
            (UNTIMED_LABEL, wall_time - recorded_time)
        };
        timings.push(GroupTiming {
            group: label.to_string(),
            time: difference,
            share: if wall > 0.0 {
                100.0 * (1.0 - recorded / wall)
            } else {
                0.0
            },
            residual: true,
        });

        timings.sort_by(|a, b| b.time.cmp(&a.time));
        timings
    }
}

impl Display for MeasurementStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.report(DEFAULT_MAX_ITEMS))
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Timings: showing up to {} slowest items.",
            self.max_items
        )?;
        writeln!(f)?;

        let mut rows = vec![headers(MEASUREMENTS_HEADERS)];
        rows.extend(self.measurements.iter().map(|row| {
            vec![
                row.group.clone(),
                row.name.clone(),
                format_with_commas(row.calls),
                format_short_duration(row.total_runtime),
                row.time_per_call
                    .map_or_else(|| "-".to_string(), format_short_duration),
            ]
        }));
        write_formatted_table(f, &rows)?;
        writeln!(f)?;

        writeln!(f, "Timings grouped by class or module.")?;
        writeln!(f)?;
        let mut rows = vec![headers(GROUPS_HEADERS)];
        rows.extend(self.groups.iter().map(|timing| {
            vec![
                timing.group.clone(),
                format_short_duration(timing.time),
                format!("{:.2}%", timing.share),
            ]
        }));
        write_formatted_table(f, &rows)?;
        writeln!(f)?;

        write!(f, "Total wall time {}.", format_clock_time(self.wall_time))
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Writes a table with aligned columns, using the first row as a header.
/// The first two columns are left-aligned; remaining columns are right-aligned.
/// Automatically adjusts column widths and inserts a separator line.
pub fn write_formatted_table(f: &mut impl fmt::Write, rows: &[Vec<String>]) -> fmt::Result {
    let Some(header) = rows.first() else {
        return Ok(());
    };

    let num_cols = header.len();
    let mut col_widths = vec![0; num_cols];

    // Compute max column widths
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            col_widths[i] = col_widths[i].max(cell.chars().count());
        }
    }

    write_row(&mut *f, header, &col_widths)?;

    // Separator
    let total_width: usize = col_widths.iter().map(|w| *w + 2).sum();
    writeln!(f, "{}", "-".repeat(total_width))?;

    for row in &rows[1..] {
        write_row(&mut *f, row, &col_widths)?;
    }
    Ok(())
}

fn write_row(f: &mut impl fmt::Write, row: &[String], col_widths: &[usize]) -> fmt::Result {
    let num_cols = col_widths.len();
    for (i, cell) in row.iter().enumerate().take(num_cols) {
        // With more than three columns the second one holds names and reads better on the left.
        if i == 0 || (i == 1 && num_cols > 3) {
            write!(f, "{:<width$} ", cell, width = col_widths[i] + 1)?;
        } else {
            write!(f, "{:>width$} ", cell, width = col_widths[i] + 1)?;
        }
    }
    writeln!(f)
}

/// Formats a duration with `humantime`, dropping everything below a microsecond.
#[must_use]
pub fn format_short_duration(duration: Duration) -> String {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    format_duration(Duration::from_micros(micros)).to_string()
}

/// Formats a duration as `H:MM:SS`.
#[must_use]
pub fn format_clock_time(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{hours}:{minutes:02}:{seconds:02}")
}

/// Formats an integer with thousands separator.
#[must_use]
pub fn format_with_commas(value: usize) -> String {
    let s = value.to_string();
    let mut result = String::new();
    let bytes = s.as_bytes();
    let len = bytes.len();

    for (i, &b) in bytes.iter().enumerate() {
        result.push(b as char);
        let digits_left = len - i - 1;
        if digits_left > 0 && digits_left.is_multiple_of(3) {
            result.push(',');
        }
    }

    result
}
