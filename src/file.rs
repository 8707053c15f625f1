use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use log::{error, info};
use serde::{Serialize, Serializer};

use crate::error::AeonError;
use crate::options::ReportOptions;
use crate::report::{GroupTiming, MeasurementRow, Report};
use crate::store::MeasurementStore;

/// A wrapper around Duration the serialization format of which we have control over.
#[derive(Debug, Copy, Clone)]
struct SerializableDuration(pub Duration);

impl Serialize for SerializableDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.as_secs_f64())
    }
}

#[derive(Serialize)]
struct MeasurementRecord<'a> {
    group: &'a str,
    name: &'a str,
    calls: usize,
    total_runtime: SerializableDuration,
    time_per_call: Option<SerializableDuration>,
}

impl<'a> From<&'a MeasurementRow> for MeasurementRecord<'a> {
    fn from(row: &'a MeasurementRow) -> Self {
        MeasurementRecord {
            group: &row.group,
            name: &row.name,
            calls: row.calls,
            total_runtime: SerializableDuration(row.total_runtime),
            time_per_call: row.time_per_call.map(SerializableDuration),
        }
    }
}

#[derive(Serialize)]
struct GroupRecord<'a> {
    group: &'a str,
    time: SerializableDuration,
    percent_wall_time: f64,
    residual: bool,
}

impl<'a> From<&'a GroupTiming> for GroupRecord<'a> {
    fn from(timing: &'a GroupTiming) -> Self {
        GroupRecord {
            group: &timing.group,
            time: SerializableDuration(timing.time),
            percent_wall_time: timing.share,
            residual: timing.residual,
        }
    }
}

#[derive(Serialize)]
struct ReportRecord<'a> {
    date_time: SystemTime,
    max_items: usize,
    wall_time: SerializableDuration,
    total_runtime: SerializableDuration,
    measurements: Vec<MeasurementRecord<'a>>,
    groups: Vec<GroupRecord<'a>>,
}

impl<'a> From<&'a Report> for ReportRecord<'a> {
    fn from(report: &'a Report) -> Self {
        ReportRecord {
            date_time: SystemTime::now(),
            max_items: report.max_items,
            wall_time: SerializableDuration(report.wall_time),
            total_runtime: SerializableDuration(report.total_runtime),
            measurements: report.measurements.iter().map(Into::into).collect(),
            groups: report.groups.iter().map(Into::into).collect(),
        }
    }
}

/// Writes `report` as pretty-printed JSON to `file_path`, replacing any existing file and
/// creating missing parent directories.
///
/// # Errors
///
/// Returns an [`AeonError::IoError`] if the file can't be written.
pub fn write_report_to_file<P: AsRef<Path>>(file_path: P, report: &Report) -> Result<(), AeonError> {
    let file_path = file_path.as_ref();
    let json = serde_json::to_string_pretty(&ReportRecord::from(report))?;

    if let Some(parent) = file_path.parent() {
        create_dir_all(parent)?;
    }
    let mut file = File::create(file_path)?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

impl MeasurementStore {
    /// Writes a report of this store to the file described by `options`. Returns the path
    /// written to.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::OutputFileExists`] if the file exists and `options` don't allow
    /// overwriting it, or an [`AeonError::IoError`] if it can't be written.
    pub fn write_report(&self, options: &ReportOptions) -> Result<PathBuf, AeonError> {
        let path = options.report_path();
        if !options.overwrite && path.exists() {
            error!("report output file already exists: {}", path.display());
            return Err(AeonError::OutputFileExists(path));
        }

        write_report_to_file(&path, &self.report(options.max_items))?;
        info!("wrote timings report to {}", path.display());
        Ok(path)
    }
}
