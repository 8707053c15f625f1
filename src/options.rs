use std::path::{Path, PathBuf};

use crate::report::DEFAULT_MAX_ITEMS;

/// The name of the report file, after the prefix.
pub(crate) const REPORT_FILE_NAME: &str = "timings.json";

/// Options for reports written to disk.
///
/// The setters chain:
/// ```rust
/// use aeon::ReportOptions;
///
/// let mut options = ReportOptions::new();
/// options
///     .directory("target/timings")
///     .file_prefix("nightly_")
///     .max_items(25)
///     .overwrite(true);
/// assert!(options.report_path().ends_with("nightly_timings.json"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub max_items: usize,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportOptions {
    /// Lists the default number of items, writes to the current directory without a prefix,
    /// and refuses to overwrite an existing file.
    #[must_use]
    pub fn new() -> Self {
        ReportOptions {
            max_items: DEFAULT_MAX_ITEMS,
            output_dir: PathBuf::from("."),
            file_prefix: String::new(),
            overwrite: false,
        }
    }

    /// Sets how many measurements the report lists.
    pub fn max_items(&mut self, max_items: usize) -> &mut ReportOptions {
        self.max_items = max_items;
        self
    }

    /// Sets the directory the report file is written to.
    pub fn directory<P: AsRef<Path>>(&mut self, directory: P) -> &mut ReportOptions {
        self.output_dir = directory.as_ref().to_path_buf();
        self
    }

    /// Sets a prefix for the report file name.
    pub fn file_prefix(&mut self, file_prefix: impl Into<String>) -> &mut ReportOptions {
        self.file_prefix = file_prefix.into();
        self
    }

    /// Sets whether an existing report file may be replaced.
    pub fn overwrite(&mut self, overwrite: bool) -> &mut ReportOptions {
        self.overwrite = overwrite;
        self
    }

    /// The full path of the report file: `<output_dir>/<file_prefix>timings.json`.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", self.file_prefix, REPORT_FILE_NAME))
    }
}
