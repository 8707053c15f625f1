use std::fmt::{self, Debug, Display};
use std::io;
use std::path::PathBuf;

/// Provides `AeonError` and maps to other errors to
/// convert to an `AeonError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum AeonError {
    /// A measurement was started while running or stopped while idle. Most often this means a
    /// measurement is started again because a matching stop was forgotten.
    InvalidState {
        name: String,
        group: String,
        /// Whether the measurement was running when the offending call was made.
        running: bool,
    },
    /// The measurement was never started in this store.
    UnknownMeasurement { name: String, group: String },
    /// `stop_last` or `start_next` was called with no measurement tracked as last started.
    NoMeasurementRunning,
    /// The per-call time of a measurement that was never started is undefined.
    NoCalls { name: String, group: String },
    /// Refused to replace an existing report file.
    OutputFileExists(PathBuf),
    IoError(io::Error),
    JsonError(serde_json::Error),
}

impl From<io::Error> for AeonError {
    fn from(error: io::Error) -> Self {
        AeonError::IoError(error)
    }
}

impl From<serde_json::Error> for AeonError {
    fn from(error: serde_json::Error) -> Self {
        AeonError::JsonError(error)
    }
}

impl std::error::Error for AeonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AeonError::IoError(error) => Some(error),
            AeonError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for AeonError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AeonError::InvalidState {
                name,
                group,
                running: true,
            } => write!(
                f,
                "measurement '{name}[{group}]' is already running and needs to be stopped first \
                 (reset the store if it was left running by accident)"
            ),
            AeonError::InvalidState {
                name,
                group,
                running: false,
            } => write!(
                f,
                "measurement '{name}[{group}]' is not running and needs to be started first"
            ),
            AeonError::UnknownMeasurement { name, group } => {
                write!(f, "can't find measurement '{name}' of group '{group}'")
            }
            AeonError::NoMeasurementRunning => write!(f, "there is no measurement to stop"),
            AeonError::NoCalls { name, group } => write!(
                f,
                "measurement '{name}[{group}]' has no calls, so it has no time per call"
            ),
            AeonError::OutputFileExists(path) => {
                write!(f, "output file already exists: {}", path.display())
            }
            AeonError::IoError(error) => write!(f, "I/O error: {error}"),
            AeonError::JsonError(error) => write!(f, "JSON error: {error}"),
        }
    }
}
