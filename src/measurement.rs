use std::time::{Duration, Instant};

use log::trace;

use crate::error::AeonError;

/// Number of calls and total running time of one named piece of code.
///
/// A measurement is idle or running. [`Measurement::start`] moves it from idle to running and
/// counts a call, [`Measurement::stop`] moves it back and adds the elapsed interval to the total
/// runtime. Calling either out of order fails with [`AeonError::InvalidState`] and leaves the
/// measurement untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    name: String,
    group: String,
    calls: usize,
    total_runtime: Duration,
    /// Start of the in-flight interval. `Some` if and only if the measurement is running.
    started_at: Option<Instant>,
}

impl Measurement {
    #[must_use]
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Measurement {
            name: name.into(),
            group: group.into(),
            calls: 0,
            total_runtime: Duration::ZERO,
            started_at: None,
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

    /// The number of times the measurement was started.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// The sum of all completed intervals. A running interval is not included until it stops.
    #[must_use]
    pub fn total_runtime(&self) -> Duration {
        self.total_runtime
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Starts a new interval at the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::InvalidState`] if the measurement is already running.
    pub fn start(&mut self) -> Result<(), AeonError> {
        self.start_at(Instant::now())
    }

    /// Stops the running interval at the current instant.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::InvalidState`] if the measurement is not running.
    pub fn stop(&mut self) -> Result<(), AeonError> {
        self.stop_at(Instant::now())
    }

    pub(crate) fn start_at(&mut self, now: Instant) -> Result<(), AeonError> {
        if self.is_running() {
            return Err(self.invalid_state());
        }
        self.calls += 1;
        self.started_at = Some(now);
        trace!("started '{}::{}'", self.group, self.name);
        Ok(())
    }

    pub(crate) fn stop_at(&mut self, now: Instant) -> Result<(), AeonError> {
        let Some(started_at) = self.started_at.take() else {
            return Err(self.invalid_state());
        };
        // A clock that jumps backwards contributes nothing rather than underflowing.
        self.total_runtime += now.saturating_duration_since(started_at);
        trace!(
            "stopped '{}::{}' after {} calls",
            self.group,
            self.name,
            self.calls
        );
        Ok(())
    }

    /// Average runtime of one call.
    ///
    /// # Errors
    ///
    /// Returns [`AeonError::NoCalls`] if the measurement was never started.
    pub fn time_per_call(&self) -> Result<Duration, AeonError> {
        if self.calls == 0 {
            return Err(AeonError::NoCalls {
                name: self.name.clone(),
                group: self.group.clone(),
            });
        }
        match u32::try_from(self.calls) {
            Ok(calls) => Ok(self.total_runtime / calls),
            #[allow(clippy::cast_precision_loss)]
            Err(_) => Ok(self.total_runtime.div_f64(self.calls as f64)),
        }
    }

    pub(crate) fn invalid_state(&self) -> AeonError {
        AeonError::InvalidState {
            name: self.name.clone(),
            group: self.group.clone(),
            running: self.is_running(),
        }
    }
}
