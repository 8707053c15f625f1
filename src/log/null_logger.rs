/*!

A "logger" for builds without the `logging` feature. It outputs nothing itself but keeps the
public API working: the global level still caps the `log` facade, which matters when the
application installs its own logger.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Sets the global logger to conform to this `LogConfiguration`.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
