/*!

A "logger" for builds without the `logging` feature. It does not output anything anywhere but
satisfies the public API.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Sets the global logger to conform to this `LogConfiguration`.
    pub(in crate::log) fn set_config(&mut self) {
        // No global logger. The module filters are kept only for inspection.
        log::set_max_level(self.global_log_level);
    }
}
