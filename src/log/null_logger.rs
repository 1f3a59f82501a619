//! Without the `logging` feature there is no backend. Only the `log` crate's level gate is set,
//! so disabled messages still cost nothing.

use crate::error::EpiError;
use crate::log::InstalledLogger;

impl InstalledLogger {
    pub(in crate::log) fn install(&mut self) -> Result<(), EpiError> {
        log::set_max_level(self.max_level());
        Ok(())
    }
}
