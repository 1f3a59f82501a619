use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

use crate::error::EpiError;
use crate::log::InstalledLogger;

// ISO 8601 timestamp, color coded level, module path
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%SZ)} {h({l})} {t} - {m}{n}";
const APPENDER: &str = "stderr";

impl InstalledLogger {
    /// Builds a log4rs configuration from the current levels and installs it, or swaps it into
    /// the running logger.
    pub(in crate::log) fn install(&mut self) -> Result<(), EpiError> {
        // stderr keeps log lines out of the console summary on stdout.
        let stderr = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();

        let config = self
            .modules
            .iter()
            .fold(
                Config::builder().appender(Appender::builder().build(APPENDER, Box::new(stderr))),
                |builder, (module, level)| {
                    builder.logger(Logger::builder().build(module.clone(), *level))
                },
            )
            .build(Root::builder().appender(APPENDER).build(self.level))
            .map_err(|e| EpiError::LogError(format!("invalid logger configuration: {e}")))?;

        match &self.handle {
            Some(handle) => handle.set_config(config),
            None => {
                let handle = log4rs::init_config(config)
                    .map_err(|e| EpiError::LogError(format!("could not install logger: {e}")))?;
                self.handle = Some(handle);
            }
        }
        Ok(())
    }
}
