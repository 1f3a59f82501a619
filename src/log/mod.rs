//! Where a run's log messages go. Logging describes what the simulator does internally: when a
//! restriction changes the transmission rate, when the susceptible pool runs out, and at
//! `trace` the compartments of every day. It is separate from the CSV report.
//!
//! The five logging macros `error!`, `warn!`, `info!`, `debug!` and `trace!` are re-exported
//! from the `log` crate.
//!
//! Nothing is logged unless asked for. The command line builds a [`LogSettings`] from
//! `--log-level` and `-v`, and [`apply_log_settings`] installs it:
//!
//! ```rust
//! use epistep::log::{apply_log_settings, LogSettings};
//!
//! // Restriction changes, plus every simulated day of the stepper.
//! let settings = LogSettings::parse("info,epistep::stepper=trace").unwrap();
//! apply_log_settings(&settings).unwrap();
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex};

use crate::error::EpiError;

/// Requested log levels: an optional level for everything plus levels for individual module
/// paths such as `epistep::stepper`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub level: Option<LevelFilter>,
    pub modules: BTreeMap<String, LevelFilter>,
}

fn parse_level(level: &str) -> Result<LevelFilter, EpiError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| EpiError::LogError(format!("unknown log level `{}`", level.trim())))
}

impl LogSettings {
    /// Parses `level` or a comma separated list of `module=level` and `level` entries, e.g.
    /// `warn,epistep::stepper=trace`. The last bare level wins.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::LogError` for an unknown level name or an empty module path.
    pub fn parse(filters: &str) -> Result<Self, EpiError> {
        let mut settings = LogSettings::default();
        for entry in filters.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            match entry.split_once('=') {
                Some((module, level)) => {
                    let module = module.trim();
                    if module.is_empty() {
                        return Err(EpiError::LogError(format!(
                            "missing module path in `{entry}`"
                        )));
                    }
                    settings.modules.insert(module.to_string(), parse_level(level)?);
                }
                None => settings.level = Some(parse_level(entry)?),
            }
        }
        Ok(settings)
    }

    /// Fills in the overall level from a `-v` count (info, debug, then trace) unless a level was
    /// given explicitly.
    #[must_use]
    pub fn or_verbosity(mut self, verbose: u8) -> Self {
        if self.level.is_none() {
            self.level = match verbose {
                0 => None,
                1 => Some(LevelFilter::Info),
                2 => Some(LevelFilter::Debug),
                _ => Some(LevelFilter::Trace),
            };
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.modules.is_empty()
    }
}

/// The levels currently installed in the process-wide logger. Off until settings are applied.
#[derive(Debug)]
struct InstalledLogger {
    level: LevelFilter,
    modules: BTreeMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    handle: Option<log4rs::Handle>,
}

impl Default for InstalledLogger {
    fn default() -> Self {
        InstalledLogger {
            level: LevelFilter::Off,
            modules: BTreeMap::new(),

            #[cfg(feature = "logging")]
            handle: None,
        }
    }
}

impl InstalledLogger {
    /// The most verbose level any module can log at.
    #[cfg_attr(feature = "logging", allow(dead_code))]
    fn max_level(&self) -> LevelFilter {
        self.modules.values().copied().fold(self.level, Ord::max)
    }
}

static INSTALLED_LOGGER: LazyLock<Mutex<InstalledLogger>> = LazyLock::new(Mutex::default);

/// Merges `settings` into the process-wide logger and reinstalls it. Module levels given earlier
/// stay in force unless overridden. Empty settings change nothing.
///
/// # Errors
///
/// Returns `EpiError::LogError` if the logger cannot be installed, e.g. because the embedding
/// application installed its own logger first.
pub fn apply_log_settings(settings: &LogSettings) -> Result<(), EpiError> {
    if settings.is_empty() {
        return Ok(());
    }
    let mut installed = INSTALLED_LOGGER
        .lock()
        .map_err(|_| EpiError::LogError("logger configuration lock poisoned".to_string()))?;
    if let Some(level) = settings.level {
        installed.level = level;
    }
    installed
        .modules
        .extend(settings.modules.iter().map(|(module, level)| (module.clone(), *level)));
    installed.install()
}
