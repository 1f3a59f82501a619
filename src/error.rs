use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `EpiError` and maps other errors to
/// convert to an `EpiError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum EpiError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    /// A model parameter failed validation before the run started.
    InvalidParameter(String),
    ReportError(String),
    /// The stepper was asked to do something its current phase does not allow.
    InvalidState(String),
    /// Bad `--log-level` filters, or the logger could not be installed.
    LogError(String),
}

impl From<io::Error> for EpiError {
    fn from(error: io::Error) -> Self {
        EpiError::IoError(error)
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(error: serde_json::Error) -> Self {
        EpiError::JsonError(error)
    }
}

impl From<csv::Error> for EpiError {
    fn from(error: csv::Error) -> Self {
        EpiError::CSVError(error)
    }
}

impl std::error::Error for EpiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EpiError::IoError(error) => Some(error),
            EpiError::JsonError(error) => Some(error),
            EpiError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for EpiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EpiError::IoError(error) => write!(f, "Error: I/O failure: {error}"),
            EpiError::JsonError(error) => write!(f, "Error: invalid configuration file: {error}"),
            EpiError::CSVError(error) => write!(f, "Error: could not write report: {error}"),
            EpiError::InvalidParameter(message) => write!(f, "Error: invalid parameter: {message}"),
            EpiError::ReportError(message) => write!(f, "Error: {message}"),
            EpiError::InvalidState(message) => write!(f, "Error: {message}"),
            EpiError::LogError(message) => write!(f, "Error: logging: {message}"),
        }
    }
}
