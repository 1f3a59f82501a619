use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::compartments::{CompartmentState, ModelVariant};
use crate::error::EpiError;
use crate::statistics::RunStatistics;

/// A row type of the compartment report. Values are rounded to whole people.
pub trait Report: Serialize {
    fn from_state(state: &CompartmentState, statistics: &RunStatistics) -> Self;
}

#[allow(clippy::cast_possible_truncation)]
fn rounded(value: f64) -> i64 {
    value.round() as i64
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SirRow {
    #[serde(rename = "S")]
    pub susceptible: i64,
    #[serde(rename = "I")]
    pub infected: i64,
    #[serde(rename = "R")]
    pub removed: i64,
    #[serde(rename = "Isum")]
    pub sum_infected: i64,
}

impl Report for SirRow {
    fn from_state(state: &CompartmentState, statistics: &RunStatistics) -> Self {
        SirRow {
            susceptible: rounded(state.susceptible),
            infected: rounded(state.infected),
            removed: rounded(state.removed),
            sum_infected: rounded(statistics.sum_infected),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SeirdRow {
    #[serde(rename = "S")]
    pub susceptible: i64,
    #[serde(rename = "E")]
    pub exposed: i64,
    #[serde(rename = "I")]
    pub infected: i64,
    #[serde(rename = "R")]
    pub removed: i64,
    #[serde(rename = "D")]
    pub dead: i64,
    #[serde(rename = "Isum")]
    pub sum_infected: i64,
    #[serde(rename = "Rsum")]
    pub sum_recovered: i64,
}

impl Report for SeirdRow {
    fn from_state(state: &CompartmentState, statistics: &RunStatistics) -> Self {
        SeirdRow {
            susceptible: rounded(state.susceptible),
            exposed: rounded(state.exposed),
            infected: rounded(state.infected),
            removed: rounded(state.removed),
            dead: rounded(state.dead),
            sum_infected: rounded(statistics.sum_infected),
            sum_recovered: rounded(statistics.sum_recovered),
        }
    }
}

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist. Returns the file if successful.
fn generate_validate_filepath(path: &Path) -> Result<File, EpiError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(EpiError::ReportError(format!(
            "report output files must be CSVs, got {}",
            path.display()
        ))),
    }
}

/// One CSV row per simulated day, written with the header matching the model variant.
pub struct CompartmentReport {
    writer: Writer<File>,
    variant: ModelVariant,
    path: PathBuf,
    rows: usize,
}

impl CompartmentReport {
    /// # Errors
    ///
    /// Returns an `EpiError` if the path is not a CSV file or cannot be created.
    pub fn create(path: &Path, variant: ModelVariant) -> Result<Self, EpiError> {
        let file = generate_validate_filepath(path)?;
        debug!("Writing {variant} report to {}", path.display());
        Ok(CompartmentReport {
            writer: Writer::from_writer(file),
            variant,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Writes a new row for the given state.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::CSVError` if the row cannot be written.
    pub fn send_report(
        &mut self,
        state: &CompartmentState,
        statistics: &RunStatistics,
    ) -> Result<(), EpiError> {
        match self.variant {
            ModelVariant::Sir => self
                .writer
                .serialize(SirRow::from_state(state, statistics))?,
            ModelVariant::Seird => self
                .writer
                .serialize(SeirdRow::from_state(state, statistics))?,
        }
        self.rows += 1;
        trace!("report row {} written", self.rows);
        Ok(())
    }

    /// Flushes buffered rows to disk.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::IoError` if the flush fails.
    pub fn finish(mut self) -> Result<(), EpiError> {
        self.writer.flush()?;
        debug!("{} rows written to {}", self.rows, self.path.display());
        Ok(())
    }
}
