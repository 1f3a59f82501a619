use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use derive_builder::Builder;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::compartments::{CompartmentState, ModelVariant};
use crate::error::EpiError;
use crate::rates::RateParameters;
use crate::restrictions::RestrictionPolicy;

/// Everything needed to configure a run. Missing fields in a JSON configuration file take the
/// builder defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
#[serde(default)]
pub struct ModelParameters {
    /// Label shown in the console summary, e.g. the scenario preset name
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    #[builder(default)]
    pub variant: ModelVariant,

    #[builder(default = "1_000_000.0")]
    pub population: f64,

    #[builder(default = "1.0")]
    pub initial_infected: f64,

    #[builder(default = "0.0")]
    pub initial_exposed: f64,

    #[builder(default = "0.6")]
    pub beta: f64,

    /// When set, takes precedence over `beta`: the run starts with `beta = alpha * r0`.
    #[builder(default, setter(strip_option))]
    pub r0: Option<f64>,

    #[builder(default = "0.095")]
    pub alpha: f64,

    #[builder(default = "0.0")]
    pub sigma: f64,

    #[builder(default = "0.0")]
    pub omega: f64,

    #[builder(default = "100")]
    pub days: usize,

    #[builder(default)]
    pub restrictions: RestrictionPolicy,

    #[builder(default)]
    pub stochastic: bool,

    #[builder(default = "0")]
    pub seed: u64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParametersBuilder::default()
            .build()
            .expect("every model parameter has a default")
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), EpiError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EpiError::InvalidParameter(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

impl ModelParameters {
    /// Reads parameters from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an `EpiError` if the file cannot be opened or is not valid JSON for these
    /// parameters. The values are not validated here; call `validate`.
    pub fn load_from_json(file_path: &Path) -> Result<ModelParameters, EpiError> {
        debug!("Loading model parameters from {}", file_path.display());
        let file = File::open(file_path)?;
        let parameters = serde_json::from_reader(BufReader::new(file))?;
        Ok(parameters)
    }

    /// The transmission rate the run starts with.
    #[must_use]
    pub fn transmission_rate(&self) -> f64 {
        match self.r0 {
            Some(r0) => self.alpha * r0,
            None => self.beta,
        }
    }

    /// Rejects configurations that would make the run meaningless, e.g. an empty population or
    /// negative rates.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::InvalidParameter` naming the first offending value.
    pub fn validate(&self) -> Result<(), EpiError> {
        if !self.population.is_finite() || self.population <= 0.0 {
            return Err(EpiError::InvalidParameter(format!(
                "population must be positive, got {}",
                self.population
            )));
        }
        for (name, count) in [
            ("initial infected", self.initial_infected),
            ("initial exposed", self.initial_exposed),
        ] {
            if !count.is_finite() || count < 0.0 {
                return Err(EpiError::InvalidParameter(format!(
                    "{name} must be finite and non-negative, got {count}"
                )));
            }
        }
        if self.initial_infected + self.initial_exposed > self.population {
            return Err(EpiError::InvalidParameter(format!(
                "initial infected and exposed ({}) exceed the population ({})",
                self.initial_infected + self.initial_exposed,
                self.population
            )));
        }
        if self.variant == ModelVariant::Sir && self.initial_exposed > 0.0 {
            return Err(EpiError::InvalidParameter(
                "the SIR model has no exposed compartment".to_string(),
            ));
        }
        if let Some(r0) = self.r0 {
            check_rate("R0", r0)?;
        }
        check_rate("transmission rate", self.transmission_rate())?;
        check_rate("recovery rate", self.alpha)?;
        check_rate("incubation rate", self.sigma)?;
        check_rate("fatality rate", self.omega)?;
        if self.days == 0 {
            return Err(EpiError::InvalidParameter(
                "the simulation must run for at least one day".to_string(),
            ));
        }
        self.restrictions.validate()
    }

    #[must_use]
    pub fn initial_state(&self) -> CompartmentState {
        CompartmentState::seeded(
            self.population,
            self.initial_infected,
            self.initial_exposed,
        )
    }

    #[must_use]
    pub fn rates(&self) -> RateParameters {
        RateParameters::new(self.transmission_rate(), self.alpha, self.sigma, self.omega)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrictions::ThresholdPolicy;
    use assert_approx_eq::assert_approx_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn builder_defaults_are_valid() {
        let parameters = ModelParameters::default();
        assert_eq!(parameters.variant, ModelVariant::Sir);
        assert_eq!(parameters.days, 100);
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn r0_takes_precedence_over_beta() {
        let parameters = ModelParametersBuilder::default()
            .beta(0.9)
            .r0(6.0)
            .alpha(0.0556)
            .build()
            .unwrap();
        assert_approx_eq!(parameters.transmission_rate(), 0.3336);
        assert_approx_eq!(parameters.rates().native_beta(), 0.3336);
    }

    #[test]
    fn rejects_empty_population() {
        let parameters = ModelParametersBuilder::default()
            .population(0.0)
            .build()
            .unwrap();
        assert!(matches!(
            parameters.validate(),
            Err(EpiError::InvalidParameter(message)) if message.contains("population")
        ));
    }

    #[test]
    fn rejects_negative_and_non_finite_rates() {
        let negative = ModelParametersBuilder::default()
            .alpha(-0.1)
            .build()
            .unwrap();
        assert!(negative.validate().is_err());

        let nan = ModelParametersBuilder::default()
            .beta(f64::NAN)
            .build()
            .unwrap();
        assert!(nan.validate().is_err());
    }

    #[test]
    fn rejects_impossible_initial_conditions() {
        let too_many = ModelParametersBuilder::default()
            .variant(ModelVariant::Seird)
            .population(100.0)
            .initial_infected(60.0)
            .initial_exposed(50.0)
            .build()
            .unwrap();
        assert!(too_many.validate().is_err());

        let exposed_in_sir = ModelParametersBuilder::default()
            .initial_exposed(5.0)
            .build()
            .unwrap();
        assert!(exposed_in_sir.validate().is_err());

        let no_days = ModelParametersBuilder::default().days(0).build().unwrap();
        assert!(no_days.validate().is_err());
    }

    #[test]
    fn invalid_policy_fails_validation() {
        let parameters = ModelParametersBuilder::default()
            .restrictions(RestrictionPolicy::Threshold(ThresholdPolicy {
                cadence_days: 0,
                ..ThresholdPolicy::default()
            }))
            .build()
            .unwrap();
        assert!(parameters.validate().is_err());
    }

    #[test]
    fn load_partial_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "variant": "seird",
                "population": 10000,
                "initial_infected": 3,
                "initial_exposed": 60,
                "r0": 2.5,
                "alpha": 0.1,
                "sigma": 0.2,
                "omega": 0.01,
                "restrictions": {{"kind": "threshold"}}
            }}"#
        )
        .unwrap();

        let parameters = ModelParameters::load_from_json(file.path()).unwrap();
        assert_eq!(parameters.variant, ModelVariant::Seird);
        assert_eq!(parameters.population, 10_000.0);
        assert_approx_eq!(parameters.transmission_rate(), 0.25);
        // Not in the file
        assert_eq!(parameters.days, 100);
        assert!(!parameters.stochastic);
        assert_eq!(
            parameters.restrictions,
            RestrictionPolicy::Threshold(ThresholdPolicy::default())
        );
        assert!(parameters.validate().is_ok());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let result = ModelParameters::load_from_json(Path::new("no/such/parameters.json"));
        assert!(matches!(result, Err(EpiError::IoError(_))));
    }

    #[test]
    fn load_malformed_json_is_json_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"population\": \"lots\"}}").unwrap();
        let result = ModelParameters::load_from_json(file.path());
        assert!(matches!(result, Err(EpiError::JsonError(_))));
    }
}
