//! Preset scenarios reproducing the COVID-19 outbreak in Hubei province.
//!
//! The first reported case is dated 31 December 2019 and every preset runs until 1 December
//! 2020.

use std::fmt::{self, Display};

use clap::ValueEnum;

use crate::compartments::ModelVariant;
use crate::parameters::{ModelParameters, ModelParametersBuilder};
use crate::restrictions::RestrictionPolicy;

/// Days from 31 December 2019 to 1 December 2020, counting every year as 365 days long.
pub const HUBEI_OUTBREAK_DAYS: usize = 335;

const SIR_POPULATION: f64 = 5_000_000.0;
const SIR_BETA: f64 = 0.6;
const SIR_ALPHA: f64 = 0.095;

const SEIRD_POPULATION: f64 = 58_500_000.0;
const SEIRD_R0: f64 = 6.0;
const SEIRD_ALPHA: f64 = 0.0556;
const SEIRD_SIGMA: f64 = 0.1923;
const SEIRD_OMEGA: f64 = 0.0034;
const SEIRD_EXPOSED_PER_INFECTED: f64 = 20.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// SIR without government measures
    #[value(alias = "1")]
    Sir,
    /// SIR with the published restriction dates
    #[value(alias = "2")]
    SirRestricted,
    /// SEIRD without government measures
    #[value(alias = "3")]
    Seird,
    /// SEIRD with the published restriction dates
    #[value(alias = "4")]
    SeirdRestricted,
}

impl Scenario {
    #[must_use]
    pub fn variant(self) -> ModelVariant {
        match self {
            Scenario::Sir | Scenario::SirRestricted => ModelVariant::Sir,
            Scenario::Seird | Scenario::SeirdRestricted => ModelVariant::Seird,
        }
    }

    #[must_use]
    pub fn has_restrictions(self) -> bool {
        matches!(self, Scenario::SirRestricted | Scenario::SeirdRestricted)
    }

    #[must_use]
    pub fn parameters(self) -> ModelParameters {
        let restrictions = if self.has_restrictions() {
            RestrictionPolicy::hubei_calendar()
        } else {
            RestrictionPolicy::None
        };

        let mut builder = ModelParametersBuilder::default();
        builder
            .name(self.to_string())
            .variant(self.variant())
            .initial_infected(1.0)
            .days(HUBEI_OUTBREAK_DAYS)
            .restrictions(restrictions);

        match self.variant() {
            ModelVariant::Sir => {
                builder
                    .population(SIR_POPULATION)
                    .beta(SIR_BETA)
                    .alpha(SIR_ALPHA);
            }
            ModelVariant::Seird => {
                builder
                    .population(SEIRD_POPULATION)
                    .initial_exposed(SEIRD_EXPOSED_PER_INFECTED)
                    .r0(SEIRD_R0)
                    .alpha(SEIRD_ALPHA)
                    .sigma(SEIRD_SIGMA)
                    .omega(SEIRD_OMEGA);
            }
        }

        builder
            .build()
            .expect("every model parameter has a default")
    }
}

impl Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::Sir => "sir",
            Scenario::SirRestricted => "sir-restricted",
            Scenario::Seird => "seird",
            Scenario::SeirdRestricted => "seird-restricted",
        };
        write!(f, "{name}")
    }
}
