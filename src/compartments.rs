//! Compartment populations for the SIR and SEIRD models.
//!
//! Counts are continuous. A `CompartmentState` always carries all five compartments; in the SIR
//! variant `exposed` and `dead` stay at zero, so the conservation check is the same for both
//! variants: the compartments sum to `population`.

use std::fmt::{self, Display};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Susceptible, Infectious, Removed
    #[default]
    #[value(alias = "0")]
    Sir,
    /// Susceptible, Exposed, Infectious, Removed, Dead
    #[value(alias = "1")]
    Seird,
}

impl ModelVariant {
    #[must_use]
    pub fn has_exposed(self) -> bool {
        matches!(self, ModelVariant::Seird)
    }
}

impl Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Sir => write!(f, "SIR"),
            ModelVariant::Seird => write!(f, "SEIRD"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CompartmentState {
    pub susceptible: f64,
    pub exposed: f64,
    pub infected: f64,
    pub removed: f64,
    pub dead: f64,
    population: f64,
}

impl CompartmentState {
    /// Seeds a population with `infected` infectious and `exposed` exposed people; everybody else
    /// starts susceptible.
    #[must_use]
    pub fn seeded(population: f64, infected: f64, exposed: f64) -> Self {
        CompartmentState {
            susceptible: population - infected - exposed,
            exposed,
            infected,
            removed: 0.0,
            dead: 0.0,
            population,
        }
    }

    #[must_use]
    pub fn population(&self) -> f64 {
        self.population
    }

    /// Sum over all compartments. Equals `population` up to rounding error.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.susceptible + self.exposed + self.infected + self.removed + self.dead
    }

    /// Fraction of the population currently infectious.
    #[must_use]
    pub fn prevalence(&self) -> f64 {
        self.infected / self.population
    }
}
