//! Console summaries printed before and after a run.

use std::fmt::{self, Display};

use crate::compartments::ModelVariant;
use crate::stepper::EpidemicStepper;

const RULE: &str =
    "------------------------------------------------------------------------------------------";

/// The run's inputs: population, initial compartments and rates.
pub struct InputSummary<'a> {
    stepper: &'a EpidemicStepper,
    name: Option<&'a str>,
    stochastic: bool,
}

/// The run's results: cumulative totals and peaks.
pub struct OutputSummary<'a> {
    stepper: &'a EpidemicStepper,
}

impl<'a> InputSummary<'a> {
    #[must_use]
    pub fn new(stepper: &'a EpidemicStepper, name: Option<&'a str>, stochastic: bool) -> Self {
        InputSummary {
            stepper,
            name,
            stochastic,
        }
    }
}

impl<'a> OutputSummary<'a> {
    #[must_use]
    pub fn new(stepper: &'a EpidemicStepper) -> Self {
        OutputSummary { stepper }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

impl Display for InputSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stepper = self.stepper;
        let state = stepper.state();
        let rates = stepper.rates();
        let variant = stepper.variant();

        writeln!(f, "{RULE}")?;
        match self.name {
            Some(name) => writeln!(f, "| Simulation of the {variant} epidemic model, scenario {name}")?,
            None => writeln!(f, "| Simulation of the {variant} epidemic model")?,
        }
        writeln!(f, "{RULE}")?;
        writeln!(f)?;
        writeln!(f, "Input:")?;
        writeln!(f, "\tPopulation count = {:.0}", state.population())?;
        writeln!(f, "\tInfected = {:.0}", state.infected)?;
        if variant == ModelVariant::Seird {
            writeln!(f, "\tExposed = {:.0}", state.exposed)?;
        }
        writeln!(
            f,
            "\tBasic reproduction number = {:.5}",
            rates.basic_reproduction_number()
        )?;
        writeln!(f, "\tTransmission rate = {:.5}", rates.beta)?;
        writeln!(f, "\tRecovery rate = {:.5}", rates.alpha)?;
        if variant == ModelVariant::Seird {
            writeln!(f, "\tIncubation rate = {:.5}", rates.sigma)?;
            writeln!(f, "\tFatality rate = {:.5}", rates.omega)?;
        }
        writeln!(
            f,
            "\tGovernment takes measures = {}",
            yes_no(stepper.policy().is_active())
        )?;
        writeln!(f, "\tStochastic transmission = {}", yes_no(self.stochastic))?;
        write!(f, "\tDays of simulation = {}", stepper.days())
    }
}

impl Display for OutputSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stepper = self.stepper;
        let state = stepper.state();
        let statistics = stepper.statistics();
        let population = state.population();

        writeln!(f, "Output:")?;
        writeln!(
            f,
            "\tSum of all the recovered = {:.0} ({:.5}% of total population)",
            statistics.sum_recovered,
            statistics.recovered_share(population)
        )?;
        writeln!(
            f,
            "\tSum of all the infected = {:.0} ({:.5}% of total population)",
            statistics.sum_infected,
            statistics.attack_rate(population)
        )?;
        writeln!(
            f,
            "\tBiggest daily increment = {:.0} (day No. {})",
            statistics.max_increment, statistics.day_of_max_increment
        )?;
        writeln!(
            f,
            "\tMost infected people at single moment = {:.0} (day No. {})",
            statistics.max_infected, statistics.day_of_max_infected
        )?;
        if stepper.policy().is_active() {
            writeln!(
                f,
                "\tBasic reproduction number at the end = {:.5}",
                stepper.rates().basic_reproduction_number()
            )?;
        }
        if stepper.variant() == ModelVariant::Seird {
            writeln!(f, "\tDead = {:.0}", state.dead)?;
        }
        write!(f, "{RULE}")
    }
}
