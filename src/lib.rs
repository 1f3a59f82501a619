//! A discrete-time epidemic simulator
//!
//! Epistep advances a compartmental model (SIR or SEIRD) one day at a time, writes the
//! compartment counts of every day to a CSV report and prints a summary of the outbreak.
//!
//! The central object is the `EpidemicStepper`, which owns everything a run needs:
//! * The compartment state and the transmission, recovery, incubation and fatality rates
//! * A restriction policy that changes the transmission rate during the run, either on fixed
//!   calendar days or from the infected share of the population
//! * A perturbation strategy for the new infections of each day, identity unless the run is
//!   stochastic
//! * Running statistics such as the cumulative infected and the epidemic peak
//!
//! A run is configured with `ModelParameters`, built in code, loaded from JSON, taken from a
//! preset `Scenario` or assembled from command line flags by the `runner` module.
pub mod compartments;
pub mod error;
pub mod log;
pub mod parameters;
pub mod random;
pub mod rates;
pub mod report;
pub mod restrictions;
pub mod runner;
pub mod scenarios;
pub mod statistics;
pub mod stepper;
pub mod summary;

pub mod prelude;
