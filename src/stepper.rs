//! The discrete-time integrator shared by the SIR and SEIRD models.
//!
//! A day consists of
//! 1. applying whatever the restriction policy schedules for the day,
//! 2. recording peak statistics for the state at the start of the day,
//! 3. handing that state to the caller (one output row),
//! 4. advancing the compartments by one day.
//!
//! Each day's update only reads the previous day's values. New infections are capped by the
//! susceptible pool and outflows by the size of the compartment they leave, so no compartment
//! becomes negative.

use log::{debug, info, trace};

use crate::compartments::{CompartmentState, ModelVariant};
use crate::error::EpiError;
use crate::parameters::ModelParameters;
use crate::random::{Deterministic, Perturbation, UniformPerturbation};
use crate::rates::RateParameters;
use crate::restrictions::{RateAdjustment, RestrictionPolicy};
use crate::statistics::RunStatistics;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Built from validated parameters, no day simulated yet
    Configured,
    Running,
    /// Every configured day has been simulated; the state is final
    Completed,
}

pub struct EpidemicStepper {
    variant: ModelVariant,
    state: CompartmentState,
    rates: RateParameters,
    statistics: RunStatistics,
    policy: RestrictionPolicy,
    perturbation: Box<dyn Perturbation>,
    /// Change in the infectious compartment caused by the most recent update
    derivative_infected: f64,
    day: usize,
    days: usize,
    phase: RunPhase,
}

impl EpidemicStepper {
    /// Validates `parameters` and builds a stepper. Stochastic runs get a uniform perturbation
    /// seeded with `parameters.seed`.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::InvalidParameter` if the parameters fail validation.
    pub fn new(parameters: &ModelParameters) -> Result<Self, EpiError> {
        let perturbation: Box<dyn Perturbation> = if parameters.stochastic {
            Box::new(UniformPerturbation::from_seed(parameters.seed))
        } else {
            Box::new(Deterministic)
        };
        Self::with_perturbation(parameters, perturbation)
    }

    /// Like `new`, but with a caller-supplied perturbation source regardless of
    /// `parameters.stochastic`.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::InvalidParameter` if the parameters fail validation.
    pub fn with_perturbation(
        parameters: &ModelParameters,
        perturbation: Box<dyn Perturbation>,
    ) -> Result<Self, EpiError> {
        parameters.validate()?;
        Ok(EpidemicStepper {
            variant: parameters.variant,
            state: parameters.initial_state(),
            rates: parameters.rates(),
            statistics: RunStatistics::new(parameters.initial_infected + parameters.initial_exposed),
            policy: parameters.restrictions.clone(),
            perturbation,
            derivative_infected: 0.0,
            day: 0,
            days: parameters.days,
            phase: RunPhase::Configured,
        })
    }

    #[must_use]
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    #[must_use]
    pub fn state(&self) -> &CompartmentState {
        &self.state
    }

    #[must_use]
    pub fn rates(&self) -> &RateParameters {
        &self.rates
    }

    #[must_use]
    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    #[must_use]
    pub fn policy(&self) -> &RestrictionPolicy {
        &self.policy
    }

    /// Index of the next day to simulate; equals the number of days simulated so far.
    #[must_use]
    pub fn day(&self) -> usize {
        self.day
    }

    #[must_use]
    pub fn days(&self) -> usize {
        self.days
    }

    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Advances the compartments by one day.
    pub fn advance_one_day(&mut self) {
        let previous = self.state;
        let population = previous.population();
        let pressure = self.rates.beta * previous.susceptible * previous.infected / population;
        // A perturbation can only scale transmission down to zero, never reverse it.
        let new_infections = (pressure * self.perturbation.transmission_factor()).max(0.0);

        // More new infections than susceptibles: the whole pool is infected today.
        let infected_today = if new_infections > previous.susceptible {
            debug!(
                "day {}: {new_infections} new infections exceed {} susceptible, pool exhausted",
                self.day, previous.susceptible
            );
            previous.susceptible
        } else {
            new_infections
        };
        self.state.susceptible = previous.susceptible - infected_today;
        self.statistics.record_infections(infected_today);

        match self.variant {
            ModelVariant::Sir => {
                let recoveries = (self.rates.alpha * previous.infected).min(previous.infected);
                self.state.infected = previous.infected + infected_today - recoveries;
                self.state.removed = previous.removed + recoveries;
                self.statistics.record_recoveries(recoveries);
            }
            ModelVariant::Seird => {
                let matured = (self.rates.sigma * previous.exposed).min(previous.exposed);

                // Recoveries and deaths share the infectious pool; scale both down if together
                // they would take more than everyone.
                let leave_rate = self.rates.alpha + self.rates.omega;
                let scale = if leave_rate > 1.0 { 1.0 / leave_rate } else { 1.0 };
                let recoveries = self.rates.alpha * scale * previous.infected;
                let deaths = self.rates.omega * scale * previous.infected;

                self.state.exposed = previous.exposed + infected_today - matured;
                self.state.infected = (previous.infected + matured - recoveries - deaths).max(0.0);
                self.state.removed = previous.removed + recoveries;
                self.state.dead = previous.dead + deaths;
                self.statistics.record_recoveries(recoveries);
            }
        }

        self.derivative_infected = self.state.infected - previous.infected;
    }

    /// Lets the restriction policy adjust the transmission rate for simulated day `day`.
    pub fn apply_scheduled_rate_change(&mut self, day: usize) {
        match self.policy.apply(day, &self.state, &mut self.rates) {
            Some(RateAdjustment::R0Changed(r0)) => {
                info!("day {day}: R0 set to {r0}, transmission rate {}", self.rates.beta);
            }
            Some(RateAdjustment::MeasureApplied(Some(measure))) => {
                info!(
                    "day {day}: prevalence {:.5}%, {measure} in force, transmission rate {}",
                    self.state.prevalence() * 100.0,
                    self.rates.beta
                );
            }
            Some(RateAdjustment::MeasureApplied(None)) => {
                debug!("day {day}: no measures in force");
            }
            None => {}
        }
    }

    /// Updates the peak statistics with the current state as the state of simulated day `day`.
    pub fn record_statistics(&mut self, day: usize) {
        self.statistics
            .record(day, self.state.infected, self.derivative_infected);
    }

    /// Simulates the next day. `observe` receives the day index and the state at the start of
    /// that day, after the policy and statistics have been updated.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::InvalidState` once the run is complete, or whatever `observe` returns.
    pub fn step<F>(&mut self, mut observe: F) -> Result<(), EpiError>
    where
        F: FnMut(usize, &CompartmentState, &RunStatistics) -> Result<(), EpiError>,
    {
        if self.phase == RunPhase::Completed {
            return Err(EpiError::InvalidState(format!(
                "the run already simulated all {} days",
                self.days
            )));
        }
        self.phase = RunPhase::Running;

        let day = self.day;
        self.apply_scheduled_rate_change(day);
        self.record_statistics(day);
        observe(day, &self.state, &self.statistics)?;
        trace!(
            "day {day}: S={} E={} I={} R={} D={}",
            self.state.susceptible,
            self.state.exposed,
            self.state.infected,
            self.state.removed,
            self.state.dead
        );
        self.advance_one_day();

        self.day += 1;
        if self.day == self.days {
            self.phase = RunPhase::Completed;
        }
        Ok(())
    }

    /// Simulates every remaining day.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error from `observe`; `EpiError::InvalidState` if the run is
    /// already complete.
    pub fn run<F>(&mut self, mut observe: F) -> Result<(), EpiError>
    where
        F: FnMut(usize, &CompartmentState, &RunStatistics) -> Result<(), EpiError>,
    {
        loop {
            self.step(&mut observe)?;
            if self.phase == RunPhase::Completed {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::ModelParametersBuilder;
    use crate::random::ScriptedPerturbation;
    use crate::restrictions::ThresholdPolicy;
    use approx::assert_relative_eq;
    use assert_approx_eq::assert_approx_eq;

    fn sir(population: f64, infected: f64, beta: f64, alpha: f64, days: usize) -> ModelParameters {
        ModelParametersBuilder::default()
            .population(population)
            .initial_infected(infected)
            .beta(beta)
            .alpha(alpha)
            .days(days)
            .build()
            .unwrap()
    }

    fn seird_parameters() -> ModelParameters {
        ModelParametersBuilder::default()
            .variant(ModelVariant::Seird)
            .population(58_500_000.0)
            .initial_infected(1.0)
            .initial_exposed(20.0)
            .r0(6.0)
            .alpha(0.0556)
            .sigma(0.1923)
            .omega(0.0034)
            .days(335)
            .build()
            .unwrap()
    }

    #[test]
    fn sir_single_step_matches_recurrence() {
        let mut stepper = EpidemicStepper::new(&sir(1000.0, 10.0, 0.5, 0.1, 10)).unwrap();
        stepper.advance_one_day();

        // 0.5 * 990 * 10 / 1000 = 4.95 new infections, 1 recovery
        let state = stepper.state();
        assert_approx_eq!(state.susceptible, 985.05);
        assert_approx_eq!(state.infected, 13.95);
        assert_approx_eq!(state.removed, 1.0);
        assert_approx_eq!(stepper.statistics().sum_infected, 14.95);
        assert_approx_eq!(stepper.statistics().sum_recovered, 1.0);
    }

    #[test]
    fn seird_single_step_matches_recurrence() {
        let parameters = ModelParametersBuilder::default()
            .variant(ModelVariant::Seird)
            .population(1000.0)
            .initial_infected(10.0)
            .initial_exposed(20.0)
            .beta(0.5)
            .alpha(0.1)
            .sigma(0.25)
            .omega(0.05)
            .build()
            .unwrap();
        let mut stepper = EpidemicStepper::new(&parameters).unwrap();
        stepper.advance_one_day();

        // 0.5 * 970 * 10 / 1000 = 4.85 new exposed, 5 matured, 1 recovered, 0.5 dead
        let state = stepper.state();
        assert_approx_eq!(state.susceptible, 965.15);
        assert_approx_eq!(state.exposed, 19.85);
        assert_approx_eq!(state.infected, 13.5);
        assert_approx_eq!(state.removed, 1.0);
        assert_approx_eq!(state.dead, 0.5);
        assert_approx_eq!(state.total(), 1000.0);
    }

    #[test]
    fn conservation_every_day() {
        for parameters in [sir(5_000_000.0, 1.0, 0.6, 0.095, 400), seird_parameters()] {
            let mut stepper = EpidemicStepper::new(&parameters).unwrap();
            let population = parameters.population;
            stepper
                .run(|_, state, _| {
                    assert_relative_eq!(state.total(), population, max_relative = 1e-9);
                    Ok(())
                })
                .unwrap();
            assert_relative_eq!(stepper.state().total(), population, max_relative = 1e-9);
        }
    }

    #[test]
    fn removed_dead_and_totals_never_decrease() {
        let mut stepper = EpidemicStepper::new(&seird_parameters()).unwrap();
        let mut previous: Option<(CompartmentState, RunStatistics)> = None;
        stepper
            .run(|_, state, statistics| {
                if let Some((last_state, last_statistics)) = &previous {
                    assert!(state.removed >= last_state.removed);
                    assert!(state.dead >= last_state.dead);
                    assert!(statistics.sum_infected >= last_statistics.sum_infected);
                    assert!(statistics.sum_recovered >= last_statistics.sum_recovered);
                }
                previous = Some((*state, statistics.clone()));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn saturation_empties_susceptible_pool_exactly() {
        let parameters = sir(1000.0, 100.0, 1000.0, 0.1, 5);
        let mut stepper = EpidemicStepper::new(&parameters).unwrap();
        stepper.advance_one_day();

        let state = *stepper.state();
        assert_eq!(state.susceptible, 0.0);
        // 900 susceptibles moved, 10 recovered
        assert_approx_eq!(state.infected, 990.0);
        assert_approx_eq!(state.removed, 10.0);
        assert_approx_eq!(state.total(), 1000.0);
        // The saturating transfer counts towards the attack rate
        assert_approx_eq!(stepper.statistics().sum_infected, 1000.0);

        stepper.advance_one_day();
        assert_eq!(stepper.state().susceptible, 0.0);
    }

    #[test]
    fn seird_saturation_routes_pool_into_exposed() {
        let parameters = ModelParametersBuilder::default()
            .variant(ModelVariant::Seird)
            .population(1000.0)
            .initial_infected(100.0)
            .initial_exposed(100.0)
            .beta(1000.0)
            .alpha(0.1)
            .sigma(0.5)
            .omega(0.01)
            .build()
            .unwrap();
        let mut stepper = EpidemicStepper::new(&parameters).unwrap();
        stepper.advance_one_day();

        let state = stepper.state();
        assert_eq!(state.susceptible, 0.0);
        // 100 + 800 - 50 matured
        assert_approx_eq!(state.exposed, 850.0);
        assert_approx_eq!(state.total(), 1000.0);
    }

    #[test]
    fn huge_rates_never_drive_compartments_negative() {
        let parameters = ModelParametersBuilder::default()
            .variant(ModelVariant::Seird)
            .population(1000.0)
            .initial_infected(50.0)
            .initial_exposed(50.0)
            .beta(3.0)
            .alpha(2.0)
            .sigma(4.0)
            .omega(1.0)
            .days(30)
            .build()
            .unwrap();
        let mut stepper = EpidemicStepper::new(&parameters).unwrap();
        stepper
            .run(|_, state, _| {
                for value in [
                    state.susceptible,
                    state.exposed,
                    state.infected,
                    state.removed,
                    state.dead,
                ] {
                    assert!(value >= 0.0, "negative compartment in {state:?}");
                }
                assert_approx_eq!(state.total(), 1000.0, 1e-9);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn peaks_are_recorded_one_indexed() {
        let mut stepper = EpidemicStepper::new(&sir(5_000_000.0, 1.0, 0.6, 0.095, 120)).unwrap();
        let mut infected = Vec::new();
        stepper
            .run(|_, state, _| {
                infected.push(state.infected.round());
                Ok(())
            })
            .unwrap();

        let statistics = stepper.statistics();
        let (peak_index, peak) = infected
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(statistics.max_infected, peak);
        assert_eq!(statistics.day_of_max_infected, peak_index + 1);
        assert!(statistics.day_of_max_increment < statistics.day_of_max_infected);
    }

    #[test]
    fn stochastic_runs_with_same_seed_are_identical() {
        let mut parameters = sir(100_000.0, 10.0, 0.4, 0.1, 150);
        parameters.stochastic = true;
        parameters.seed = 7;

        let collect = |parameters: &ModelParameters| {
            let mut rows = Vec::new();
            let mut stepper = EpidemicStepper::new(parameters).unwrap();
            stepper
                .run(|_, state, _| {
                    rows.push(*state);
                    Ok(())
                })
                .unwrap();
            rows
        };
        assert_eq!(collect(&parameters), collect(&parameters));

        let mut other_seed = parameters.clone();
        other_seed.seed = 8;
        assert_ne!(collect(&parameters), collect(&other_seed));
    }

    #[test]
    fn scripted_perturbation_scales_new_infections() {
        let parameters = sir(1000.0, 10.0, 0.5, 0.1, 10);
        let mut stepper = EpidemicStepper::with_perturbation(
            &parameters,
            Box::new(ScriptedPerturbation::new(vec![0.0, 2.0])),
        )
        .unwrap();

        // Factor 0: nobody is infected, only recoveries happen
        stepper.advance_one_day();
        assert_approx_eq!(stepper.state().susceptible, 990.0);
        assert_approx_eq!(stepper.state().infected, 9.0);

        // Factor 2: twice the deterministic flux 0.5 * 990 * 9 / 1000
        stepper.advance_one_day();
        assert_approx_eq!(stepper.state().susceptible, 990.0 - 8.91);
    }

    #[test]
    fn negative_factor_transmits_nothing() {
        let parameters = sir(1000.0, 10.0, 0.5, 0.1, 10);
        let mut stepper = EpidemicStepper::with_perturbation(
            &parameters,
            Box::new(ScriptedPerturbation::new(vec![-5.0, f64::NAN])),
        )
        .unwrap();

        for _ in 0..2 {
            let before = *stepper.state();
            let sum_before = stepper.statistics().sum_infected;
            stepper.advance_one_day();

            let state = stepper.state();
            assert_eq!(state.susceptible, before.susceptible);
            assert!(state.infected >= 0.0);
            assert_approx_eq!(state.total(), 1000.0);
            assert_eq!(stepper.statistics().sum_infected, sum_before);
        }
        assert_approx_eq!(stepper.state().infected, 8.1);
    }

    #[test]
    fn calendar_policy_changes_rates_on_its_day() {
        let mut parameters = sir(5_000_000.0, 1.0, 0.6, 0.095, 100);
        parameters.restrictions = RestrictionPolicy::hubei_calendar();
        let mut stepper = EpidemicStepper::new(&parameters).unwrap();

        let mut beta_on_day = Vec::new();
        for _ in 0..61 {
            stepper.step(|_, _, _| Ok(())).unwrap();
            beta_on_day.push(stepper.rates().beta);
        }
        assert_approx_eq!(beta_on_day[22], 0.6);
        assert_approx_eq!(beta_on_day[23], 0.095 * 6.6037);
        assert_approx_eq!(beta_on_day[27], 0.095 * 3.7732);
        assert_approx_eq!(beta_on_day[60], 0.095 * 0.8);
        assert_approx_eq!(stepper.rates().native_beta(), 0.6);
    }

    #[test]
    fn threshold_policy_slows_the_epidemic() {
        let unrestricted = sir(1_000_000.0, 100.0, 0.6, 0.095, 200);
        let mut restricted = unrestricted.clone();
        restricted.restrictions = RestrictionPolicy::Threshold(ThresholdPolicy::default());

        let mut free_run = EpidemicStepper::new(&unrestricted).unwrap();
        free_run.run(|_, _, _| Ok(())).unwrap();
        let mut restricted_run = EpidemicStepper::new(&restricted).unwrap();
        restricted_run.run(|_, _, _| Ok(())).unwrap();

        assert!(
            restricted_run.statistics().max_infected < free_run.statistics().max_infected,
            "measures should lower the peak"
        );
    }

    #[test]
    fn lifecycle_phases() {
        let mut stepper = EpidemicStepper::new(&sir(1000.0, 1.0, 0.3, 0.1, 2)).unwrap();
        assert_eq!(stepper.phase(), RunPhase::Configured);

        stepper.step(|_, _, _| Ok(())).unwrap();
        assert_eq!(stepper.phase(), RunPhase::Running);
        assert_eq!(stepper.day(), 1);

        stepper.step(|_, _, _| Ok(())).unwrap();
        assert_eq!(stepper.phase(), RunPhase::Completed);

        let final_state = *stepper.state();
        let result = stepper.step(|_, _, _| Ok(()));
        assert!(matches!(result, Err(EpiError::InvalidState(_))));
        assert!(stepper.run(|_, _, _| Ok(())).is_err());
        assert_eq!(*stepper.state(), final_state);
    }

    #[test]
    fn observer_sees_start_of_day_state() {
        let parameters = sir(1000.0, 10.0, 0.5, 0.1, 3);
        let mut stepper = EpidemicStepper::new(&parameters).unwrap();
        let mut days = Vec::new();
        stepper
            .run(|day, state, _| {
                days.push((day, state.susceptible));
                Ok(())
            })
            .unwrap();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], (0, 990.0));
        assert_approx_eq!(days[1].1, 985.05);
    }

    #[test]
    fn observer_errors_stop_the_run() {
        let mut stepper = EpidemicStepper::new(&sir(1000.0, 10.0, 0.5, 0.1, 10)).unwrap();
        let result = stepper.run(|day, _, _| {
            if day == 3 {
                Err(EpiError::ReportError("disk full".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(EpiError::ReportError(_))));
        assert_eq!(stepper.day(), 3);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let parameters = sir(0.0, 1.0, 0.5, 0.1, 10);
        assert!(matches!(
            EpidemicStepper::new(&parameters),
            Err(EpiError::InvalidParameter(_))
        ));
    }
}
