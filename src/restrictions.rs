//! Government measures that change the transmission rate during a run.
//!
//! Two styles exist and a run uses at most one of them:
//!
//! * A calendar policy overwrites R0 on fixed simulated days. This reproduces published dates
//!   (e.g. the province-wide quarantine) and is what the scenario presets use.
//! * A threshold policy looks at current prevalence on a fixed cadence, resets `beta` to its
//!   native value and applies the measure of the highest tier whose threshold is exceeded.
//!
//! Both are plain data so that scenarios can be loaded from a configuration file.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::compartments::CompartmentState;
use crate::error::EpiError;
use crate::rates::RateParameters;

/// Transmission rate used while a lockdown is in force, unless configured otherwise.
pub const DEFAULT_LOCKDOWN_BETA: f64 = 0.01;
/// Threshold policies re-evaluate prevalence once a week by default.
pub const DEFAULT_CADENCE_DAYS: usize = 7;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestrictionPolicy {
    #[default]
    None,
    Calendar {
        changes: Vec<RateChange>,
    },
    Threshold(ThresholdPolicy),
}

/// Overwrite R0 with `r0` at the start of simulated day `day` (0-indexed).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub day: usize,
    pub r0: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    ClosedSchools,
    MasksInterior,
    MasksExterior,
    Lockdown,
}

impl Measure {
    /// The restricted transmission rate given the unrestricted one.
    #[must_use]
    pub fn restrict(self, native_beta: f64, lockdown_beta: f64) -> f64 {
        match self {
            Measure::ClosedSchools => native_beta * 0.75,
            Measure::MasksInterior => native_beta * 0.5,
            Measure::MasksExterior => native_beta * 0.3,
            Measure::Lockdown => lockdown_beta,
        }
    }
}

impl Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Measure::ClosedSchools => "closed schools and cinemas",
            Measure::MasksInterior => "masks in interior",
            Measure::MasksExterior => "masks in exterior",
            Measure::Lockdown => "lockdown",
        };
        write!(f, "{name}")
    }
}

/// A measure that applies while prevalence is strictly above `prevalence` (a fraction of the
/// population).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestrictionTier {
    pub prevalence: f64,
    pub measure: Measure,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    pub cadence_days: usize,
    pub lockdown_beta: f64,
    pub tiers: Vec<RestrictionTier>,
}

/// Weekly re-evaluation with four tiers, checked from the highest:
///
/// | prevalence above | measure | transmission rate |
/// |---|---|---|
/// | 2% | lockdown | `lockdown_beta` |
/// | 1% | masks in exterior | `0.3 * beta0` |
/// | 0.1% | masks in interior | `0.5 * beta0` |
/// | 0 | closed schools and cinemas | `0.75 * beta0` |
///
/// The lowest tier starts at zero, so a single infected person is enough to close schools on the
/// first evaluated day. Configure a positive threshold for it to wait for community spread.
impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy {
            cadence_days: DEFAULT_CADENCE_DAYS,
            lockdown_beta: DEFAULT_LOCKDOWN_BETA,
            tiers: vec![
                RestrictionTier {
                    prevalence: 0.02,
                    measure: Measure::Lockdown,
                },
                RestrictionTier {
                    prevalence: 0.01,
                    measure: Measure::MasksExterior,
                },
                RestrictionTier {
                    prevalence: 0.001,
                    measure: Measure::MasksInterior,
                },
                RestrictionTier {
                    prevalence: 0.0,
                    measure: Measure::ClosedSchools,
                },
            ],
        }
    }
}

impl ThresholdPolicy {
    /// The measure for the given prevalence. Higher tiers take precedence.
    #[must_use]
    pub fn select(&self, prevalence: f64) -> Option<Measure> {
        self.tiers
            .iter()
            .filter(|tier| prevalence > tier.prevalence)
            .max_by(|a, b| a.prevalence.total_cmp(&b.prevalence))
            .map(|tier| tier.measure)
    }
}

/// What a policy did on a given day.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RateAdjustment {
    R0Changed(f64),
    /// Threshold re-evaluation; `None` means `beta` went back to its native value.
    MeasureApplied(Option<Measure>),
}

impl RestrictionPolicy {
    /// The calendar changes used by the restricted scenario presets: the new-year travel spike,
    /// the province-wide quarantine, and R0 falling below one roughly two months in.
    #[must_use]
    pub fn hubei_calendar() -> Self {
        RestrictionPolicy::Calendar {
            changes: vec![
                RateChange { day: 23, r0: 6.6037 },
                RateChange { day: 27, r0: 3.7732 },
                RateChange { day: 60, r0: 0.8 },
            ],
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, RestrictionPolicy::None)
    }

    /// Checks that the policy can be applied to a run.
    ///
    /// # Errors
    ///
    /// Returns `EpiError::InvalidParameter` for non-finite or negative values and a zero
    /// cadence.
    pub fn validate(&self) -> Result<(), EpiError> {
        match self {
            RestrictionPolicy::None => Ok(()),
            RestrictionPolicy::Calendar { changes } => {
                for change in changes {
                    if !change.r0.is_finite() || change.r0 < 0.0 {
                        return Err(EpiError::InvalidParameter(format!(
                            "R0 change on day {} must be finite and non-negative, got {}",
                            change.day, change.r0
                        )));
                    }
                }
                Ok(())
            }
            RestrictionPolicy::Threshold(policy) => {
                if policy.cadence_days == 0 {
                    return Err(EpiError::InvalidParameter(
                        "restriction cadence must be at least one day".to_string(),
                    ));
                }
                if !policy.lockdown_beta.is_finite() || policy.lockdown_beta < 0.0 {
                    return Err(EpiError::InvalidParameter(format!(
                        "lockdown transmission rate must be finite and non-negative, got {}",
                        policy.lockdown_beta
                    )));
                }
                for tier in &policy.tiers {
                    if !tier.prevalence.is_finite() || tier.prevalence < 0.0 {
                        return Err(EpiError::InvalidParameter(format!(
                            "threshold for {} must be a non-negative fraction, got {}",
                            tier.measure, tier.prevalence
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Applies whatever this policy schedules for simulated day `day` (0-indexed).
    pub fn apply(
        &self,
        day: usize,
        state: &CompartmentState,
        rates: &mut RateParameters,
    ) -> Option<RateAdjustment> {
        match self {
            RestrictionPolicy::None => None,
            RestrictionPolicy::Calendar { changes } => {
                let mut adjustment = None;
                for change in changes.iter().filter(|change| change.day == day) {
                    rates.set_basic_reproduction_number(change.r0);
                    adjustment = Some(RateAdjustment::R0Changed(change.r0));
                }
                adjustment
            }
            RestrictionPolicy::Threshold(policy) => {
                if day % policy.cadence_days != 0 {
                    return None;
                }
                rates.reset_beta();
                let measure = policy.select(state.prevalence());
                if let Some(measure) = measure {
                    rates.beta = measure.restrict(rates.native_beta(), policy.lockdown_beta);
                }
                Some(RateAdjustment::MeasureApplied(measure))
            }
        }
    }
}
