pub use crate::compartments::{CompartmentState, ModelVariant};
pub use crate::error::EpiError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::parameters::{ModelParameters, ModelParametersBuilder};
pub use crate::random::{Deterministic, Perturbation, ScriptedPerturbation, UniformPerturbation};
pub use crate::rates::RateParameters;
pub use crate::report::CompartmentReport;
pub use crate::restrictions::{Measure, RateChange, RestrictionPolicy, ThresholdPolicy};
pub use crate::runner::{run_with_args, BaseArgs, ModelArgs};
pub use crate::scenarios::Scenario;
pub use crate::statistics::RunStatistics;
pub use crate::stepper::{EpidemicStepper, RunPhase};
