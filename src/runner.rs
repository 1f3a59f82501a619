use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Command, FromArgMatches as _, ValueEnum};
use humantime::format_duration;
use log::info;

use crate::compartments::ModelVariant;
use crate::error::EpiError;
use crate::log::{apply_log_settings, LogSettings};
use crate::parameters::ModelParameters;
use crate::report::CompartmentReport;
use crate::restrictions::{RestrictionPolicy, ThresholdPolicy};
use crate::scenarios::Scenario;
use crate::stepper::EpidemicStepper;
use crate::summary::{InputSummary, OutputSummary};

/// Default cli arguments for the epistep runner
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Seed for the stochastic transmission factor
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Optional path for a JSON model parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path of the CSV report
    #[arg(long, default_value = "statistics/data.csv")]
    pub output: PathBuf,

    /// Log level, either global (`info`) or per module (`epistep::stepper=trace,warn`)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Restriction policies selectable from the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RestrictionChoice {
    None,
    /// The published Hubei restriction dates
    Calendar,
    /// Tiered measures chosen weekly from the infected share of the population
    Threshold,
}

impl From<RestrictionChoice> for RestrictionPolicy {
    fn from(choice: RestrictionChoice) -> Self {
        match choice {
            RestrictionChoice::None => RestrictionPolicy::None,
            RestrictionChoice::Calendar => RestrictionPolicy::hubei_calendar(),
            RestrictionChoice::Threshold => RestrictionPolicy::Threshold(ThresholdPolicy::default()),
        }
    }
}

/// Model arguments. Every flag given overrides the scenario preset or the config file.
#[derive(Args, Debug, Default)]
pub struct ModelArgs {
    /// Preset scenario (`1`-`4` are accepted as aliases)
    #[arg(value_enum)]
    pub scenario: Option<Scenario>,

    /// Population count
    #[arg(short, long)]
    pub population: Option<f64>,

    /// Initially infected
    #[arg(short, long)]
    pub infected: Option<f64>,

    /// Initially exposed (SEIRD only)
    #[arg(short, long)]
    pub exposed: Option<f64>,

    /// Transmission rate
    #[arg(short, long)]
    pub beta: Option<f64>,

    /// Basic reproduction number; sets the transmission rate to `alpha * r0`
    #[arg(long = "r0")]
    pub r0: Option<f64>,

    /// Recovery rate
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Incubation rate (SEIRD only)
    #[arg(short = 'm', long)]
    pub sigma: Option<f64>,

    /// Fatality rate (SEIRD only)
    #[arg(short, long)]
    pub omega: Option<f64>,

    /// Number of simulated days
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// Compartment model
    #[arg(short = 'x', long = "model", value_enum)]
    pub model: Option<ModelVariant>,

    /// Government restrictions
    #[arg(long, value_enum)]
    pub restrictions: Option<RestrictionChoice>,

    /// Perturb new infections by a seeded random factor in [0, 2)
    #[arg(long)]
    pub stochastic: bool,
}

fn create_epistep_cli() -> Command {
    let cli = Command::new("epistep")
        .about("Discrete-time SIR/SEIRD epidemic simulator with CSV output");
    let cli = BaseArgs::augment_args(cli);
    ModelArgs::augment_args(cli)
}

/// Runs a simulation configured from the process's command line arguments.
///
/// # Errors
/// Returns an error if argument parsing, configuration or the run fails
pub fn run_with_args() -> Result<EpidemicStepper, EpiError> {
    let matches = create_epistep_cli().get_matches();

    let base_args = BaseArgs::from_arg_matches(&matches)
        .map_err(|e| EpiError::InvalidParameter(e.to_string()))?;
    let model_args = ModelArgs::from_arg_matches(&matches)
        .map_err(|e| EpiError::InvalidParameter(e.to_string()))?;
    run_with_args_internal(&base_args, &model_args)
}

fn configure_logging(args: &BaseArgs) -> Result<(), EpiError> {
    let settings = match &args.log_level {
        Some(filters) => LogSettings::parse(filters)?,
        None => LogSettings::default(),
    };
    // An explicit level beats `-v`.
    apply_log_settings(&settings.or_verbosity(args.verbose))
}

/// Applies the precedence defaults < scenario preset or config file < explicit flags.
///
/// # Errors
/// Returns an error if the config file cannot be read, or if both a scenario and a config file
/// are given.
pub fn build_parameters(
    base_args: &BaseArgs,
    model_args: &ModelArgs,
) -> Result<ModelParameters, EpiError> {
    let mut parameters = match (model_args.scenario, &base_args.config) {
        (Some(_), Some(_)) => {
            return Err(EpiError::InvalidParameter(
                "give either a scenario or a config file, not both".to_string(),
            ));
        }
        (Some(scenario), None) => {
            info!("Using scenario preset {scenario}");
            scenario.parameters()
        }
        (None, Some(config_path)) => {
            info!("Loading model parameters from {}", config_path.display());
            ModelParameters::load_from_json(config_path)?
        }
        (None, None) => ModelParameters::default(),
    };

    if let Some(population) = model_args.population {
        parameters.population = population;
    }
    if let Some(infected) = model_args.infected {
        parameters.initial_infected = infected;
    }
    if let Some(exposed) = model_args.exposed {
        parameters.initial_exposed = exposed;
    }
    if let Some(beta) = model_args.beta {
        parameters.beta = beta;
        parameters.r0 = None;
    }
    if let Some(r0) = model_args.r0 {
        parameters.r0 = Some(r0);
    }
    if let Some(alpha) = model_args.alpha {
        parameters.alpha = alpha;
    }
    if let Some(sigma) = model_args.sigma {
        parameters.sigma = sigma;
    }
    if let Some(omega) = model_args.omega {
        parameters.omega = omega;
    }
    if let Some(steps) = model_args.steps {
        parameters.days = steps;
    }
    if let Some(model) = model_args.model {
        parameters.variant = model;
    }
    if let Some(restrictions) = model_args.restrictions {
        parameters.restrictions = restrictions.into();
    }
    if model_args.stochastic {
        parameters.stochastic = true;
    }
    if let Some(seed) = base_args.random_seed {
        parameters.seed = seed;
    }

    parameters.validate()?;
    Ok(parameters)
}

fn write_run(stepper: &mut EpidemicStepper, output: &Path) -> Result<(), EpiError> {
    let mut report = CompartmentReport::create(output, stepper.variant())?;
    stepper.run(|_, state, statistics| report.send_report(state, statistics))?;
    report.finish()
}

/// Configures, runs and reports a simulation. Returns the completed stepper.
///
/// # Errors
/// Returns an error if the configuration is invalid or the report cannot be written
pub fn run_with_args_internal(
    base_args: &BaseArgs,
    model_args: &ModelArgs,
) -> Result<EpidemicStepper, EpiError> {
    configure_logging(base_args)?;

    let parameters = build_parameters(base_args, model_args)?;
    let mut stepper = EpidemicStepper::new(&parameters)?;

    println!(
        "{}",
        InputSummary::new(&stepper, parameters.name.as_deref(), parameters.stochastic)
    );
    println!();

    let start_time = Instant::now();
    write_run(&mut stepper, &base_args.output)?;
    info!(
        "Simulated {} days in {}",
        stepper.days(),
        format_duration(start_time.elapsed())
    );

    println!("{}", OutputSummary::new(&stepper));
    Ok(stepper)
}
