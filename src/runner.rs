use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{ArgAction, Parser};

use crate::error::HerdError;
use crate::log::{set_log_level, set_module_filters, LevelFilter};
use crate::observer::LogObserver;
use crate::parameters::{load_parameters, Parameters};
use crate::random::SeededRng;
use crate::report::ReportObserver;
use crate::simulation::Simulation;

/// Default random seed, so that runs are reproducible unless asked otherwise.
pub const DEFAULT_SEED: u64 = 42;

/// Simulates the spread of a virus through a partially vaccinated population
#[derive(Parser, Debug)]
#[command(name = "herd_immunity", version)]
pub struct BaseArgs {
    /// Number of people in the population
    #[arg(required_unless_present = "config")]
    pub population_size: Option<usize>,

    /// Probability that each initially healthy person is vaccinated, in [0, 1]
    #[arg(required_unless_present = "config")]
    pub vacc_percentage: Option<f64>,

    /// Name of the virus
    #[arg(required_unless_present = "config")]
    pub virus_name: Option<String>,

    /// Probability that an infection ends in death, in [0, 1]
    #[arg(required_unless_present = "config")]
    pub mortality_rate: Option<f64>,

    /// Probability that a contact with a susceptible person transmits, in [0, 1]
    #[arg(required_unless_present = "config")]
    pub repro_rate: Option<f64>,

    /// Number of people infected at the start
    #[arg(default_value = "1")]
    pub initial_infected: usize,

    /// Random seed
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub random_seed: u64,

    /// Optional path to a JSON parameters file, used instead of the positional parameters
    #[arg(short, long, conflicts_with = "population_size")]
    pub config: Option<PathBuf>,

    /// Optional directory for CSV reports
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Omit the per-contact report
    #[arg(long, requires = "output_dir")]
    pub no_interaction_report: bool,

    /// Stop after this many steps even if people are still infected
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Enable logging, either a level ("info") or per-module levels
    /// ("herd_immunity::simulation=trace,info")
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl BaseArgs {
    /// Collects the simulation parameters from the config file or the positional arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or a positional argument is missing.
    pub fn parameters(&self) -> Result<Parameters, HerdError> {
        let mut parameters = match &self.config {
            Some(path) => {
                eprintln!("Loading parameters from: {}", path.display());
                load_parameters(path)?
            }
            None => Parameters::new(
                require(self.population_size, "population_size")?,
                require(self.vacc_percentage, "vacc_percentage")?,
                require(self.virus_name.clone(), "virus_name")?,
                require(self.mortality_rate, "mortality_rate")?,
                require(self.repro_rate, "repro_rate")?,
                self.initial_infected,
            ),
        };
        if self.max_steps.is_some() {
            parameters.max_steps = self.max_steps;
        }
        Ok(parameters)
    }
}

fn require<T>(value: Option<T>, name: &str) -> Result<T, HerdError> {
    value.ok_or_else(|| HerdError::InvalidParameter(format!("missing {name}")))
}

/// Parses a `--log-level` value into a global level and per-module levels.
fn parse_log_levels(
    log_level: &str,
) -> Result<(Option<LevelFilter>, Vec<(String, LevelFilter)>), HerdError> {
    let mut global = None;
    let mut modules = Vec::new();
    for directive in log_level.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        let invalid = || HerdError::InvalidParameter(format!("invalid log level: {directive}"));
        match directive.split_once('=') {
            Some((module, level)) => {
                let level = LevelFilter::from_str(level).map_err(|_| invalid())?;
                modules.push((module.to_string(), level));
            }
            None => global = Some(LevelFilter::from_str(directive).map_err(|_| invalid())?),
        }
    }
    Ok((global, modules))
}

fn verbosity_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn configure_logging(args: &BaseArgs) -> Result<(), HerdError> {
    let mut global = verbosity_level(args.verbose);
    if let Some(log_level) = &args.log_level {
        let (level, modules) = parse_log_levels(log_level)?;
        if let Some(level) = level {
            global = global.max(level);
        }
        let filters: Vec<(&str, LevelFilter)> = modules
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&filters);
        for (module, level) in &modules {
            eprintln!("Logging enabled for {module} at level {level}");
        }
    }
    if global != LevelFilter::Off {
        set_log_level(global);
    }
    Ok(())
}

/// Builds a simulation from `args`, runs it, and returns the number of steps executed.
///
/// # Errors
///
/// Returns an error if logging, the parameters, or the report directory cannot be set up.
pub fn run_with_args(args: &BaseArgs) -> Result<usize, HerdError> {
    configure_logging(args)?;
    let parameters = args.parameters()?;

    let rng = SeededRng::from_base_seed(args.random_seed, "simulation");
    let mut simulation = Simulation::new(parameters, rng)?;
    simulation.add_observer(Box::new(LogObserver));
    if let Some(output_dir) = &args.output_dir {
        simulation.add_observer(Box::new(report_observer(
            output_dir,
            simulation.parameters(),
            args.no_interaction_report,
        )?));
    }
    Ok(simulation.run())
}

fn report_observer(
    output_dir: &Path,
    parameters: &Parameters,
    no_interaction_report: bool,
) -> Result<ReportObserver, HerdError> {
    let observer = ReportObserver::new(output_dir, parameters)?;
    Ok(if no_interaction_report {
        observer.without_interactions()
    } else {
        observer
    })
}
