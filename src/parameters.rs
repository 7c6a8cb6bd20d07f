use std::fs;
use std::path::Path;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::HerdError;

fn default_initial_infected() -> usize {
    1
}

/// Startup configuration for a [`Simulation`](crate::Simulation).
///
/// Parameters arrive either on the command line or from a JSON file:
///
/// ```json
/// {
///   "population_size": 100000,
///   "vacc_percentage": 0.9,
///   "virus_name": "Ebola",
///   "mortality_rate": 0.7,
///   "repro_rate": 0.25,
///   "initial_infected": 10
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    pub population_size: usize,
    /// Probability that each person outside the initially infected cohort is vaccinated.
    pub vacc_percentage: f64,
    pub virus_name: String,
    pub mortality_rate: f64,
    pub repro_rate: f64,
    #[serde(default = "default_initial_infected")]
    pub initial_infected: usize,
    /// Stop after this many steps even if the epidemic is still running.
    #[serde(default)]
    pub max_steps: Option<usize>,
}

impl Parameters {
    pub fn new(
        population_size: usize,
        vacc_percentage: f64,
        virus_name: impl Into<String>,
        mortality_rate: f64,
        repro_rate: f64,
        initial_infected: usize,
    ) -> Self {
        Parameters {
            population_size,
            vacc_percentage,
            virus_name: virus_name.into(),
            mortality_rate,
            repro_rate,
            initial_infected,
            max_steps: None,
        }
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Checks that the parameters describe a population that can be built.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), HerdError> {
        if self.population_size == 0 {
            return Err(HerdError::InvalidParameter(
                "population_size must be positive".to_string(),
            ));
        }
        if self.virus_name.trim().is_empty() {
            return Err(HerdError::InvalidParameter(
                "virus_name must not be empty".to_string(),
            ));
        }
        // The name becomes part of the report file names.
        if self.virus_name.contains(['/', '\\']) || self.virus_name.contains("..") {
            return Err(HerdError::InvalidParameter(format!(
                "virus_name must not contain path separators or '..', got {:?}",
                self.virus_name
            )));
        }
        for (name, value) in [
            ("vacc_percentage", self.vacc_percentage),
            ("mortality_rate", self.mortality_rate),
            ("repro_rate", self.repro_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(HerdError::InvalidParameter(format!(
                    "{name} must be a probability in [0, 1], got {value}"
                )));
            }
        }
        if self.initial_infected > self.population_size {
            return Err(HerdError::InvalidParameter(format!(
                "initial_infected ({}) exceeds population_size ({})",
                self.initial_infected, self.population_size
            )));
        }
        Ok(())
    }

    /// The name shared by all report files of a run.
    pub fn file_prefix(&self) -> String {
        format!(
            "{}_simulation_pop_{}_vp_{:?}_infected_{}",
            self.virus_name, self.population_size, self.vacc_percentage, self.initial_infected
        )
    }
}

/// Reads and validates parameters from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON for [`Parameters`], or fails
/// [`Parameters::validate`].
pub fn load_parameters(path: &Path) -> Result<Parameters, HerdError> {
    trace!("loading parameters from {}", path.display());
    let data = fs::read_to_string(path)?;
    let parameters: Parameters = serde_json::from_str(&data)?;
    parameters.validate()?;
    Ok(parameters)
}
