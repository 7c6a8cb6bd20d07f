use serde::{Deserialize, Serialize};

/// A pathogen. Immutable once built; infected people share it through an `Rc`.
///
/// Probabilities are not validated here. [`Parameters::validate`](crate::Parameters::validate)
/// checks them before a simulation is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Virus {
    name: String,
    mortality_rate: f64,
    repro_rate: f64,
}

impl Virus {
    pub fn new(name: impl Into<String>, mortality_rate: f64, repro_rate: f64) -> Self {
        Virus {
            name: name.into(),
            mortality_rate,
            repro_rate,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Probability that an infection ends in death.
    pub fn mortality_rate(&self) -> f64 {
        self.mortality_rate
    }

    /// Probability that a single contact with a susceptible person transmits.
    pub fn repro_rate(&self) -> f64 {
        self.repro_rate
    }
}
