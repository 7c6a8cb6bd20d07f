//! A stochastic agent-based model of herd immunity
//!
//! The model follows a fixed population through discrete time steps while a
//! single pathogen spreads through it. Each step every infected, living person
//! makes a fixed number of random contacts with other living people; contacts
//! with unvaccinated, uninfected people may transmit the pathogen. At the end of
//! the step everyone who was infected at the start of it either dies or
//! recovers, and the contacts that transmitted become the next step's infected.
//! The run ends when nobody is infected or everyone is dead.
//!
//! The central object is the [`Simulation`], which owns the population and
//! drives the process. Supporting modules provide:
//! * [`Virus`] and [`Person`], the data the simulation works on
//! * [`Parameters`], the validated startup configuration
//! * [`RandomSource`], the explicitly seeded randomness every draw goes through
//! * [`SimulationObserver`], through which the simulation reports what happens,
//!   with a logging observer and a CSV report observer built in
//! * [`runner`], the command line entry point
pub mod error;
pub mod log;
pub mod observer;
pub mod parameters;
pub mod person;
pub mod random;
pub mod report;
pub mod runner;
pub mod simulation;
pub mod virus;

pub use error::HerdError;
pub use observer::{LogObserver, SimulationObserver, StepSummary};
pub use parameters::{load_parameters, Parameters};
pub use person::{HealthState, Person, PersonId};
pub use random::{RandomSource, SeededRng};
pub use report::ReportObserver;
pub use simulation::{InteractionOutcome, Simulation, CONTACTS_PER_STEP};
pub use virus::Virus;

// Re-exports for users of the library
pub use crate::log::{debug, error, info, trace, warn};
pub use rand;
