//! Observers receive notifications about what happens during a run. They only ever see shared
//! references, so they cannot change the course of the simulation, and they have no way to
//! fail it.
use log::{debug, info, trace};
use serde::Serialize;

use crate::person::Person;
use crate::simulation::InteractionOutcome;

/// Aggregate counts for one completed time step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    pub step: usize,
    pub newly_infected: usize,
    pub newly_dead: usize,
    pub total_infected: usize,
    pub total_dead: usize,
}

/// Receives structured notifications from a [`Simulation`](crate::Simulation). Every method has
/// an empty default so implementations pick the events they care about.
pub trait SimulationObserver {
    /// Called for every contact between an infected person and a random living person.
    fn on_interaction(
        &mut self,
        _person: &Person,
        _random_person: &Person,
        _outcome: InteractionOutcome,
    ) {
    }

    /// Called once per infection when it resolves.
    fn on_survival(&mut self, _person: &Person, _died: bool) {}

    fn on_time_step(&mut self, _summary: &StepSummary) {}

    /// Called once when the run loop exits, with the number of steps executed.
    fn on_finish(&mut self, _steps: usize) {}
}

/// Forwards every notification to the `log` macros. Contacts are logged at trace level,
/// survival at debug level and steps at info level.
#[derive(Default, Debug)]
pub struct LogObserver;

impl SimulationObserver for LogObserver {
    fn on_interaction(
        &mut self,
        person: &Person,
        random_person: &Person,
        outcome: InteractionOutcome,
    ) {
        trace!(
            "{} met {}: {}",
            person.id(),
            random_person.id(),
            outcome.description()
        );
    }

    fn on_survival(&mut self, person: &Person, died: bool) {
        if died {
            debug!("{} died from infection", person.id());
        } else {
            debug!("{} survived infection", person.id());
        }
    }

    fn on_time_step(&mut self, summary: &StepSummary) {
        info!(
            "step {} ended: {} new infections, {} new deaths, {} total infected, {} total dead",
            summary.step,
            summary.newly_infected,
            summary.newly_dead,
            summary.total_infected,
            summary.total_dead
        );
    }

    fn on_finish(&mut self, steps: usize) {
        info!("simulation finished after {} steps", steps);
    }
}
