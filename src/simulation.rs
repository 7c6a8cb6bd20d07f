//! The simulation engine.
//!
//! A [`Simulation`] builds its population once and then repeats [`Simulation::time_step`] until
//! nobody is infected or everybody is dead. Each step:
//!
//! 1. every infected, living person makes [`CONTACTS_PER_STEP`] contacts with living people
//!    chosen uniformly at random (with replacement, so self-contact is possible);
//! 2. everyone who was infected at the start of the step either dies or recovers;
//! 3. the people infected by this step's contacts become the infected of the next step.
//!
//! Infections acquired during a step are held as pending until the step is committed, so they
//! neither spread nor resolve before the next step.
use std::rc::Rc;

use log::{debug, trace, warn};
use serde::Serialize;

use crate::error::HerdError;
use crate::observer::{SimulationObserver, StepSummary};
use crate::parameters::Parameters;
use crate::person::{Person, PersonId};
use crate::random::{RandomSource, SeededRng};
use crate::virus::Virus;

/// Contacts each infected person makes per step, independent of population size.
pub const CONTACTS_PER_STEP: usize = 100;

/// What a single contact did.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum InteractionOutcome {
    /// The contacted person is vaccinated.
    Vaccinated,
    /// The contacted person is infected already, or will be at the end of the step.
    AlreadyInfected,
    Transmitted,
    NoTransmission,
}

impl InteractionOutcome {
    pub fn did_infect(self) -> bool {
        self == InteractionOutcome::Transmitted
    }

    pub fn description(self) -> &'static str {
        match self {
            InteractionOutcome::Vaccinated => "blocked by vaccination",
            InteractionOutcome::AlreadyInfected => "already infected",
            InteractionOutcome::Transmitted => "transmitted",
            InteractionOutcome::NoTransmission => "contact without transmission",
        }
    }
}

pub struct Simulation<R: RandomSource = SeededRng> {
    parameters: Parameters,
    virus: Rc<Virus>,
    population: Vec<Person>,
    next_person_id: usize,
    current_infected: usize,
    total_infected: usize,
    total_dead: usize,
    // Ids marked pending during the current step, in the order they were infected.
    newly_infected: Vec<PersonId>,
    rng: R,
    observers: Vec<Box<dyn SimulationObserver>>,
}

impl<R: RandomSource> Simulation<R> {
    /// Builds the virus and the population described by `parameters`.
    ///
    /// The first `initial_infected` people are infected and unvaccinated. Everyone else is
    /// vaccinated with probability `vacc_percentage`, independently.
    ///
    /// # Errors
    ///
    /// Returns `HerdError::InvalidParameter` if the parameters fail validation.
    pub fn new(parameters: Parameters, rng: R) -> Result<Self, HerdError> {
        parameters.validate()?;
        let virus = Rc::new(Virus::new(
            parameters.virus_name.clone(),
            parameters.mortality_rate,
            parameters.repro_rate,
        ));
        let initial_infected = parameters.initial_infected;

        let mut simulation = Simulation {
            virus,
            population: Vec::with_capacity(parameters.population_size),
            next_person_id: 0,
            current_infected: initial_infected,
            total_infected: initial_infected,
            total_dead: 0,
            newly_infected: Vec::new(),
            rng,
            observers: Vec::new(),
            parameters,
        };
        simulation.create_population();
        debug!(
            "created population of {} ({} infected, {} vaccinated)",
            simulation.population.len(),
            initial_infected,
            simulation.vaccinated_count()
        );
        Ok(simulation)
    }

    fn create_population(&mut self) {
        let initial_infected = self.parameters.initial_infected;
        for _ in 0..self.parameters.population_size {
            let id = PersonId(self.next_person_id);
            let person = if id.0 < initial_infected {
                Person::new(id, false, Some(Rc::clone(&self.virus)))
            } else {
                let is_vaccinated = self.rng.next_bool(self.parameters.vacc_percentage);
                Person::new(id, is_vaccinated, None)
            };
            self.population.push(person);
            self.next_person_id += 1;
        }
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver>) {
        self.observers.push(observer);
    }

    /// The run continues while somebody is infected and somebody is alive.
    pub fn should_continue(&self) -> bool {
        self.current_infected > 0 && self.total_dead < self.parameters.population_size
    }

    /// Runs steps until [`Simulation::should_continue`] is false, or until `max_steps` steps
    /// have run if that is set. Returns the number of steps executed.
    pub fn run(&mut self) -> usize {
        let mut step = 0;
        while self.should_continue() {
            if self.parameters.max_steps.is_some_and(|max_steps| step >= max_steps) {
                warn!(
                    "stopping after {} steps with {} people still infected",
                    step, self.current_infected
                );
                break;
            }
            let (newly_infected, newly_dead) = self.time_step();
            let summary = StepSummary {
                step,
                newly_infected,
                newly_dead,
                total_infected: self.total_infected,
                total_dead: self.total_dead,
            };
            for observer in &mut self.observers {
                observer.on_time_step(&summary);
            }
            step += 1;
        }
        for observer in &mut self.observers {
            observer.on_finish(step);
        }
        step
    }

    /// Executes one step and returns `(newly_infected, newly_dead)`.
    pub fn time_step(&mut self) -> (usize, usize) {
        let living: Vec<PersonId> = self
            .population
            .iter()
            .filter(|person| person.is_alive())
            .map(Person::id)
            .collect();
        let infected: Vec<PersonId> = living
            .iter()
            .copied()
            .filter(|id| self.population[id.0].is_infected())
            .collect();
        trace!(
            "step starting with {} living, {} infected",
            living.len(),
            infected.len()
        );

        for &person in &infected {
            for _ in 0..CONTACTS_PER_STEP {
                let random_person = living[self.rng.next_index(living.len())];
                self.interaction(person, random_person);
            }
        }

        let mut newly_dead = 0;
        for &id in &infected {
            let survived = self.population[id.0].resolve_survival(&mut self.rng);
            if !survived {
                newly_dead += 1;
            }
            for observer in &mut self.observers {
                observer.on_survival(&self.population[id.0], !survived);
            }
        }
        self.total_dead += newly_dead;

        let newly_infected = self.infect_newly_infected();
        (newly_infected, newly_dead)
    }

    /// Decides whether `person` infects `random_person` in one contact.
    ///
    /// A vaccinated or already infected (or pending) `random_person` is unaffected. Otherwise
    /// the infection is transmitted if a uniform draw is at most the virus's `repro_rate`, and
    /// `random_person` becomes pending until the end of the step. Immunity from an earlier
    /// infection does not protect against transmission.
    ///
    /// # Panics
    ///
    /// Panics if either person is dead, or if transmission is attempted from a person who is not
    /// infected.
    pub fn interaction(&mut self, person: PersonId, random_person: PersonId) -> InteractionOutcome {
        let infector = &self.population[person.0];
        let target = &self.population[random_person.0];
        assert!(infector.is_alive(), "person {person} is dead");
        assert!(target.is_alive(), "random person {random_person} is dead");

        let outcome = if target.is_vaccinated() {
            InteractionOutcome::Vaccinated
        } else if target.is_infected() || target.is_pending_infection() {
            InteractionOutcome::AlreadyInfected
        } else {
            let Some(virus) = infector.infection() else {
                panic!("person {person} is not infected");
            };
            if self.rng.next_unit() <= virus.repro_rate() {
                InteractionOutcome::Transmitted
            } else {
                InteractionOutcome::NoTransmission
            }
        };

        if outcome.did_infect() {
            self.population[random_person.0].mark_pending_infection();
            self.newly_infected.push(random_person);
        }
        for observer in &mut self.observers {
            observer.on_interaction(
                &self.population[person.0],
                &self.population[random_person.0],
                outcome,
            );
        }
        outcome
    }

    /// Infects everyone marked pending during this step and returns how many there were.
    fn infect_newly_infected(&mut self) -> usize {
        let newly_infected = std::mem::take(&mut self.newly_infected);
        for id in &newly_infected {
            self.population[id.0].infect(Rc::clone(&self.virus));
        }
        self.current_infected = newly_infected.len();
        self.total_infected += newly_infected.len();
        newly_infected.len()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn virus(&self) -> &Virus {
        &self.virus
    }

    pub fn population(&self) -> &[Person] {
        &self.population
    }

    /// The id the next person would receive.
    pub fn next_person_id(&self) -> PersonId {
        PersonId(self.next_person_id)
    }

    /// People whose infection was committed at the end of the last step.
    pub fn current_infected(&self) -> usize {
        self.current_infected
    }

    /// Everyone ever infected, including the initially infected.
    pub fn total_infected(&self) -> usize {
        self.total_infected
    }

    pub fn total_dead(&self) -> usize {
        self.total_dead
    }

    /// Ids marked pending so far in the current step.
    pub fn newly_infected(&self) -> &[PersonId] {
        &self.newly_infected
    }

    pub fn vaccinated_count(&self) -> usize {
        self.population
            .iter()
            .filter(|person| person.is_vaccinated())
            .count()
    }
}
