use std::fmt::{self, Display};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;
use crate::virus::Virus;

/// Identifies a person. Ids are handed out sequentially from zero and equal the person's index
/// in the simulation's population.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub usize);

impl Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a person is in the course of the disease.
///
/// `Susceptible -> Infected -> {Dead | Immune}`. An immune person can be infected again; the
/// `immune` flag on `Infected` keeps track of that.
#[derive(Clone, Debug, PartialEq)]
pub enum HealthState {
    Susceptible,
    Infected { virus: Rc<Virus>, immune: bool },
    Immune,
    Dead,
}

#[derive(Clone, Debug)]
pub struct Person {
    id: PersonId,
    is_vaccinated: bool,
    state: HealthState,
    // Set by a transmitting contact, cleared when the infection is committed.
    pending_infection: bool,
}

impl Person {
    pub fn new(id: PersonId, is_vaccinated: bool, infection: Option<Rc<Virus>>) -> Self {
        let state = match infection {
            Some(virus) => HealthState::Infected {
                virus,
                immune: false,
            },
            None => HealthState::Susceptible,
        };
        Person {
            id,
            is_vaccinated,
            state,
            pending_infection: false,
        }
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn is_vaccinated(&self) -> bool {
        self.is_vaccinated
    }

    pub fn state(&self) -> &HealthState {
        &self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state != HealthState::Dead
    }

    /// True once the person has survived an infection, including while re-infected.
    pub fn is_immune(&self) -> bool {
        matches!(
            self.state,
            HealthState::Immune | HealthState::Infected { immune: true, .. }
        )
    }

    /// The virus this person currently carries, if any.
    pub fn infection(&self) -> Option<&Rc<Virus>> {
        match &self.state {
            HealthState::Infected { virus, .. } => Some(virus),
            _ => None,
        }
    }

    pub fn is_infected(&self) -> bool {
        self.infection().is_some()
    }

    pub fn is_pending_infection(&self) -> bool {
        self.pending_infection
    }

    /// Marks the person to be infected when the current step is committed.
    pub(crate) fn mark_pending_infection(&mut self) {
        self.pending_infection = true;
    }

    /// Starts an infection with `virus` and clears the pending marker.
    ///
    /// # Panics
    ///
    /// Panics if the person is dead.
    pub fn infect(&mut self, virus: Rc<Virus>) {
        assert!(self.is_alive(), "cannot infect dead person {}", self.id);
        let immune = self.is_immune();
        self.state = HealthState::Infected { virus, immune };
        self.pending_infection = false;
    }

    /// Decides whether the person survives their current infection.
    ///
    /// A draw below the virus's mortality rate kills; anything else (including a draw exactly
    /// equal to it) leaves the person alive, immune and no longer infected. Returns whether the
    /// person survived.
    ///
    /// # Panics
    ///
    /// Panics if the person is not alive and infected.
    pub fn resolve_survival(&mut self, rng: &mut impl RandomSource) -> bool {
        let Some(virus) = self.infection() else {
            panic!("person {} is not infected: {:?}", self.id, self.state);
        };
        let survived = rng.next_unit() >= virus.mortality_rate();
        self.state = if survived {
            HealthState::Immune
        } else {
            HealthState::Dead
        };
        survived
    }
}
