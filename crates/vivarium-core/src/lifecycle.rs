//! Lifecycle transitions.
//!
//! Birth, hatching, evolution, death, revival, release, and the two
//! outcomes of a search (return home, lost for good). Channels observe the
//! results of these transitions through the pet flags; the transitions
//! themselves own every bulk ledger operation:
//!
//! | Transition | Ledger |
//! |------------|--------|
//! | birth, hatch | every entry set to `now` |
//! | return home, lost, revive | every entry and every punish clock reset to `now` |
//! | release | every entry nulled |

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use vivarium_types::{
    EnvFlag, EnvironmentState, LifeCycle, Narrative, Notification, Origin, PetState, Rarity,
};

use crate::config::{NewbornConfig, SearchConfig};
use crate::error::CareError;
use crate::state::{CareState, SearchData};

/// Breed catalog entry used at birth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreedProfile {
    /// Catalog key.
    pub key: String,
    /// Hunger lost per decay interval.
    pub hunger_speed: u32,
}

impl BreedProfile {
    /// Create a profile.
    pub fn new(key: impl Into<String>, hunger_speed: u32) -> Self {
        Self {
            key: key.into(),
            hunger_speed,
        }
    }
}

fn narrate(now: DateTime<Utc>, narrative: Narrative, message: &str) -> Notification {
    Notification::narrative(now, Origin::Lifecycle, narrative, message)
}

/// Populate an empty slot with a new egg.
///
/// # Errors
///
/// Returns [`CareError::PetAlreadyPresent`] if any pet, living or dead,
/// still occupies the slot.
pub fn birth(
    state: &mut CareState,
    now: DateTime<Utc>,
    rarity: Rarity,
    breed: &BreedProfile,
    name: Option<String>,
    newborn: &NewbornConfig,
) -> Result<Notification, CareError> {
    if state.pet.is_present() {
        return Err(CareError::PetAlreadyPresent);
    }
    let env = EnvironmentState {
        character_position: state.env.character_position,
        bed_position: state.env.bed_position,
        ..EnvironmentState::default()
    };
    *state = CareState {
        pet: PetState {
            rare: Some(rarity),
            breed_key: Some(breed.key.clone()),
            life_cycle: Some(LifeCycle::Egg),
            name,
            born_at: None,
            current_health: newborn.health,
            max_health: newborn.health,
            current_hunger: newborn.hunger,
            max_hunger: newborn.hunger,
            current_friendship: Decimal::from(newborn.friendship),
            max_friendship: Decimal::from(newborn.max_friendship),
            current_wellness: newborn.wellness,
            max_wellness: newborn.wellness,
            hunger_speed: breed.hunger_speed,
            ..PetState::default()
        },
        env,
        ..CareState::default()
    };
    state.ledger.initialize_all(now);
    info!(rarity = %rarity, breed = %breed.key, "Egg born");
    Ok(narrate(now, Narrative::Born, "a new egg arrived"))
}

/// Hatch the egg into a child.
///
/// # Errors
///
/// Returns [`CareError::NotAnEgg`] unless the pet is a living egg.
pub fn hatch(state: &mut CareState, now: DateTime<Utc>) -> Result<Notification, CareError> {
    let pet = &mut state.pet;
    if !pet.is_present() || pet.is_terminal() || pet.life_cycle != Some(LifeCycle::Egg) {
        return Err(CareError::NotAnEgg {
            life_cycle: pet.life_cycle,
        });
    }
    pet.life_cycle = Some(LifeCycle::Child);
    pet.born_at = Some(now);
    state.ledger.initialize_all(now);
    info!("Egg hatched");
    Ok(narrate(now, Narrative::Hatched, "the egg hatched"))
}

/// Promote a child to its evolved form. Returns `None` if the pet is not
/// a living child.
pub fn evolve(state: &mut CareState, now: DateTime<Utc>) -> Option<Notification> {
    let pet = &mut state.pet;
    if pet.is_terminal() || pet.life_cycle != Some(LifeCycle::Child) {
        return None;
    }
    pet.life_cycle = Some(LifeCycle::Evolution);
    info!("Pet evolved");
    Some(narrate(now, Narrative::Evolved, "your pet evolved"))
}

/// Mark the pet dead and stop its clock.
fn kill(state: &mut CareState) {
    state.pet.is_dead = true;
    state.pet.time_stopping = true;
    state.pet.is_leaving = false;
    state.env.set(EnvFlag::IsSleeping, false);
    state.env.set(EnvFlag::NeedSleep, false);
}

/// Apply the death transition if health has run out.
pub fn check_vitals(state: &mut CareState, now: DateTime<Utc>) -> Option<Notification> {
    let pet = &state.pet;
    if !pet.is_present() || pet.is_terminal() || !pet.is_interactive() || pet.current_health > 0 {
        return None;
    }
    kill(state);
    warn!(name = ?state.pet.name, "Pet died");
    Some(narrate(now, Narrative::Died, "your pet has died"))
}

/// Bring a dead pet back with half its maximum health.
///
/// # Errors
///
/// Returns [`CareError::NotRevivable`] unless the pet is dead and not
/// cooked.
pub fn revive(state: &mut CareState, now: DateTime<Utc>) -> Result<Notification, CareError> {
    let pet = &mut state.pet;
    if !pet.is_present() || !pet.is_dead || pet.is_cooked {
        return Err(CareError::NotRevivable);
    }
    pet.is_dead = false;
    pet.time_stopping = false;
    pet.is_leaving = false;
    pet.max_health = pet.max_health.max(1);
    pet.current_health = pet.max_health.saturating_div(2).max(1);
    state.reset_clocks(now);
    state.search = SearchData::default();
    info!(health = state.pet.current_health, "Pet revived");
    Ok(narrate(now, Narrative::Revived, "your pet is back on its feet"))
}

/// Empty the slot entirely.
pub fn release(state: &mut CareState, now: DateTime<Utc>) -> Notification {
    let env = EnvironmentState {
        character_position: state.env.character_position,
        bed_position: state.env.bed_position,
        light_on: state.env.light_on,
        ..EnvironmentState::default()
    };
    *state = CareState {
        env,
        ..CareState::default()
    };
    state.ledger.null_all();
    info!("Pet released");
    narrate(now, Narrative::Released, "the slot is empty again")
}

/// A search found the pet.
pub fn return_home(state: &mut CareState, now: DateTime<Utc>, config: &SearchConfig) -> Notification {
    let pet = &mut state.pet;
    pet.is_leaving = false;
    pet.time_stopping = false;
    pet.is_dead = false;
    pet.current_friendship = Decimal::from(config.return_friendship).min(pet.max_friendship);
    pet.current_health = pet
        .current_health
        .max(config.return_health_floor)
        .min(pet.max_health);
    state.reset_clocks(now);
    state.search = SearchData::default();
    info!(
        friendship = %state.pet.current_friendship,
        health = state.pet.current_health,
        "Pet returned home"
    );
    narrate(now, Narrative::Returned, "you found your pet")
}

/// A search lost the pet for good.
pub fn lose(state: &mut CareState, now: DateTime<Utc>) -> Notification {
    kill(state);
    state.reset_clocks(now);
    warn!("Pet lost for good");
    narrate(now, Narrative::Lost, "your pet is gone for good")
}
