//! Hunger decay and the hunger penalty.
//!
//! Decay removes `hunger_speed` points per interval until hunger reaches
//! zero. The penalty is a separate channel: once hunger falls to the
//! hungry threshold it raises the `hungry` flag and drains friendship and
//! wellness every interval, harder when the pet is starving.

use rust_decimal::Decimal;
use tracing::info;
use vivarium_types::{Channel, EnvFlag, Notification};

use super::{Tick, admit, summarize, times};
use crate::catchup;
use crate::config::minutes;
use crate::state::CareState;

/// Poll the hunger decay channel.
pub fn decay(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !admit(state, &[Channel::HungerDecay]) {
        return Vec::new();
    }
    if state.pet.current_hunger == 0 {
        state.ledger.clear(Channel::HungerDecay);
        return Vec::new();
    }

    let interval = minutes(tick.config.hunger.decay_interval_minutes);
    let Some(ticks) = catchup::run(&mut state.ledger, Channel::HungerDecay, tick.now, interval)
    else {
        return Vec::new();
    };

    let before = state.pet.clone();
    state
        .pet
        .lose_hunger(times(state.pet.hunger_speed, ticks));
    info!(
        ticks,
        hunger = state.pet.current_hunger,
        "Hunger decayed"
    );
    summarize(tick, Channel::HungerDecay, ticks, &before, &state.pet)
        .into_iter()
        .collect()
}

/// Poll the hunger penalty channel.
///
/// The `hungry` flag is refreshed on every poll, independent of ledger
/// timing.
pub fn penalize(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !admit(state, &[Channel::HungerPenalty]) {
        return Vec::new();
    }

    let config = &tick.config.hunger;
    let hungry = state.pet.current_hunger <= config.hungry_threshold;
    state.env.set(EnvFlag::Hungry, hungry);
    if !hungry {
        state.ledger.clear(Channel::HungerPenalty);
        return Vec::new();
    }

    let interval = minutes(config.penalty_interval_minutes);
    let Some(ticks) = catchup::run(&mut state.ledger, Channel::HungerPenalty, tick.now, interval)
    else {
        return Vec::new();
    };

    let (friendship, wellness) = if state.pet.current_hunger <= config.starving_threshold {
        config.starving_loss
    } else {
        config.hungry_loss
    };
    let before = state.pet.clone();
    state
        .pet
        .lose_friendship(Decimal::from(times(friendship, ticks)));
    state.pet.lose_wellness(times(wellness, ticks));
    info!(
        ticks,
        hunger = before.current_hunger,
        friendship = %state.pet.current_friendship,
        wellness = state.pet.current_wellness,
        "Hunger penalty applied"
    );
    summarize(tick, Channel::HungerPenalty, ticks, &before, &state.pet)
        .into_iter()
        .collect()
}
