//! Day/night and the darkness penalty.
//!
//! `is_day` is refreshed on every poll from local time. During the active
//! window the pet needs light: if it is neither daytime nor the lamp is on,
//! the `needLight` flag is raised and friendship and wellness drain every
//! interval.

use rust_decimal::Decimal;
use tracing::{debug, info};
use vivarium_types::{Channel, EnvFlag, EnvironmentState, Notification};

use super::{Tick, admit, summarize, times};
use crate::catchup;
use crate::config::{LightConfig, minutes};
use crate::state::CareState;

/// Whether `hour` is daylight.
pub const fn is_daytime(hour: u32, config: &LightConfig) -> bool {
    hour >= config.day_start_hour && hour < config.day_end_hour
}

/// Whether `hour` falls inside the window where darkness is penalised.
pub const fn in_active_window(hour: u32, config: &LightConfig) -> bool {
    hour >= config.active_start_hour && hour < config.active_end_hour
}

/// Poll the light channel.
pub fn poll(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    let config = &tick.config.light;
    let hour = tick.hour();
    state.env.is_day = is_daytime(hour, config);

    if !admit(state, &[Channel::LightPenalty]) {
        return Vec::new();
    }

    let dark = in_active_window(hour, config) && !state.env.is_day && !state.env.light_on;
    state.env.set(EnvFlag::NeedLight, dark);
    if !dark {
        state.ledger.clear(Channel::LightPenalty);
        return Vec::new();
    }

    let interval = minutes(config.interval_minutes);
    let Some(ticks) = catchup::run(&mut state.ledger, Channel::LightPenalty, tick.now, interval)
    else {
        return Vec::new();
    };

    let before = state.pet.clone();
    state
        .pet
        .lose_friendship(Decimal::from(times(config.friendship_loss, ticks)));
    state.pet.lose_wellness(times(config.wellness_loss, ticks));
    info!(ticks, hour, "Darkness penalty applied");
    summarize(tick, Channel::LightPenalty, ticks, &before, &state.pet)
        .into_iter()
        .collect()
}

/// Flip the room light. Returns the new state.
pub fn toggle(env: &mut EnvironmentState) -> bool {
    env.light_on = !env.light_on;
    if env.light_on {
        env.set(EnvFlag::NeedLight, false);
    }
    debug!(light_on = env.light_on, "Light toggled");
    env.light_on
}
