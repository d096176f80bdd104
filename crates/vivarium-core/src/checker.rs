//! Channel dispatch and the unified check.
//!
//! [`run_channel`] maps a [`ChannelKind`] onto the function that polls it.
//! [`check_all`] runs every unit in a fixed order and then applies the
//! death transition, so a single pass after a long absence replays the
//! whole backlog exactly as separate polls would have.

use rand::Rng;
use vivarium_types::Notification;

use crate::channels::{
    ChannelKind, Tick, affection, dirt, hunger, light, search, sleep, touch, wellness,
};
use crate::lifecycle;
use crate::state::CareState;

/// Poll one unit.
pub fn run_channel<R: Rng>(
    kind: ChannelKind,
    state: &mut CareState,
    tick: &Tick<'_>,
    rng: &mut R,
) -> Vec<Notification> {
    match kind {
        ChannelKind::HungerDecay => hunger::decay(state, tick),
        ChannelKind::HungerPenalty => hunger::penalize(state, tick),
        ChannelKind::Wellness => wellness::poll(state, tick, rng),
        ChannelKind::Light => light::poll(state, tick),
        ChannelKind::Affection => affection::poll(state, tick),
        ChannelKind::DirtSpawn => dirt::spawn(state, tick),
        ChannelKind::DirtPunish => dirt::punish(state, tick),
        ChannelKind::Sleep => sleep::poll(state, tick),
        ChannelKind::SearchReset => search::reset_poll(state, tick),
        ChannelKind::TouchReset => touch::reset_poll(state, tick),
    }
}

/// Poll several units, then apply the death transition.
pub fn run_group<R: Rng>(
    kinds: &[ChannelKind],
    state: &mut CareState,
    tick: &Tick<'_>,
    rng: &mut R,
) -> Vec<Notification> {
    let mut notes = Vec::new();
    for kind in kinds {
        notes.extend(run_channel(*kind, state, tick, rng));
    }
    notes.extend(lifecycle::check_vitals(state, tick.now));
    notes
}

/// Poll every unit once.
pub fn check_all<R: Rng>(state: &mut CareState, tick: &Tick<'_>, rng: &mut R) -> Vec<Notification> {
    run_group(ChannelKind::ALL, state, tick, rng)
}
