//! Dirty objects: spawning, punishment, and cleaning.
//!
//! The spawn channel owns a single ledger entry and fills free slots, one
//! object per elapsed interval. While every slot is taken the elapsed
//! intervals are consumed without spawning, so a freshly cleaned slot waits
//! for the next interval boundary.
//!
//! Punishment is per object: each object's `last_punish_time` is its own
//! ledger. Once an object is older than the grace period it costs wellness
//! and friendship every interval. All objects are settled in one batch so
//! the pet sees a single summary per poll.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};
use vivarium_types::{Channel, Narrative, Notification, Origin};

use super::{Tick, admit, summarize, times};
use crate::catchup::{self, CatchUp};
use crate::config::minutes;
use crate::state::CareState;

/// Poll the spawn channel.
pub fn spawn(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !admit(state, &[Channel::DirtySpawn]) {
        return Vec::new();
    }

    let interval = minutes(tick.config.dirt.spawn_interval_minutes);
    let Some(ticks) = catchup::run(&mut state.ledger, Channel::DirtySpawn, tick.now, interval)
    else {
        return Vec::new();
    };
    let free = state.dirt.free_slots();
    if free == 0 {
        debug!(ticks, "Room full; spawn intervals skipped");
        return Vec::new();
    }

    let wanted = u8::try_from(ticks).unwrap_or(u8::MAX).min(free);
    let mut spawned = 0_u8;
    for _ in 0..wanted {
        if state.dirt.spawn(tick.now).is_some() {
            spawned = spawned.saturating_add(1);
        }
    }
    if spawned == 0 {
        return Vec::new();
    }
    info!(spawned, live = state.dirt.len(), "Dirty objects appeared");
    vec![Notification::narrative(
        tick.now,
        Origin::Channel(Channel::DirtySpawn),
        Narrative::DirtAppeared { count: spawned },
        format!("{spawned} new mess to clean"),
    )]
}

/// Poll every live object's punishment clock.
///
/// An object that has never been punished counts its ticks from its spawn time
/// and records `now` as its punish time. Later punishments advance the
/// punish time by whole intervals.
pub fn punish(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !admit(state, &[]) {
        return Vec::new();
    }

    let config = &tick.config.dirt;
    let interval = minutes(config.punish_interval_minutes);
    let mut total = 0_u32;
    for object in state.dirt.iter_mut() {
        let origin = object.last_punish_time.unwrap_or(object.spawn_time);
        let CatchUp::Due { ticks, advance_to } = catchup::assess(Some(origin), tick.now, interval)
        else {
            continue;
        };
        object.last_punish_time = Some(if object.last_punish_time.is_none() {
            tick.now
        } else {
            advance_to
        });
        debug!(slot = object.slot_id, ticks, "Dirty object punished");
        total = total.saturating_add(ticks);
    }
    if total == 0 {
        return Vec::new();
    }

    let before = state.pet.clone();
    state.pet.lose_wellness(times(config.wellness_loss, total));
    state
        .pet
        .lose_friendship(Decimal::from(times(config.friendship_loss, total)));
    info!(penalties = total, live = state.dirt.len(), "Dirt penalty applied");
    summarize(tick, Channel::DirtySpawn, total, &before, &state.pet)
        .into_iter()
        .collect()
}

/// Remove the object in `slot`. Emptying the room restarts the spawn
/// interval from `now`.
pub fn clean(state: &mut CareState, slot: u8, now: DateTime<Utc>) -> bool {
    if !state.dirt.remove(slot) {
        return false;
    }
    if state.dirt.is_empty() {
        state.ledger.set(Channel::DirtySpawn, Some(now));
    }
    debug!(slot, remaining = state.dirt.len(), "Dirty object cleaned");
    true
}

/// Remove every object. Returns how many were removed.
pub fn clean_all(state: &mut CareState, now: DateTime<Utc>) -> usize {
    let removed = state.dirt.len();
    state.dirt.clear();
    if removed > 0 {
        state.ledger.set(Channel::DirtySpawn, Some(now));
    }
    removed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{Duration, NaiveTime, TimeZone};
    use vivarium_types::{LifeCycle, PetState, Rarity};

    use super::*;
    use crate::config::VivariumConfig;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn child() -> CareState {
        CareState {
            pet: PetState {
                rare: Some(Rarity::Normal),
                life_cycle: Some(LifeCycle::Child),
                current_health: 100,
                max_health: 100,
                current_hunger: 100,
                max_hunger: 100,
                current_friendship: Decimal::from(50),
                max_friendship: Decimal::from(100),
                current_wellness: 100,
                max_wellness: 100,
                ..PetState::default()
            },
            ..CareState::default()
        }
    }

    fn tick_at(config: &VivariumConfig, now: DateTime<Utc>) -> Tick<'_> {
        Tick {
            now,
            local: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            config,
        }
    }

    #[test]
    fn spawn_fills_lowest_slots_up_to_cap() {
        let config = VivariumConfig::default();
        let mut state = child();
        state.ledger.set(Channel::DirtySpawn, Some(t0()));

        let now = t0() + Duration::hours(5);
        let notes = spawn(&mut state, &tick_at(&config, now));
        let slots: Vec<u8> = state.dirt.iter().map(|obj| obj.slot_id).collect();
        assert_eq!(slots, vec![1, 2, 3]);
        assert_eq!(
            notes[0].narrative_event(),
            Some(Narrative::DirtAppeared { count: 3 })
        );
    }

    #[test]
    fn full_room_skips_spawn_intervals() {
        let config = VivariumConfig::default();
        let mut state = child();
        for _ in 0..3 {
            state.dirt.spawn(t0());
        }
        state.ledger.set(Channel::DirtySpawn, Some(t0()));
        let now = t0() + Duration::minutes(150);
        assert!(spawn(&mut state, &tick_at(&config, now)).is_empty());
        assert_eq!(
            state.ledger.get(Channel::DirtySpawn),
            Some(t0() + Duration::hours(2))
        );
        assert!(spawn(&mut state, &tick_at(&config, now)).is_empty());
        assert_eq!(state.dirt.len(), 3);
    }

    #[test]
    fn fresh_objects_get_a_grace_period() {
        let config = VivariumConfig::default();
        let mut state = child();
        state.dirt.spawn(t0());
        let notes = punish(&mut state, &tick_at(&config, t0() + Duration::minutes(19)));
        assert!(notes.is_empty());
        assert_eq!(state.pet.current_wellness, 100);
    }

    #[test]
    fn batched_punishment_across_objects() {
        let config = VivariumConfig::default();
        let mut state = child();
        for _ in 0..3 {
            state.dirt.spawn(t0() - Duration::minutes(25));
        }
        let notes = punish(&mut state, &tick_at(&config, t0()));
        assert_eq!(state.pet.current_wellness, 97);
        assert_eq!(state.pet.current_friendship, Decimal::from(47));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "wellness -3, friendship -3, 3 penalties");
        assert!(state.dirt.iter().all(|obj| obj.last_punish_time == Some(t0())));
    }

    #[test]
    fn repeat_punishment_keeps_remainder() {
        let config = VivariumConfig::default();
        let mut state = child();
        state.dirt.spawn(t0() - Duration::hours(1));
        state
            .dirt
            .iter_mut()
            .for_each(|obj| obj.last_punish_time = Some(t0()));

        punish(&mut state, &tick_at(&config, t0() + Duration::minutes(50)));
        assert_eq!(state.pet.current_wellness, 98);
        let punished = state.dirt.iter().next().unwrap().last_punish_time;
        assert_eq!(punished, Some(t0() + Duration::minutes(40)));
    }

    #[test]
    fn cleaning_last_object_restarts_spawn_clock() {
        let mut state = child();
        state.dirt.spawn(t0());
        state.dirt.spawn(t0());
        let later = t0() + Duration::minutes(30);
        assert!(clean(&mut state, 1, later));
        assert_eq!(state.ledger.get(Channel::DirtySpawn), None);
        assert!(!clean(&mut state, 1, later));
        assert!(clean(&mut state, 2, later));
        assert_eq!(state.ledger.get(Channel::DirtySpawn), Some(later));
    }

    #[test]
    fn clean_all_empties_the_room() {
        let mut state = child();
        state.dirt.spawn(t0());
        state.dirt.spawn(t0());
        assert_eq!(clean_all(&mut state, t0()), 2);
        assert!(state.dirt.is_empty());
        assert_eq!(clean_all(&mut state, t0()), 0);
    }
}
