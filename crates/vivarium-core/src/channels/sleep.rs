//! The night window, going to bed, and waking up.
//!
//! Sleep owns no ledger entry. It is level-triggered on a slow cadence:
//! inside the night window an awake pet raises `needSleep`; outside it a
//! sleeping pet wakes up on its own. Waking a pet early costs friendship
//! and wellness in proportion to the hours left until morning.

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use tracing::info;
use vivarium_types::{EnvFlag, Narrative, Notification, Origin};

use super::{Gate, Tick};
use crate::config::SleepConfig;
use crate::state::{CareState, vital_delta};

/// Seconds in a day.
const DAY_SECS: u32 = 86_400;

/// Seconds in an hour.
const HOUR_SECS: u32 = 3_600;

/// Why a sleep request was refused, or that it succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The pet went to bed.
    Asleep,
    /// Already sleeping.
    AlreadyAsleep,
    /// It is not night.
    NotNight,
    /// No interactive pet (absent, egg, terminal, or away).
    Unavailable,
}

/// The result of an explicit wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// Woken inside the night window; penalised by `hours_early`.
    Early {
        /// Whole hours (rounded up) until the end of the night.
        hours_early: u32,
    },
    /// Woken after the night window; no penalty.
    Rested,
    /// The pet is not sleeping.
    NotSleeping,
}

/// Whether `local` falls in the night window, which wraps midnight.
pub fn in_night_window(local: NaiveTime, config: &SleepConfig) -> bool {
    if config.night_start <= config.night_end {
        local >= config.night_start && local < config.night_end
    } else {
        local >= config.night_start || local < config.night_end
    }
}

/// Whole hours, rounded up, from `local` until the end of the night.
pub fn hours_until_morning(local: NaiveTime, config: &SleepConfig) -> u32 {
    let now = local.num_seconds_from_midnight();
    let end = config.night_end.num_seconds_from_midnight();
    let remaining = if now <= end {
        end.saturating_sub(now)
    } else {
        DAY_SECS.saturating_sub(now).saturating_add(end)
    };
    remaining.div_ceil(HOUR_SECS)
}

/// Whether the pet can act on sleep at all. A pet that is away, frozen,
/// or dead is left exactly as it is.
fn can_sleep(state: &CareState) -> bool {
    Gate::of(&state.pet) == Gate::Open && !state.pet.is_leaving
}

/// Poll the night window.
pub fn poll(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !can_sleep(state) {
        return Vec::new();
    }
    let night = in_night_window(tick.local, &tick.config.sleep);
    let sleeping = state.env.is_active(EnvFlag::IsSleeping);

    if night {
        if !sleeping {
            state.env.set(EnvFlag::NeedSleep, true);
        }
        return Vec::new();
    }

    state.env.set(EnvFlag::NeedSleep, false);
    if !sleeping {
        return Vec::new();
    }
    state.env.set(EnvFlag::IsSleeping, false);
    info!(local = %tick.local, "Pet woke up naturally");
    vec![Notification::narrative(
        tick.now,
        Origin::Check,
        Narrative::AwokeNaturally,
        "good morning",
    )]
}

/// Put the pet to bed.
pub fn start_sleep(state: &mut CareState, tick: &Tick<'_>) -> SleepOutcome {
    if !can_sleep(state) {
        return SleepOutcome::Unavailable;
    }
    if state.env.is_active(EnvFlag::IsSleeping) {
        return SleepOutcome::AlreadyAsleep;
    }
    if !in_night_window(tick.local, &tick.config.sleep) {
        return SleepOutcome::NotNight;
    }
    state.env.set(EnvFlag::IsSleeping, true);
    state.env.set(EnvFlag::NeedSleep, false);
    info!(local = %tick.local, "Pet went to sleep");
    SleepOutcome::Asleep
}

/// Wake the pet. Waking inside the night window costs one friendship per
/// hour left and one wellness per two hours left, both rounded up.
pub fn wake_up(state: &mut CareState, tick: &Tick<'_>) -> (WakeOutcome, Vec<Notification>) {
    if !can_sleep(state) || !state.env.is_active(EnvFlag::IsSleeping) {
        return (WakeOutcome::NotSleeping, Vec::new());
    }
    state.env.set(EnvFlag::IsSleeping, false);
    if !in_night_window(tick.local, &tick.config.sleep) {
        return (WakeOutcome::Rested, Vec::new());
    }

    let hours = hours_until_morning(tick.local, &tick.config.sleep);
    let before = state.pet.clone();
    state.pet.lose_friendship(Decimal::from(hours));
    state.pet.lose_wellness(hours.div_ceil(2));
    state.env.set(EnvFlag::NeedSleep, true);
    info!(hours_early = hours, "Pet woken early");

    let delta = vital_delta(&before, &state.pet);
    let notes = if delta.is_zero() {
        Vec::new()
    } else {
        vec![Notification::effect(tick.now, Origin::Player, 1, delta)]
    };
    (WakeOutcome::Early { hours_early: hours }, notes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use vivarium_types::{LifeCycle, PetState, Rarity};

    use super::*;
    use crate::config::VivariumConfig;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 23, 0, 0).unwrap()
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

    fn tick_at(config: &VivariumConfig, local: NaiveTime) -> Tick<'_> {
        Tick {
            now: t0(),
            local,
            config,
        }
    }

    #[test]
    fn night_window_wraps_midnight() {
        let config = SleepConfig::default();
        assert!(!in_night_window(time(22, 58), &config));
        assert!(in_night_window(time(22, 59), &config));
        assert!(in_night_window(time(3, 0), &config));
        assert!(!in_night_window(time(7, 0), &config));
    }

    #[test]
    fn hours_round_up() {
        let config = SleepConfig::default();
        assert_eq!(hours_until_morning(time(23, 0), &config), 8);
        assert_eq!(hours_until_morning(time(3, 30), &config), 4);
        assert_eq!(hours_until_morning(time(6, 59), &config), 1);
    }

    #[test]
    fn night_raises_need_sleep() {
        let config = VivariumConfig::default();
        let mut state = child();
        poll(&mut state, &tick_at(&config, time(23, 30)));
        assert!(state.env.is_active(EnvFlag::NeedSleep));
    }

    #[test]
    fn sleep_only_at_night() {
        let config = VivariumConfig::default();
        let mut state = child();
        assert_eq!(
            start_sleep(&mut state, &tick_at(&config, time(15, 0))),
            SleepOutcome::NotNight
        );
        assert_eq!(
            start_sleep(&mut state, &tick_at(&config, time(23, 0))),
            SleepOutcome::Asleep
        );
        assert!(!state.env.is_active(EnvFlag::NeedSleep));
        assert_eq!(
            start_sleep(&mut state, &tick_at(&config, time(23, 5))),
            SleepOutcome::AlreadyAsleep
        );
    }

    #[test]
    fn early_wake_is_penalised() {
        let config = VivariumConfig::default();
        let mut state = child();
        start_sleep(&mut state, &tick_at(&config, time(23, 0)));
        let (outcome, notes) = wake_up(&mut state, &tick_at(&config, time(2, 15)));
        assert_eq!(outcome, WakeOutcome::Early { hours_early: 5 });
        assert_eq!(state.pet.current_friendship, Decimal::from(45));
        assert_eq!(state.pet.current_wellness, 97);
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn morning_wakes_pet_naturally() {
        let config = VivariumConfig::default();
        let mut state = child();
        start_sleep(&mut state, &tick_at(&config, time(23, 0)));
        let notes = poll(&mut state, &tick_at(&config, time(7, 10)));
        assert!(!state.env.is_active(EnvFlag::IsSleeping));
        assert_eq!(notes[0].narrative_event(), Some(Narrative::AwokeNaturally));
    }

    #[test]
    fn waking_an_awake_pet_does_nothing() {
        let config = VivariumConfig::default();
        let mut state = child();
        let (outcome, notes) = wake_up(&mut state, &tick_at(&config, time(2, 0)));
        assert_eq!(outcome, WakeOutcome::NotSleeping);
        assert!(notes.is_empty());
    }

    #[test]
    fn waking_a_pet_that_ran_away_does_nothing() {
        let config = VivariumConfig::default();
        for time_stopping in [true, false] {
            let mut state = child();
            state.pet.current_friendship = Decimal::from(8);
            state.env.set(EnvFlag::IsSleeping, true);
            state.pet.is_leaving = true;
            state.pet.time_stopping = time_stopping;

            let (outcome, notes) = wake_up(&mut state, &tick_at(&config, time(2, 0)));
            assert_eq!(outcome, WakeOutcome::NotSleeping);
            assert!(notes.is_empty());
            assert_eq!(state.pet.current_friendship, Decimal::from(8));
            assert_eq!(state.pet.current_wellness, 100);
            assert!(state.env.is_active(EnvFlag::IsSleeping));
        }
    }

    #[test]
    fn dead_pets_neither_sleep_nor_wake() {
        let config = VivariumConfig::default();
        let mut state = child();
        state.env.set(EnvFlag::IsSleeping, true);
        state.pet.is_dead = true;
        state.pet.time_stopping = true;

        let (outcome, notes) = wake_up(&mut state, &tick_at(&config, time(2, 0)));
        assert_eq!(outcome, WakeOutcome::NotSleeping);
        assert!(notes.is_empty());
        assert_eq!(state.pet.current_friendship, Decimal::from(50));

        state.env.set(EnvFlag::IsSleeping, false);
        assert_eq!(
            start_sleep(&mut state, &tick_at(&config, time(23, 0))),
            SleepOutcome::Unavailable
        );
        assert!(!state.env.is_active(EnvFlag::IsSleeping));
    }

    #[test]
    fn a_pet_that_ran_away_cannot_be_put_to_bed() {
        let config = VivariumConfig::default();
        let mut state = child();
        state.pet.is_leaving = true;
        state.pet.time_stopping = true;
        assert_eq!(
            start_sleep(&mut state, &tick_at(&config, time(23, 0))),
            SleepOutcome::Unavailable
        );
        assert!(!state.env.is_active(EnvFlag::IsSleeping));
    }

    #[test]
    fn eggs_do_not_sleep() {
        let config = VivariumConfig::default();
        let mut state = child();
        state.pet.life_cycle = Some(LifeCycle::Egg);
        assert_eq!(
            start_sleep(&mut state, &tick_at(&config, time(23, 0))),
            SleepOutcome::Unavailable
        );
    }
}
