//! Low affection and leaving.
//!
//! Friendship at or below the low threshold raises `lowLikability` and
//! drains wellness every interval. Friendship below the leaving threshold
//! makes the pet run away: `is_leaving` and `time_stopping` are set, the
//! sleep flags drop, and a single narrative is published. From then on
//! every decay channel is paused until a search brings the pet home.

use rust_decimal::Decimal;
use tracing::info;
use vivarium_types::{Channel, EnvFlag, Narrative, Notification, Origin};

use super::{Tick, admit, summarize, times};
use crate::catchup;
use crate::config::minutes;
use crate::state::CareState;

/// Poll the affection channel.
pub fn poll(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !admit(state, &[Channel::LowAffection]) {
        return Vec::new();
    }

    let config = &tick.config.affection;
    let friendship = state.pet.current_friendship;
    let low = friendship <= Decimal::from(config.low_threshold);
    state.env.set(EnvFlag::LowLikability, low);

    let mut notes = Vec::new();
    if low {
        let interval = minutes(config.interval_minutes);
        if let Some(ticks) =
            catchup::run(&mut state.ledger, Channel::LowAffection, tick.now, interval)
        {
            let before = state.pet.clone();
            state.pet.lose_wellness(times(config.wellness_loss, ticks));
            info!(ticks, friendship = %friendship, "Low affection penalty applied");
            notes.extend(summarize(
                tick,
                Channel::LowAffection,
                ticks,
                &before,
                &state.pet,
            ));
        }
    } else {
        state.ledger.clear(Channel::LowAffection);
    }

    if friendship < Decimal::from(config.leaving_threshold) {
        if !state.pet.is_leaving {
            state.pet.is_leaving = true;
            state.pet.time_stopping = true;
            state.env.set(EnvFlag::IsSleeping, false);
            state.env.set(EnvFlag::NeedSleep, false);
            info!(friendship = %friendship, "Pet left home");
            notes.push(Notification::narrative(
                tick.now,
                Origin::Channel(Channel::LowAffection),
                Narrative::Left,
                "your pet ran away",
            ));
        }
    } else {
        state.pet.is_leaving = false;
    }
    notes
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
    use vivarium_types::{LifeCycle, PetState, Rarity};

    use super::*;
    use crate::config::VivariumConfig;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn child(friendship: i64) -> CareState {
        CareState {
            pet: PetState {
                rare: Some(Rarity::Normal),
                life_cycle: Some(LifeCycle::Child),
                current_health: 100,
                max_health: 100,
                current_hunger: 100,
                max_hunger: 100,
                current_friendship: Decimal::from(friendship),
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
    fn low_affection_drains_wellness() {
        let config = VivariumConfig::default();
        let mut state = child(30);
        state.ledger.set(Channel::LowAffection, Some(t0()));
        poll(&mut state, &tick_at(&config, t0() + Duration::minutes(61)));
        assert!(state.env.is_active(EnvFlag::LowLikability));
        assert_eq!(state.pet.current_wellness, 94);
    }

    #[test]
    fn recovered_affection_clears_entry() {
        let config = VivariumConfig::default();
        let mut state = child(31);
        state.ledger.set(Channel::LowAffection, Some(t0()));
        poll(&mut state, &tick_at(&config, t0() + Duration::minutes(61)));
        assert!(!state.env.is_active(EnvFlag::LowLikability));
        assert_eq!(state.ledger.get(Channel::LowAffection), None);
        assert_eq!(state.pet.current_wellness, 100);
    }

    #[test]
    fn leaving_is_announced_once() {
        let config = VivariumConfig::default();
        let mut state = child(8);

        let first = poll(&mut state, &tick_at(&config, t0()));
        assert!(state.pet.is_leaving);
        assert!(state.pet.time_stopping);
        let left = first
            .iter()
            .filter(|n| n.narrative_event() == Some(Narrative::Left))
            .count();
        assert_eq!(left, 1);

        // Time is stopped now; further polls are no-ops.
        let second = poll(&mut state, &tick_at(&config, t0() + Duration::hours(2)));
        assert!(second.is_empty());
    }

    #[test]
    fn leaving_flag_drops_once_friendship_recovers() {
        let config = VivariumConfig::default();
        let mut state = child(12);
        state.pet.is_leaving = true;
        poll(&mut state, &tick_at(&config, t0()));
        assert!(!state.pet.is_leaving);
    }

    #[test]
    fn running_away_leaves_the_bed() {
        let config = VivariumConfig::default();
        let mut state = child(8);
        state.env.set(EnvFlag::IsSleeping, true);
        state.env.set(EnvFlag::NeedSleep, true);

        poll(&mut state, &tick_at(&config, t0()));
        assert!(state.pet.is_leaving);
        assert!(!state.env.is_active(EnvFlag::IsSleeping));
        assert!(!state.env.is_active(EnvFlag::NeedSleep));
    }
}
