//! Searching for a pet that left.
//!
//! While `is_leaving` is set, each search attempt draws one outcome: the pet
//! comes home, the pet is lost for good, or nothing happens and the attempt
//! counter grows. Attempts are capped; once the cap is hit the counter
//! unlocks after a cool-down measured from the moment the cap was reached.

use chrono::Duration;
use tracing::{debug, info};
use vivarium_types::{Channel, Notification};

use super::Tick;
use crate::catchup::{self, CatchUp};
use crate::config::minutes;
use crate::lifecycle;
use crate::state::CareState;

/// The result of one search attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The pet is not away; nothing to search for.
    NotLeaving,
    /// All attempts are used up until the counter resets.
    CapReached,
    /// Too soon after the previous attempt.
    CoolingDown,
    /// The pet came home.
    Returned,
    /// The pet is gone for good.
    Lost,
    /// Nothing found this time.
    NotFound {
        /// Attempts used so far.
        attempts: u32,
    },
}

/// Attempt a search with a percentile `roll` in `0..100`.
pub fn search(state: &mut CareState, tick: &Tick<'_>, roll: u32) -> (SearchOutcome, Vec<Notification>) {
    let config = &tick.config.search;
    if !state.pet.is_present() || state.pet.is_terminal() || !state.pet.is_leaving {
        return (SearchOutcome::NotLeaving, Vec::new());
    }
    if state.search.attempts >= config.max_attempts {
        return (SearchOutcome::CapReached, Vec::new());
    }
    let cooldown = Duration::seconds(i64::from(config.cooldown_secs));
    if let Some(last) = state.search.last_attempt {
        let since = tick.now.signed_duration_since(last);
        if since >= Duration::zero() && since < cooldown {
            return (SearchOutcome::CoolingDown, Vec::new());
        }
    }
    state.search.last_attempt = Some(tick.now);

    if roll < config.return_percent {
        let note = lifecycle::return_home(state, tick.now, config);
        return (SearchOutcome::Returned, vec![note]);
    }
    if roll < config.return_percent.saturating_add(config.lost_percent) {
        let note = lifecycle::lose(state, tick.now);
        return (SearchOutcome::Lost, vec![note]);
    }

    state.search.attempts = state.search.attempts.saturating_add(1);
    if state.search.attempts >= config.max_attempts {
        state.ledger.set(Channel::SearchCooldown, Some(tick.now));
        info!(attempts = state.search.attempts, "Search attempts exhausted");
    } else {
        debug!(attempts = state.search.attempts, roll, "Search found nothing");
    }
    (
        SearchOutcome::NotFound {
            attempts: state.search.attempts,
        },
        Vec::new(),
    )
}

/// Poll the attempt reset.
pub fn reset_poll(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    if !state.pet.is_present() || state.pet.is_terminal() {
        state.search.attempts = 0;
        state.ledger.clear(Channel::SearchCooldown);
        return Vec::new();
    }
    if state.search.attempts < tick.config.search.max_attempts {
        return Vec::new();
    }
    let interval = minutes(tick.config.search.reset_minutes);
    match catchup::assess(state.ledger.get(Channel::SearchCooldown), tick.now, interval) {
        CatchUp::Baseline => state.ledger.set(Channel::SearchCooldown, Some(tick.now)),
        CatchUp::Waiting => {}
        CatchUp::Due { .. } => {
            state.search.attempts = 0;
            state.ledger.clear(Channel::SearchCooldown);
            info!("Search attempts reset");
        }
    }
    Vec::new()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use vivarium_types::{LifeCycle, Narrative, PetState, Rarity};

    use super::*;
    use crate::config::VivariumConfig;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn away() -> CareState {
        CareState {
            pet: PetState {
                rare: Some(Rarity::Normal),
                life_cycle: Some(LifeCycle::Child),
                current_health: 30,
                max_health: 100,
                current_hunger: 100,
                max_hunger: 100,
                current_friendship: Decimal::from(8),
                max_friendship: Decimal::from(100),
                current_wellness: 100,
                max_wellness: 100,
                is_leaving: true,
                time_stopping: true,
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
    fn low_roll_brings_pet_home() {
        let config = VivariumConfig::default();
        let mut state = away();
        state.ledger.set(Channel::HungerDecay, Some(t0() - Duration::days(1)));
        let now = t0() + Duration::hours(3);

        let (outcome, notes) = search(&mut state, &tick_at(&config, now), 21);
        assert_eq!(outcome, SearchOutcome::Returned);
        assert_eq!(notes[0].narrative_event(), Some(Narrative::Returned));
        assert!(!state.pet.is_leaving);
        assert_eq!(state.pet.current_health, 50);
        assert!(state.ledger.status().values().all(|at| *at == Some(now)));
        assert_eq!(state.search.attempts, 0);
    }

    #[test]
    fn middle_roll_loses_pet() {
        let config = VivariumConfig::default();
        let mut state = away();
        let (outcome, _) = search(&mut state, &tick_at(&config, t0()), 22);
        assert_eq!(outcome, SearchOutcome::Lost);
        assert!(state.pet.is_dead);
        assert!(state.ledger.status().values().all(|at| *at == Some(t0())));
    }

    #[test]
    fn high_roll_counts_an_attempt() {
        let config = VivariumConfig::default();
        let mut state = away();
        let (outcome, _) = search(&mut state, &tick_at(&config, t0()), 35);
        assert_eq!(outcome, SearchOutcome::NotFound { attempts: 1 });
        assert!(state.pet.is_leaving);
    }

    #[test]
    fn cooldown_between_attempts() {
        let config = VivariumConfig::default();
        let mut state = away();
        search(&mut state, &tick_at(&config, t0()), 99);
        let (outcome, _) = search(
            &mut state,
            &tick_at(&config, t0() + Duration::seconds(1)),
            0,
        );
        assert_eq!(outcome, SearchOutcome::CoolingDown);
        let (outcome, _) = search(
            &mut state,
            &tick_at(&config, t0() + Duration::seconds(2)),
            99,
        );
        assert_eq!(outcome, SearchOutcome::NotFound { attempts: 2 });
    }

    #[test]
    fn cap_locks_until_reset() {
        let config = VivariumConfig::default();
        let mut state = away();
        let mut now = t0();
        for _ in 0..20 {
            search(&mut state, &tick_at(&config, now), 99);
            now += Duration::seconds(3);
        }
        assert_eq!(state.search.attempts, 20);
        let capped_at = state.ledger.get(Channel::SearchCooldown).unwrap();
        let (outcome, _) = search(&mut state, &tick_at(&config, now), 0);
        assert_eq!(outcome, SearchOutcome::CapReached);

        reset_poll(&mut state, &tick_at(&config, capped_at + Duration::minutes(59)));
        assert_eq!(state.search.attempts, 20);
        reset_poll(&mut state, &tick_at(&config, capped_at + Duration::minutes(60)));
        assert_eq!(state.search.attempts, 0);
        assert_eq!(state.ledger.get(Channel::SearchCooldown), None);
    }

    #[test]
    fn searching_for_a_pet_at_home_does_nothing() {
        let config = VivariumConfig::default();
        let mut state = away();
        state.pet.is_leaving = false;
        let (outcome, notes) = search(&mut state, &tick_at(&config, t0()), 0);
        assert_eq!(outcome, SearchOutcome::NotLeaving);
        assert!(notes.is_empty());
    }
}
