//! Wellness-driven channels.
//!
//! Low wellness does three independent things, each with its own ledger
//! entry:
//!
//! - **Life damage** drains health on a cadence that depends on how low
//!   wellness is. At zero wellness it also erodes maximum health.
//! - **Disease lottery** rolls once per elapsed interval; each roll may
//!   give the pet a disease, knock off more wellness, or do nothing.
//! - **Disease damage** drains health (and maximum health) in proportion
//!   to the number of active diseases.
//!
//! The `weak` flag is level-triggered and refreshed on every poll.
//!
//! The cadence of banded channels is chosen from the wellness value at
//! the moment of application, not at the moment the band was entered.

use rand::Rng;
use tracing::{debug, info};
use vivarium_types::{Channel, Disease, EnvFlag, Narrative, Notification, Origin};

use super::{Tick, admit, summarize, times};
use crate::catchup;
use crate::config::{DiseaseWeights, band_for, minutes};
use crate::state::CareState;

/// Ledger entries owned by this module.
const OWNED: &[Channel] = &[
    Channel::LifeDamage,
    Channel::DiseaseLottery,
    Channel::DiseaseDamage,
];

/// One draw of the disease lottery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotteryOutcome {
    /// The pet contracts a disease.
    Disease(Disease),
    /// The pet loses some wellness.
    WellnessDrop,
    /// Nothing happens.
    Nothing,
}

/// Map a roll in `0..weights.total()` onto an outcome.
pub fn draw(roll: u32, weights: &DiseaseWeights) -> LotteryOutcome {
    let table = [
        (weights.headache, LotteryOutcome::Disease(Disease::Headache)),
        (weights.diarrhea, LotteryOutcome::Disease(Disease::Diarrhea)),
        (
            weights.gastric_ulcer,
            LotteryOutcome::Disease(Disease::GastricUlcer),
        ),
        (weights.flu, LotteryOutcome::Disease(Disease::Flu)),
        (weights.wellness_drop, LotteryOutcome::WellnessDrop),
    ];
    let mut bound = 0_u32;
    for (weight, outcome) in table {
        bound = bound.saturating_add(weight);
        if roll < bound {
            return outcome;
        }
    }
    LotteryOutcome::Nothing
}

/// Poll every wellness mechanism in turn.
pub fn poll<R: Rng>(state: &mut CareState, tick: &Tick<'_>, rng: &mut R) -> Vec<Notification> {
    if !admit(state, OWNED) {
        return Vec::new();
    }

    let weak = state.pet.current_wellness < tick.config.wellness.weak_threshold;
    state.env.set(EnvFlag::Weak, weak);

    let mut notes = life_damage(state, tick);
    notes.extend(disease_lottery(state, tick, rng));
    notes.extend(disease_damage(state, tick));
    notes
}

/// Apply banded life damage.
fn life_damage(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    let bands = &tick.config.wellness.damage_bands;
    let Some(band) = band_for(bands, state.pet.current_wellness).copied() else {
        state.ledger.clear(Channel::LifeDamage);
        return Vec::new();
    };
    let interval = minutes(band.interval_minutes);
    let Some(ticks) = catchup::run(&mut state.ledger, Channel::LifeDamage, tick.now, interval)
    else {
        return Vec::new();
    };

    let before = state.pet.clone();
    state.pet.lose_health(times(band.health_loss, ticks));
    state.pet.lose_max_health(times(band.max_health_loss, ticks));
    info!(
        ticks,
        wellness = state.pet.current_wellness,
        health = state.pet.current_health,
        max_health = state.pet.max_health,
        "Life damage applied"
    );
    summarize(tick, Channel::LifeDamage, ticks, &before, &state.pet)
        .into_iter()
        .collect()
}

/// Roll the disease lottery once per elapsed interval.
fn disease_lottery<R: Rng>(
    state: &mut CareState,
    tick: &Tick<'_>,
    rng: &mut R,
) -> Vec<Notification> {
    let config = &tick.config.wellness;
    let Some(band) = band_for(&config.lottery_bands, state.pet.current_wellness).copied() else {
        state.ledger.clear(Channel::DiseaseLottery);
        return Vec::new();
    };
    let interval = minutes(band.interval_minutes);
    let Some(ticks) = catchup::run(&mut state.ledger, Channel::DiseaseLottery, tick.now, interval)
    else {
        return Vec::new();
    };

    let total = config.disease_weights.total().max(1);
    let before = state.pet.clone();
    let mut notes = Vec::new();
    for _ in 0..ticks {
        let roll = rng.random_range(0..total);
        match draw(roll, &config.disease_weights) {
            LotteryOutcome::Disease(disease) => {
                if state.env.set(disease.flag(), true) {
                    info!(disease = %disease, "Pet fell ill");
                    notes.push(Notification::narrative(
                        tick.now,
                        Origin::Channel(Channel::DiseaseLottery),
                        Narrative::FellIll { disease },
                        format!("caught {}", disease.flag().display_label()),
                    ));
                }
            }
            LotteryOutcome::WellnessDrop => {
                state.pet.lose_wellness(config.lottery_wellness_drop);
            }
            LotteryOutcome::Nothing => {}
        }
    }
    debug!(ticks, "Disease lottery rolled");
    notes.extend(summarize(
        tick,
        Channel::DiseaseLottery,
        ticks,
        &before,
        &state.pet,
    ));
    notes
}

/// Apply damage for every active disease.
fn disease_damage(state: &mut CareState, tick: &Tick<'_>) -> Vec<Notification> {
    let count = u32::try_from(state.env.active_diseases().len()).unwrap_or(u32::MAX);
    if count == 0 {
        state.ledger.clear(Channel::DiseaseDamage);
        return Vec::new();
    }
    let interval = minutes(tick.config.wellness.disease_damage_interval_minutes);
    let Some(ticks) = catchup::run(&mut state.ledger, Channel::DiseaseDamage, tick.now, interval)
    else {
        return Vec::new();
    };

    let before = state.pet.clone();
    state.pet.lose_health(times(count, ticks));
    state.pet.lose_max_health(times(count.div_ceil(2), ticks));
    info!(
        ticks,
        diseases = count,
        health = state.pet.current_health,
        "Disease damage applied"
    );
    summarize(tick, Channel::DiseaseDamage, ticks, &before, &state.pet)
        .into_iter()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal::Decimal;
    use vivarium_types::{LifeCycle, PetState, Rarity};

    use super::*;
    use crate::config::VivariumConfig;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn child(wellness: u32) -> CareState {
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
                current_wellness: wellness,
                max_wellness: 100,
                hunger_speed: 6,
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
    fn draw_walks_the_weight_table() {
        let weights = DiseaseWeights::default();
        assert_eq!(draw(0, &weights), LotteryOutcome::Disease(Disease::Headache));
        assert_eq!(draw(15, &weights), LotteryOutcome::Disease(Disease::Diarrhea));
        assert_eq!(
            draw(30, &weights),
            LotteryOutcome::Disease(Disease::GastricUlcer)
        );
        assert_eq!(draw(59, &weights), LotteryOutcome::Disease(Disease::Flu));
        assert_eq!(draw(60, &weights), LotteryOutcome::WellnessDrop);
        assert_eq!(draw(75, &weights), LotteryOutcome::Nothing);
        assert_eq!(draw(99, &weights), LotteryOutcome::Nothing);
    }

    #[test]
    fn weak_flag_follows_threshold() {
        let config = VivariumConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut state = child(40);
        poll(&mut state, &tick_at(&config, t0()), &mut rng);
        assert!(!state.env.is_active(EnvFlag::Weak));

        state.pet.current_wellness = 39;
        poll(&mut state, &tick_at(&config, t0()), &mut rng);
        assert!(state.env.is_active(EnvFlag::Weak));
    }

    #[test]
    fn healthy_pet_clears_every_entry() {
        let config = VivariumConfig::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut state = child(80);
        for channel in OWNED {
            state.ledger.set(*channel, Some(t0()));
        }
        poll(&mut state, &tick_at(&config, t0()), &mut rng);
        for channel in OWNED {
            assert_eq!(state.ledger.get(*channel), None);
        }
    }

    #[test]
    fn zero_wellness_erodes_max_health() {
        let config = VivariumConfig::default();
        let mut state = child(0);
        state.ledger.set(Channel::LifeDamage, Some(t0()));

        let notes = life_damage(&mut state, &tick_at(&config, t0() + Duration::minutes(25)));
        assert_eq!(state.pet.current_health, 80);
        assert_eq!(state.pet.max_health, 90);
        assert_eq!(
            state.ledger.get(Channel::LifeDamage),
            Some(t0() + Duration::minutes(20))
        );
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn weak_band_uses_slow_cadence() {
        let config = VivariumConfig::default();
        let mut state = child(25);
        state.ledger.set(Channel::LifeDamage, Some(t0()));
        life_damage(&mut state, &tick_at(&config, t0() + Duration::minutes(25)));
        assert_eq!(state.pet.current_health, 100);
        life_damage(&mut state, &tick_at(&config, t0() + Duration::minutes(95)));
        assert_eq!(state.pet.current_health, 97);
    }

    #[test]
    fn lottery_outside_bands_does_nothing() {
        let config = VivariumConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut state = child(0);
        state.ledger.set(Channel::DiseaseLottery, Some(t0()));
        let notes = disease_lottery(&mut state, &tick_at(&config, t0() + Duration::hours(5)), &mut rng);
        assert!(notes.is_empty());
        assert_eq!(state.ledger.get(Channel::DiseaseLottery), None);
    }

    #[test]
    fn lottery_rolls_once_per_tick() {
        let config = VivariumConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut state = child(45);
        state.ledger.set(Channel::DiseaseLottery, Some(t0()));
        disease_lottery(&mut state, &tick_at(&config, t0() + Duration::minutes(300)), &mut rng);
        assert_eq!(
            state.ledger.get(Channel::DiseaseLottery),
            Some(t0() + Duration::minutes(300))
        );
        let sick = !state.env.active_diseases().is_empty();
        let dropped = state.pet.current_wellness < 45;
        // Ten draws at 75% odds of something happening.
        assert!(sick || dropped);
    }

    #[test]
    fn disease_damage_scales_with_count() {
        let config = VivariumConfig::default();
        let mut state = child(80);
        state.env.set(EnvFlag::Flu, true);
        state.env.set(EnvFlag::Headache, true);
        state.env.set(EnvFlag::Diarrhea, true);
        state.ledger.set(Channel::DiseaseDamage, Some(t0()));

        disease_damage(&mut state, &tick_at(&config, t0() + Duration::minutes(130)));
        assert_eq!(state.pet.current_health, 94);
        assert_eq!(state.pet.max_health, 96);
    }

    #[test]
    fn cured_pet_clears_disease_damage() {
        let config = VivariumConfig::default();
        let mut state = child(80);
        state.ledger.set(Channel::DiseaseDamage, Some(t0()));
        disease_damage(&mut state, &tick_at(&config, t0() + Duration::hours(3)));
        assert_eq!(state.ledger.get(Channel::DiseaseDamage), None);
        assert_eq!(state.pet.current_health, 100);
    }
}
