//! Administrative control surface.
//!
//! Catch-up correctness is hard to observe under real elapsed time, so the
//! operator can drive everything by hand: pin or advance the virtual clock,
//! force any channel out of schedule, inspect and overwrite the ledger, and
//! patch the pet and environment records directly.
//!
//! An [`Operator`] borrows the [`Caretaker`] mutably for the duration of a
//! request. Every write goes through the caretaker's snapshot/commit cycle,
//! so overrides are persisted and published like any channel write.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use vivarium_ledger::LedgerStatus;
use vivarium_types::{
    Channel, DirtyObject, EnvFlag, EnvironmentState, LifeCycle, Notification, PetState,
};

use crate::caretaker::Caretaker;
use crate::channels::ChannelKind;
use crate::channels::search::SearchOutcome;
use crate::channels::touch::{TouchOutcome, TouchRolls};
use crate::clock::{ClockSettings, parse_instant};
use crate::error::OperatorError;
use crate::lifecycle;

/// Every ledger entry plus every dirty object's punish clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReport {
    /// Simulation instant the report was taken at.
    pub now: DateTime<Utc>,
    /// Channel entries.
    pub channels: LedgerStatus,
    /// Live dirty objects with their punish times.
    pub dirty_objects: Vec<DirtyObject>,
}

impl LedgerReport {
    /// Whether every channel entry and every punish clock equals `at`.
    pub fn all_at(&self, at: DateTime<Utc>) -> bool {
        self.channels.values().all(|entry| *entry == Some(at))
            && self
                .dirty_objects
                .iter()
                .all(|object| object.last_punish_time == Some(at))
    }
}

/// A partial overwrite of the pet record. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PetOverride {
    /// New life cycle.
    pub life_cycle: Option<LifeCycle>,
    /// New current health.
    pub current_health: Option<u32>,
    /// New maximum health.
    pub max_health: Option<u32>,
    /// New current hunger.
    pub current_hunger: Option<u32>,
    /// New current friendship.
    pub current_friendship: Option<Decimal>,
    /// New current wellness.
    pub current_wellness: Option<u32>,
    /// New hunger speed.
    pub hunger_speed: Option<u32>,
    /// New birth instant.
    pub born_at: Option<DateTime<Utc>>,
    /// New time-stopping flag.
    pub time_stopping: Option<bool>,
    /// New leaving flag.
    pub is_leaving: Option<bool>,
    /// New freezing flag.
    pub is_freezing: Option<bool>,
    /// New dead flag.
    pub is_dead: Option<bool>,
    /// New cooked flag.
    pub is_cooked: Option<bool>,
}

impl PetOverride {
    /// Apply every present field to `pet`. Values are clamped on commit.
    pub fn apply_to(&self, pet: &mut PetState) {
        fn put<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(value) = value {
                slot.clone_from(value);
            }
        }
        if self.life_cycle.is_some() {
            pet.life_cycle = self.life_cycle;
        }
        put(&mut pet.current_health, self.current_health.as_ref());
        put(&mut pet.max_health, self.max_health.as_ref());
        put(&mut pet.current_hunger, self.current_hunger.as_ref());
        put(&mut pet.current_friendship, self.current_friendship.as_ref());
        put(&mut pet.current_wellness, self.current_wellness.as_ref());
        put(&mut pet.hunger_speed, self.hunger_speed.as_ref());
        if self.born_at.is_some() {
            pet.born_at = self.born_at;
        }
        put(&mut pet.time_stopping, self.time_stopping.as_ref());
        put(&mut pet.is_leaving, self.is_leaving.as_ref());
        put(&mut pet.is_freezing, self.is_freezing.as_ref());
        put(&mut pet.is_dead, self.is_dead.as_ref());
        put(&mut pet.is_cooked, self.is_cooked.as_ref());
    }
}

/// Administrative handle on a [`Caretaker`].
#[derive(Debug)]
pub struct Operator<'a> {
    caretaker: &'a mut Caretaker,
}

impl<'a> Operator<'a> {
    /// Wrap `caretaker`.
    pub const fn new(caretaker: &'a mut Caretaker) -> Self {
        Self { caretaker }
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Pin the virtual clock to `at`.
    pub fn set_virtual_time(&mut self, at: DateTime<Utc>) -> ClockSettings {
        self.caretaker.clock_mut().set_virtual_time(at);
        self.caretaker.save_clock();
        self.caretaker.clock().settings()
    }

    /// Parse an RFC 3339 instant and pin the virtual clock to it.
    pub fn set_virtual_time_str(&mut self, input: &str) -> Result<DateTime<Utc>, OperatorError> {
        let at = parse_instant(input)?;
        self.set_virtual_time(at);
        Ok(at)
    }

    /// Move virtual time forward.
    pub fn advance_clock(&mut self, by: Duration) -> DateTime<Utc> {
        self.caretaker.clock_mut().advance(by);
        self.caretaker.save_clock();
        let now = self.caretaker.now();
        info!(by_minutes = by.num_minutes(), now = %now, "Virtual clock advanced");
        now
    }

    /// Return to real time.
    pub fn use_real_time(&mut self) {
        self.caretaker.clock_mut().disable();
        self.caretaker.save_clock();
    }

    // -----------------------------------------------------------------------
    // Forcing
    // -----------------------------------------------------------------------

    /// Run one unit immediately, outside its schedule.
    pub fn force_channel(&mut self, kind: ChannelKind) -> Vec<Notification> {
        info!(channel = %kind, "Channel forced");
        self.caretaker.poll(kind)
    }

    /// Run every unit immediately.
    pub fn force_check_all(&mut self) -> Vec<Notification> {
        info!("Unified check forced");
        self.caretaker.check_all()
    }

    /// Search with a chosen percentile roll.
    pub fn force_search(&mut self, roll: u32) -> SearchOutcome {
        self.caretaker.search_with(roll)
    }

    /// Touch with chosen rolls.
    pub fn force_touch(&mut self, rolls: TouchRolls) -> TouchOutcome {
        self.caretaker.touch_with(rolls)
    }

    // -----------------------------------------------------------------------
    // Ledger
    // -----------------------------------------------------------------------

    /// Read every ledger entry.
    pub fn ledger_status(&self) -> LedgerReport {
        LedgerReport {
            now: self.caretaker.now(),
            channels: self.caretaker.ledger().status(),
            dirty_objects: self.caretaker.dirt().iter().copied().collect(),
        }
    }

    /// Reset every entry and punish clock to now.
    pub fn reset_ledger(&mut self) -> DateTime<Utc> {
        let (now, _) = self.caretaker.apply(|state, tick, _| {
            state.reset_clocks(tick.now);
            (tick.now, Vec::new())
        });
        info!(at = %now, "Ledger reset");
        now
    }

    /// Force every entry and punish clock to `at`, which may lie in the
    /// past to simulate a long absence.
    pub fn preset_ledger(&mut self, at: DateTime<Utc>) {
        self.caretaker.apply(|state, _, _| {
            state.ledger.preset_all(at);
            for object in state.dirt.iter_mut() {
                object.last_punish_time = Some(at);
            }
            ((), Vec::new())
        });
        info!(at = %at, "Ledger preset");
    }

    /// Parse an RFC 3339 instant and preset the ledger to it.
    pub fn preset_ledger_str(&mut self, input: &str) -> Result<DateTime<Utc>, OperatorError> {
        let at = parse_instant(input)?;
        self.preset_ledger(at);
        Ok(at)
    }

    /// Unset every entry.
    pub fn null_ledger(&mut self) {
        self.caretaker.apply(|state, _, _| {
            state.ledger.null_all();
            ((), Vec::new())
        });
        info!("Ledger nulled");
    }

    /// Overwrite a single entry.
    pub fn set_ledger_entry(&mut self, channel: Channel, at: Option<DateTime<Utc>>) {
        self.caretaker.apply(|state, _, _| {
            state.ledger.set(channel, at);
            ((), Vec::new())
        });
        info!(channel = %channel, at = ?at, "Ledger entry overwritten");
    }

    // -----------------------------------------------------------------------
    // Record overrides
    // -----------------------------------------------------------------------

    /// Patch the pet record, then apply the death transition if the patch
    /// drained health.
    pub fn override_pet(&mut self, patch: &PetOverride) -> Vec<Notification> {
        let (_, notes) = self.caretaker.apply(|state, tick, _| {
            patch.apply_to(&mut state.pet);
            ((), lifecycle::check_vitals(state, tick.now).into_iter().collect())
        });
        info!(?patch, "Pet overridden");
        notes
    }

    /// Parse a JSON pet patch and apply it.
    pub fn override_pet_json(&mut self, json: &str) -> Result<Vec<Notification>, OperatorError> {
        let patch: PetOverride =
            serde_json::from_str(json).map_err(|source| OperatorError::InvalidOverride { source })?;
        Ok(self.override_pet(&patch))
    }

    /// Replace the pet record wholesale.
    pub fn replace_pet(&mut self, pet: PetState) {
        self.caretaker.apply(|state, _, _| {
            state.pet = pet;
            ((), Vec::new())
        });
    }

    /// Replace the environment record wholesale.
    pub fn replace_environment(&mut self, env: EnvironmentState) {
        self.caretaker.apply(|state, _, _| {
            state.env = env;
            ((), Vec::new())
        });
    }

    /// Raise or clear one environment flag. Returns `true` if it changed.
    pub fn set_flag(&mut self, flag: EnvFlag, active: bool) -> bool {
        let (changed, _) = self
            .caretaker
            .apply(|state, _, _| (state.env.set(flag, active), Vec::new()));
        info!(flag = %flag, active, changed, "Environment flag overridden");
        changed
    }
}

impl Caretaker {
    /// Borrow the administrative surface.
    pub const fn operator(&mut self) -> Operator<'_> {
        Operator::new(self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use vivarium_store::MemoryStore;
    use vivarium_types::Rarity;

    use super::*;
    use crate::clock::ManualWallClock;
    use crate::clock::WallClock as _;
    use crate::config::VivariumConfig;
    use crate::lifecycle::BreedProfile;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn hatched(wall: &Arc<ManualWallClock>) -> Caretaker {
        let mut config = VivariumConfig::default();
        config.clock.utc_offset_minutes = Some(0);
        config.engine.seed = Some(3);
        let mut caretaker =
            Caretaker::open(Box::new(MemoryStore::new()), wall.clone(), config).unwrap();
        caretaker
            .birth(Rarity::Normal, &BreedProfile::new("tabby", 6), None)
            .unwrap();
        caretaker.hatch().unwrap();
        caretaker
    }

    #[test]
    fn preset_then_check_replays_backlog() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        let mut operator = caretaker.operator();

        operator.preset_ledger(t0() - Duration::minutes(185));
        operator.force_channel(ChannelKind::HungerDecay);

        let report = operator.ledger_status();
        assert_eq!(
            report.channels.get(&Channel::HungerDecay).copied().flatten(),
            Some(t0() - Duration::minutes(5))
        );
        assert_eq!(caretaker.pet().current_hunger, 82);
    }

    #[test]
    fn pinning_the_clock_is_persisted() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        let pinned = t0() + Duration::days(3);
        let settings = caretaker.operator().set_virtual_time(pinned);
        assert!(settings.enabled);
        assert_eq!(caretaker.now(), pinned);

        wall.advance(Duration::minutes(10));
        assert_eq!(caretaker.now(), pinned + Duration::minutes(10));

        caretaker.operator().use_real_time();
        assert_eq!(caretaker.now(), wall.now());
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        let err = caretaker.operator().preset_ledger_str("yesterday");
        assert!(matches!(err, Err(OperatorError::InvalidTimestamp { .. })));
    }

    #[test]
    fn override_patches_only_named_fields() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        caretaker
            .operator()
            .override_pet_json(r#"{"currentFriendship": "8"}"#)
            .unwrap();
        assert_eq!(caretaker.pet().current_friendship, Decimal::from(8));
        assert_eq!(caretaker.pet().current_hunger, 100);

        let err = caretaker.operator().override_pet_json(r#"{"mood": 3}"#);
        assert!(matches!(err, Err(OperatorError::InvalidOverride { .. })));
    }

    #[test]
    fn draining_health_by_override_kills() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        let notes = caretaker.operator().override_pet(&PetOverride {
            current_health: Some(0),
            ..PetOverride::default()
        });
        assert_eq!(notes.len(), 1);
        assert!(caretaker.pet().is_dead);
    }

    #[test]
    fn reset_aligns_every_clock() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        wall.advance(Duration::hours(2));
        let mut operator = caretaker.operator();
        operator.force_channel(ChannelKind::DirtSpawn);
        let now = operator.reset_ledger();
        assert!(operator.ledger_status().all_at(now));
    }
}
