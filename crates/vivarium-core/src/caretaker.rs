//! The coordinator that owns every record and runs every channel.
//!
//! The [`Caretaker`] is the single logical actor of the simulation. Each
//! request follows the same cycle:
//!
//! 1. **Snapshot** -- copy the latest pet, environment, ledger, dirt,
//!    touch, and search records into a [`CareState`].
//! 2. **Run** -- hand the copy to a channel or player action together with
//!    a [`Tick`] read once from the virtual clock.
//! 3. **Commit** -- write back only the records that changed; each write is
//!    persisted and, for the pet and environment, published on their
//!    change streams.
//! 4. **Publish** -- send the resulting notifications to subscribers.
//!
//! Because every request starts from the latest records, channels that
//! write different fields never clobber each other.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tracing::{debug, info};
use vivarium_ledger::ChannelLedger;
use vivarium_store::{KeyValueStore, StateStore, keys, load_or_default, persist};
use vivarium_types::{
    DirtPile, Disease, EnvironmentState, Notification, PetState, Rarity,
};

use crate::channels::dirt;
use crate::channels::light;
use crate::channels::search::{self, SearchOutcome};
use crate::channels::sleep::{self, SleepOutcome, WakeOutcome};
use crate::channels::touch::{self, CONTENT_REACTIONS, TouchOutcome, TouchRolls};
use crate::channels::{ChannelKind, Tick};
use crate::checker;
use crate::clock::{ClockError, ClockSettings, VirtualClock, WallClock};
use crate::config::VivariumConfig;
use crate::error::CareError;
use crate::lifecycle::{self, BreedProfile};
use crate::prompt::{AutoConfirm, EvolutionPrompt};
use crate::state::{CareState, SearchData, TouchData};

/// Capacity of the notification stream.
const NOTIFICATION_CAPACITY: usize = 256;

/// Text shown when asking the observer to confirm evolution.
const EVOLUTION_QUESTION: &str = "Your pet is ready to evolve. Evolve now?";

/// Owns the simulation state and runs every channel against it.
pub struct Caretaker {
    backend: Box<dyn KeyValueStore>,
    clock: VirtualClock,
    config: VivariumConfig,
    pet: StateStore<PetState>,
    env: StateStore<EnvironmentState>,
    ledger: ChannelLedger,
    dirt: DirtPile,
    touch: TouchData,
    search: SearchData,
    rng: SmallRng,
    prompt: Box<dyn EvolutionPrompt>,
    notifications: broadcast::Sender<Notification>,
}

impl std::fmt::Debug for Caretaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caretaker")
            .field("clock", &self.clock)
            .field("pet", self.pet.get())
            .field("ledger", &self.ledger)
            .field("dirt", &self.dirt)
            .finish_non_exhaustive()
    }
}

impl Caretaker {
    /// Load every record from `backend` and restore the virtual clock.
    ///
    /// Missing or malformed records fall back to defaults. The RNG is
    /// seeded from `engine.seed` when configured, otherwise from the OS.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidOffset`] if the configured UTC offset
    /// is out of range.
    pub fn open(
        backend: Box<dyn KeyValueStore>,
        wall: Arc<dyn WallClock>,
        config: VivariumConfig,
    ) -> Result<Self, ClockError> {
        let offset = VirtualClock::resolve_offset(config.clock.utc_offset_minutes)?;
        let settings: ClockSettings = load_or_default(backend.as_ref(), keys::CLOCK_SETTINGS);
        let clock = VirtualClock::from_settings(wall, offset, settings);

        let pet: StateStore<PetState> = StateStore::open(backend.as_ref(), keys::PET_STATE);
        let env: StateStore<EnvironmentState> =
            StateStore::open(backend.as_ref(), keys::ENVIRONMENT_STATE);
        let ledger = load_or_default(backend.as_ref(), keys::CHANNEL_LEDGER);
        let dirt = load_or_default::<DirtPile>(backend.as_ref(), keys::DIRTY_OBJECTS).sanitized();
        let touch = load_or_default(backend.as_ref(), keys::TOUCH_DATA);
        let search = load_or_default(backend.as_ref(), keys::SEARCH_DATA);

        let rng = config
            .engine
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        let prompt = Box::new(AutoConfirm::new(config.engine.auto_confirm_evolution));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        info!(
            virtual_time = clock.is_virtual(),
            pet_present = pet.get().is_present(),
            dirty_objects = dirt.len(),
            "Caretaker opened"
        );

        Ok(Self {
            backend,
            clock,
            config,
            pet,
            env,
            ledger,
            dirt,
            touch,
            search,
            rng,
            prompt,
            notifications,
        })
    }

    /// Replace the RNG with one seeded from `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Replace the evolution prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Box<dyn EvolutionPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    // -----------------------------------------------------------------------
    // Snapshot / commit
    // -----------------------------------------------------------------------

    /// The current instant and the local time of day, read once.
    fn instant(&self) -> (DateTime<Utc>, NaiveTime) {
        let local = self.clock.local_now();
        (local.with_timezone(&Utc), local.time())
    }

    /// A copy of every record.
    pub fn snapshot(&self) -> CareState {
        CareState {
            pet: self.pet.get().clone(),
            env: self.env.get().clone(),
            ledger: self.ledger.clone(),
            dirt: self.dirt.clone(),
            touch: self.touch,
            search: self.search,
        }
    }

    /// Write back the records in `after` that differ from `before`.
    fn commit(&mut self, before: &CareState, after: CareState) {
        let CareState {
            pet,
            env,
            ledger,
            dirt,
            touch,
            search,
        } = after;
        if pet != before.pet {
            self.pet.replace(self.backend.as_mut(), pet);
        }
        if env != before.env {
            self.env.replace(self.backend.as_mut(), env);
        }
        if ledger != before.ledger {
            persist(self.backend.as_mut(), keys::CHANNEL_LEDGER, &ledger);
            self.ledger = ledger;
        }
        if dirt != before.dirt {
            persist(self.backend.as_mut(), keys::DIRTY_OBJECTS, &dirt);
            self.dirt = dirt;
        }
        if touch != before.touch {
            persist(self.backend.as_mut(), keys::TOUCH_DATA, &touch);
            self.touch = touch;
        }
        if search != before.search {
            persist(self.backend.as_mut(), keys::SEARCH_DATA, &search);
            self.search = search;
        }
    }

    /// Send `notes` to every subscriber.
    fn publish(&self, notes: &[Notification]) {
        for note in notes {
            let receivers = self.notifications.send(note.clone()).unwrap_or(0);
            debug!(origin = ?note.origin, message = %note.message, receivers, "Notification published");
        }
    }

    /// Run `action` against a fresh snapshot and commit the result.
    pub(crate) fn apply<T, F>(&mut self, action: F) -> (T, Vec<Notification>)
    where
        F: FnOnce(&mut CareState, &Tick<'_>, &mut SmallRng) -> (T, Vec<Notification>),
    {
        let (now, local) = self.instant();
        let before = self.snapshot();
        let mut state = before.clone();
        let tick = Tick {
            now,
            local,
            config: &self.config,
        };
        let (value, notes) = action(&mut state, &tick, &mut self.rng);
        self.commit(&before, state);
        self.publish(&notes);
        (value, notes)
    }

    /// Re-read every record from the backend.
    pub fn reload(&mut self) {
        self.pet.reload(self.backend.as_ref());
        self.env.reload(self.backend.as_ref());
        self.ledger = load_or_default(self.backend.as_ref(), keys::CHANNEL_LEDGER);
        self.dirt = load_or_default::<DirtPile>(self.backend.as_ref(), keys::DIRTY_OBJECTS).sanitized();
        self.touch = load_or_default(self.backend.as_ref(), keys::TOUCH_DATA);
        self.search = load_or_default(self.backend.as_ref(), keys::SEARCH_DATA);
        debug!("Records reloaded");
    }

    /// Persist the virtual clock settings.
    pub(crate) fn save_clock(&mut self) {
        let settings = self.clock.settings();
        persist(self.backend.as_mut(), keys::CLOCK_SETTINGS, &settings);
    }

    /// Mutable access to the clock for the operator surface.
    pub(crate) const fn clock_mut(&mut self) -> &mut VirtualClock {
        &mut self.clock
    }

    // -----------------------------------------------------------------------
    // Polling
    // -----------------------------------------------------------------------

    /// Poll one unit.
    pub fn poll(&mut self, kind: ChannelKind) -> Vec<Notification> {
        self.poll_group(&[kind])
    }

    /// Poll several units in one snapshot.
    pub fn poll_group(&mut self, kinds: &[ChannelKind]) -> Vec<Notification> {
        let (_, notes) = self.apply(|state, tick, rng| ((), checker::run_group(kinds, state, tick, rng)));
        notes
    }

    /// Poll every unit (startup, hatching, resuming from the background).
    pub fn check_all(&mut self) -> Vec<Notification> {
        let (_, notes) = self.apply(|state, tick, rng| ((), checker::check_all(state, tick, rng)));
        notes
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Populate the empty slot with a new egg.
    pub fn birth(
        &mut self,
        rarity: Rarity,
        breed: &BreedProfile,
        name: Option<String>,
    ) -> Result<Notification, CareError> {
        let (result, _) = self.apply(|state, tick, _| {
            match lifecycle::birth(state, tick.now, rarity, breed, name, &tick.config.newborn) {
                Ok(note) => (Ok(note.clone()), vec![note]),
                Err(err) => (Err(err), Vec::new()),
            }
        });
        result
    }

    /// Hatch the egg, then run the unified check.
    pub fn hatch(&mut self) -> Result<Vec<Notification>, CareError> {
        let (result, notes) = self.apply(|state, tick, rng| match lifecycle::hatch(state, tick.now) {
            Ok(note) => {
                let mut notes = vec![note];
                notes.extend(checker::check_all(state, tick, rng));
                (Ok(()), notes)
            }
            Err(err) => (Err(err), Vec::new()),
        });
        result.map(|()| notes)
    }

    /// Release the pet and empty the slot.
    pub fn release(&mut self) -> Notification {
        let (note, _) = self.apply(|state, tick, _| {
            let note = lifecycle::release(state, tick.now);
            (note.clone(), vec![note])
        });
        note
    }

    /// Use a revival item on a dead pet.
    pub fn revive(&mut self) -> Result<Notification, CareError> {
        let (result, _) = self.apply(|state, tick, _| match lifecycle::revive(state, tick.now) {
            Ok(note) => (Ok(note.clone()), vec![note]),
            Err(err) => (Err(err), Vec::new()),
        });
        result
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    /// Pet the pet with freshly drawn rolls.
    pub fn touch(&mut self) -> TouchOutcome {
        let len = u32::try_from(CONTENT_REACTIONS.len()).unwrap_or(u32::MAX).max(1);
        let rolls = TouchRolls {
            bonus: self.rng.random_range(0..100),
            reaction: self.rng.random_range(0..len),
            evolution: self.rng.random_range(0..100),
        };
        self.touch_with(rolls)
    }

    /// Pet the pet with the given rolls. An evolution offer is put to the
    /// evolution prompt before the life cycle changes.
    pub fn touch_with(&mut self, rolls: TouchRolls) -> TouchOutcome {
        let (outcome, _) = self.apply(|state, tick, _| touch::touch(state, tick, rolls));
        if outcome != TouchOutcome::EvolutionOffered {
            return outcome;
        }
        if !self.prompt.confirm(EVOLUTION_QUESTION) {
            info!("Evolution declined");
            return TouchOutcome::EvolutionDeclined;
        }
        let (evolved, _) = self.apply(|state, tick, _| {
            let note = lifecycle::evolve(state, tick.now);
            (note.is_some(), note.into_iter().collect())
        });
        if evolved {
            TouchOutcome::Evolved
        } else {
            TouchOutcome::EvolutionDeclined
        }
    }

    /// Look for a pet that left, with a freshly drawn roll.
    pub fn search(&mut self) -> SearchOutcome {
        let roll = self.rng.random_range(0..100);
        self.search_with(roll)
    }

    /// Look for a pet that left, with the given percentile roll.
    pub fn search_with(&mut self, roll: u32) -> SearchOutcome {
        let (outcome, _) = self.apply(|state, tick, _| search::search(state, tick, roll));
        outcome
    }

    /// Put the pet to bed.
    pub fn start_sleep(&mut self) -> SleepOutcome {
        let (outcome, _) = self.apply(|state, tick, _| (sleep::start_sleep(state, tick), Vec::new()));
        outcome
    }

    /// Wake the pet.
    pub fn wake_up(&mut self) -> WakeOutcome {
        let (outcome, _) = self.apply(|state, tick, _| sleep::wake_up(state, tick));
        outcome
    }

    /// Clean the dirty object in `slot`.
    pub fn clean(&mut self, slot: u8) -> bool {
        let (cleaned, _) = self.apply(|state, tick, _| (dirt::clean(state, slot, tick.now), Vec::new()));
        cleaned
    }

    /// Clean every dirty object.
    pub fn clean_all(&mut self) -> usize {
        let (removed, _) = self.apply(|state, tick, _| (dirt::clean_all(state, tick.now), Vec::new()));
        removed
    }

    /// Flip the lamp. Returns the new lamp state.
    pub fn toggle_light(&mut self) -> bool {
        let (on, _) = self.apply(|state, _, _| (light::toggle(&mut state.env), Vec::new()));
        on
    }

    /// Clear a disease flag, as a medicine would. Returns `true` if the
    /// disease was active.
    pub fn clear_disease(&mut self, disease: Disease) -> bool {
        let (cleared, _) = self.apply(|state, _, _| (state.env.set(disease.flag(), false), Vec::new()));
        cleared
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The current pet record.
    pub const fn pet(&self) -> &PetState {
        self.pet.get()
    }

    /// The current environment record.
    pub const fn environment(&self) -> &EnvironmentState {
        self.env.get()
    }

    /// The last-check-time ledger.
    pub const fn ledger(&self) -> &ChannelLedger {
        &self.ledger
    }

    /// Live dirty objects.
    pub const fn dirt(&self) -> &DirtPile {
        &self.dirt
    }

    /// Touch bookkeeping.
    pub const fn touch_data(&self) -> TouchData {
        self.touch
    }

    /// Search bookkeeping.
    pub const fn search_data(&self) -> SearchData {
        self.search
    }

    /// The virtual clock.
    pub const fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// The current simulation instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Tuning in force.
    pub const fn config(&self) -> &VivariumConfig {
        &self.config
    }

    /// Subscribe to notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Subscribe to pet record changes.
    pub fn subscribe_pet(&self) -> broadcast::Receiver<PetState> {
        self.pet.subscribe()
    }

    /// Subscribe to environment record changes.
    pub fn subscribe_environment(&self) -> broadcast::Receiver<EnvironmentState> {
        self.env.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use vivarium_store::MemoryStore;
    use vivarium_types::{Channel, LifeCycle, Narrative};

    use super::*;
    use crate::clock::ManualWallClock;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn config() -> VivariumConfig {
        let mut config = VivariumConfig::default();
        config.clock.utc_offset_minutes = Some(0);
        config.engine.seed = Some(11);
        config
    }

    fn open(wall: &Arc<ManualWallClock>) -> Caretaker {
        Caretaker::open(Box::new(MemoryStore::new()), wall.clone(), config()).unwrap()
    }

    fn hatched(wall: &Arc<ManualWallClock>) -> Caretaker {
        let mut caretaker = open(wall);
        caretaker
            .birth(Rarity::Normal, &BreedProfile::new("tabby", 6), None)
            .unwrap();
        caretaker.hatch().unwrap();
        caretaker
    }

    #[test]
    fn birth_and_hatch_publish_narratives() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = open(&wall);
        let mut rx = caretaker.subscribe();

        caretaker
            .birth(Rarity::Normal, &BreedProfile::new("tabby", 6), None)
            .unwrap();
        caretaker.hatch().unwrap();

        assert_eq!(rx.try_recv().unwrap().narrative_event(), Some(Narrative::Born));
        assert_eq!(rx.try_recv().unwrap().narrative_event(), Some(Narrative::Hatched));
        assert_eq!(caretaker.pet().life_cycle, Some(LifeCycle::Child));
    }

    #[test]
    fn poll_commits_only_changed_records() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        let mut pet_changes = caretaker.subscribe_pet();

        caretaker.poll(ChannelKind::HungerDecay);
        assert!(pet_changes.try_recv().is_err());

        wall.advance(Duration::minutes(185));
        caretaker.poll(ChannelKind::HungerDecay);
        assert_eq!(pet_changes.try_recv().unwrap().current_hunger, 82);
        assert_eq!(
            caretaker.ledger().get(Channel::HungerDecay),
            Some(t0() + Duration::minutes(180))
        );
    }

    #[test]
    fn declined_evolution_keeps_child() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        wall.advance(Duration::hours(121));
        caretaker.apply(|state, _, _| {
            state.pet.current_friendship = Decimal::from(100);
            state.pet.current_wellness = 100;
            ((), Vec::new())
        });

        let rolls = TouchRolls {
            bonus: 0,
            reaction: 0,
            evolution: 99,
        };
        assert_eq!(caretaker.touch_with(rolls), TouchOutcome::EvolutionDeclined);
        assert_eq!(caretaker.pet().life_cycle, Some(LifeCycle::Child));
    }

    #[test]
    fn confirmed_evolution_promotes_child() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall).with_prompt(Box::new(AutoConfirm::new(true)));
        wall.advance(Duration::hours(121));
        caretaker.apply(|state, _, _| {
            state.pet.current_friendship = Decimal::from(100);
            state.pet.current_wellness = 100;
            ((), Vec::new())
        });

        let rolls = TouchRolls {
            bonus: 0,
            reaction: 0,
            evolution: 95,
        };
        assert_eq!(caretaker.touch_with(rolls), TouchOutcome::Evolved);
        assert_eq!(caretaker.pet().life_cycle, Some(LifeCycle::Evolution));
    }

    #[test]
    fn clear_disease_reports_whether_it_was_active() {
        let wall = Arc::new(ManualWallClock::new(t0()));
        let mut caretaker = hatched(&wall);
        caretaker.apply(|state, _, _| {
            state.env.set(Disease::Flu.flag(), true);
            ((), Vec::new())
        });
        assert!(caretaker.clear_disease(Disease::Flu));
        assert!(!caretaker.clear_disease(Disease::Flu));
    }
}
