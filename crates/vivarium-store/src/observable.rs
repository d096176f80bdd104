//! Observable, persisted state records.
//!
//! A [`StateStore`] caches one record in memory, validates it with
//! [`Normalize`] on every write, mirrors it to the backing store, and
//! broadcasts the new value to subscribers. It backs both the Pet State
//! Store and the Environment State Store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::debug;
use vivarium_types::Normalize;

use crate::backend::KeyValueStore;
use crate::json::{load_or_default, persist};

/// Capacity of each change stream; slow subscribers see `Lagged`.
const CHANGE_CAPACITY: usize = 64;

/// A single persisted record with a change stream.
#[derive(Debug)]
pub struct StateStore<T> {
    key: &'static str,
    current: T,
    changes: broadcast::Sender<T>,
}

impl<T> StateStore<T>
where
    T: Clone + Default + Normalize + Serialize + DeserializeOwned,
{
    /// Load the record at `key`, or start from the default if absent or
    /// malformed.
    pub fn open(backend: &dyn KeyValueStore, key: &'static str) -> Self {
        let current = load_or_default::<T>(backend, key).normalized();
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            key,
            current,
            changes,
        }
    }

    /// The storage key of this record.
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Borrow the current record.
    pub const fn get(&self) -> &T {
        &self.current
    }

    /// Replace the record with a clamped copy of `value`, persist it, and
    /// notify subscribers.
    pub fn replace(&mut self, backend: &mut dyn KeyValueStore, value: T) {
        self.current = value.normalized();
        persist(backend, self.key, &self.current);
        // No subscribers is not an error.
        let receivers = self.changes.send(self.current.clone()).unwrap_or(0);
        debug!(key = self.key, receivers, "Record replaced");
    }

    /// Re-read the record from the backing store, discarding the cache.
    pub fn reload(&mut self, backend: &dyn KeyValueStore) {
        self.current = load_or_default::<T>(backend, self.key).normalized();
    }

    /// Subscribe to future replacements.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use vivarium_types::{EnvFlag, EnvironmentState, LifeCycle, PetState, Rarity};

    use super::*;
    use crate::backend::MemoryStore;
    use crate::keys;

    #[test]
    fn opens_absent_record_as_default() {
        let backend = MemoryStore::new();
        let store: StateStore<PetState> = StateStore::open(&backend, keys::PET_STATE);
        assert!(!store.get().is_present());
    }

    #[test]
    fn replace_clamps_persists_and_publishes() {
        let mut backend = MemoryStore::new();
        let mut store: StateStore<PetState> = StateStore::open(&backend, keys::PET_STATE);
        let mut rx = store.subscribe();

        let pet = PetState {
            rare: Some(Rarity::Special),
            life_cycle: Some(LifeCycle::Child),
            current_hunger: 300,
            max_hunger: 100,
            current_friendship: Decimal::from(120),
            max_friendship: Decimal::from(100),
            ..PetState::default()
        };
        store.replace(&mut backend, pet);

        assert_eq!(store.get().current_hunger, 100);
        assert_eq!(store.get().current_friendship, Decimal::from(100));

        let published = rx.try_recv().unwrap();
        assert_eq!(published.current_hunger, 100);

        let reopened: StateStore<PetState> = StateStore::open(&backend, keys::PET_STATE);
        assert_eq!(reopened.get(), store.get());
    }

    #[test]
    fn malformed_record_falls_back_to_default() {
        let mut backend = MemoryStore::new();
        backend.save(keys::ENVIRONMENT_STATE, "[1,2,3").unwrap();
        let store: StateStore<EnvironmentState> =
            StateStore::open(&backend, keys::ENVIRONMENT_STATE);
        assert_eq!(store.get(), &EnvironmentState::default());
    }

    #[test]
    fn reload_picks_up_external_writes() {
        let mut backend = MemoryStore::new();
        let mut store: StateStore<EnvironmentState> =
            StateStore::open(&backend, keys::ENVIRONMENT_STATE);

        let mut other = EnvironmentState::default();
        other.set(EnvFlag::Flu, true);
        persist(&mut backend, keys::ENVIRONMENT_STATE, &other);

        store.reload(&backend);
        assert!(store.get().is_active(EnvFlag::Flu));
    }
}
