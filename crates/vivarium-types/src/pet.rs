//! The pet state record.
//!
//! [`PetState`] is the single mutable record of a pet's identity, vitals,
//! and lifecycle flags. A freshly constructed record (via [`Default`]) is
//! the "absent" sentinel: no rarity, no breed, no life cycle, all vitals
//! zero. Birth populates it atomically; release returns it to the sentinel.
//!
//! All vital mutators on this type saturate at zero and clamp to the
//! corresponding maximum. [`Normalize`] re-applies the same bounds to a
//! whole record before it is stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{LifeCycle, Rarity};

/// Upper bound for hunger, friendship, and wellness maxima.
const STAT_CEILING: u32 = 100;

/// Bounds-clamping validation applied on every store write.
pub trait Normalize {
    /// Return a copy of `self` with every bounded field clamped into range.
    #[must_use]
    fn normalized(self) -> Self;
}

/// Current vital statistics and lifecycle flags of the (single) pet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PetState {
    // --- identity ---
    /// Rarity tier; `None` means no pet is present.
    pub rare: Option<Rarity>,
    /// Breed catalog key.
    pub breed_key: Option<String>,
    /// Life-cycle stage.
    pub life_cycle: Option<LifeCycle>,
    /// Player-chosen name.
    pub name: Option<String>,
    /// When the pet hatched (used for the evolution age gate).
    pub born_at: Option<DateTime<Utc>>,

    // --- vitals ---
    /// Current health, `0..=max_health`.
    pub current_health: u32,
    /// Maximum health (reduced permanently by severe damage).
    pub max_health: u32,
    /// Current hunger (100 = full), `0..=max_hunger`.
    pub current_hunger: u32,
    /// Maximum hunger, at most 100.
    pub max_hunger: u32,
    /// Current friendship, fractional, `0..=max_friendship`.
    pub current_friendship: Decimal,
    /// Maximum friendship, at most 100.
    pub max_friendship: Decimal,
    /// Current wellness, `0..=max_wellness`.
    pub current_wellness: u32,
    /// Maximum wellness, at most 100.
    pub max_wellness: u32,

    // --- rates ---
    /// Hunger lost per decay interval (breed-dependent).
    pub hunger_speed: u32,

    // --- flags ---
    /// Freezes every decay channel.
    pub time_stopping: bool,
    /// The pet has run away and is being searched for.
    pub is_leaving: bool,
    /// A freeze item is in effect.
    pub is_freezing: bool,
    /// Terminal: the pet has died.
    pub is_dead: bool,
    /// Terminal: the pet has been cooked.
    pub is_cooked: bool,
}

impl PetState {
    /// Whether a pet exists at all (rarity assigned at birth).
    pub const fn is_present(&self) -> bool {
        self.rare.is_some()
    }

    /// Whether the pet is in a terminal state (dead or cooked).
    pub const fn is_terminal(&self) -> bool {
        self.is_dead || self.is_cooked
    }

    /// Whether the life cycle admits decay and interaction.
    pub fn is_interactive(&self) -> bool {
        self.life_cycle.is_some_and(LifeCycle::is_interactive)
    }

    /// Whether decay channels should run for this pet right now.
    ///
    /// Requires a present, interactive, non-terminal pet whose time is not
    /// stopped.
    pub fn decays(&self) -> bool {
        self.is_present() && self.is_interactive() && !self.is_terminal() && !self.time_stopping
    }

    /// Remove up to `amount` hunger, saturating at zero.
    pub const fn lose_hunger(&mut self, amount: u32) {
        self.current_hunger = self.current_hunger.saturating_sub(amount);
    }

    /// Remove up to `amount` wellness, saturating at zero.
    pub const fn lose_wellness(&mut self, amount: u32) {
        self.current_wellness = self.current_wellness.saturating_sub(amount);
    }

    /// Remove up to `amount` health, saturating at zero.
    pub const fn lose_health(&mut self, amount: u32) {
        self.current_health = self.current_health.saturating_sub(amount);
    }

    /// Permanently reduce maximum health, re-clamping current health.
    pub fn lose_max_health(&mut self, amount: u32) {
        self.max_health = self.max_health.saturating_sub(amount);
        self.current_health = self.current_health.min(self.max_health);
    }

    /// Remove up to `amount` friendship, saturating at zero.
    pub fn lose_friendship(&mut self, amount: Decimal) {
        self.current_friendship = self
            .current_friendship
            .checked_sub(amount)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
    }

    /// Add `amount` friendship, clamped to `max_friendship`.
    pub fn gain_friendship(&mut self, amount: Decimal) {
        self.current_friendship = self
            .current_friendship
            .checked_add(amount)
            .unwrap_or(self.max_friendship)
            .min(self.max_friendship);
    }

    /// Set hunger to `value`, clamped to `max_hunger`.
    pub fn set_hunger(&mut self, value: u32) {
        self.current_hunger = value.min(self.max_hunger);
    }
}

impl Normalize for PetState {
    fn normalized(mut self) -> Self {
        let ceiling = Decimal::from(STAT_CEILING);

        self.max_hunger = self.max_hunger.min(STAT_CEILING);
        self.max_wellness = self.max_wellness.min(STAT_CEILING);
        self.max_friendship = self.max_friendship.clamp(Decimal::ZERO, ceiling);

        self.current_hunger = self.current_hunger.min(self.max_hunger);
        self.current_wellness = self.current_wellness.min(self.max_wellness);
        self.current_health = self.current_health.min(self.max_health);
        self.current_friendship = self
            .current_friendship
            .clamp(Decimal::ZERO, self.max_friendship);
        self
    }
}
