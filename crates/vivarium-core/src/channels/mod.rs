//! Decay, penalty, and bookkeeping channels.
//!
//! Each channel is a plain function over a [`CareState`] and a [`Tick`].
//! Channels never read the system clock, never touch storage, and never
//! publish directly: they mutate the state they are given and return the
//! notifications the caretaker should publish.
//!
//! # Modules
//!
//! - [`hunger`] -- hunger decay and the hungry/starving penalty.
//! - [`wellness`] -- weakness, life damage, disease lottery, disease damage.
//! - [`light`] -- day/night and the darkness penalty.
//! - [`affection`] -- low affection and leaving.
//! - [`dirt`] -- dirty object spawning, punishment, and cleaning.
//! - [`sleep`] -- the night window, going to bed, and waking up.
//! - [`search`] -- searching for a pet that left.
//! - [`touch`] -- petting, coin bonuses, and the evolution offer.

pub mod affection;
pub mod dirt;
pub mod hunger;
pub mod light;
pub mod search;
pub mod sleep;
pub mod touch;
pub mod wellness;

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use vivarium_types::{Channel, Notification, Origin, ParseNameError, PetState};

use crate::config::VivariumConfig;
use crate::state::{CareState, vital_delta};

/// The time context of one channel run.
#[derive(Debug, Clone, Copy)]
pub struct Tick<'a> {
    /// Virtual-clock instant.
    pub now: DateTime<Utc>,
    /// Local time of day at `now`.
    pub local: NaiveTime,
    /// Tuning.
    pub config: &'a VivariumConfig,
}

impl Tick<'_> {
    /// Local hour, `0..24`.
    pub fn hour(&self) -> u32 {
        self.local.hour()
    }
}

/// Whether a channel may run for the current pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// No pet, or a terminal one. Ledger entries are cleared.
    Absent,
    /// The pet exists but its clock is stopped (egg, leaving, frozen time).
    /// Ledger entries are left alone.
    Paused,
    /// Decay applies.
    Open,
}

impl Gate {
    /// Classify `pet`.
    pub const fn of(pet: &PetState) -> Self {
        if !pet.is_present() || pet.is_dead || pet.is_cooked {
            Self::Absent
        } else if pet.time_stopping {
            Self::Paused
        } else {
            match pet.life_cycle {
                Some(cycle) if cycle.is_interactive() => Self::Open,
                _ => Self::Paused,
            }
        }
    }
}

/// Handle the gate for a ledger-owning channel.
///
/// Returns `true` if the channel should proceed. Clears the ledger entries
/// of `channels` when the pet is absent.
pub(crate) fn admit(state: &mut CareState, channels: &[Channel]) -> bool {
    match Gate::of(&state.pet) {
        Gate::Open => true,
        Gate::Paused => false,
        Gate::Absent => {
            for channel in channels {
                state.ledger.clear(*channel);
            }
            false
        }
    }
}

/// Build the summary notification for `ticks` applications, or `None` if
/// the vitals did not actually move.
pub(crate) fn summarize(
    tick: &Tick<'_>,
    channel: Channel,
    ticks: u32,
    before: &PetState,
    after: &PetState,
) -> Option<Notification> {
    let delta = vital_delta(before, after);
    if delta.is_zero() {
        return None;
    }
    Some(Notification::effect(
        tick.now,
        Origin::Channel(channel),
        ticks,
        delta,
    ))
}

/// Multiply a per-tick amount by a tick count, saturating.
pub(crate) const fn times(per_tick: u32, ticks: u32) -> u32 {
    per_tick.saturating_mul(ticks)
}

// ---------------------------------------------------------------------------
// Pollable channel groups
// ---------------------------------------------------------------------------

/// A unit the caretaker can poll (and the operator can force).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelKind {
    /// Hunger decay.
    HungerDecay,
    /// Hungry/starving penalty.
    HungerPenalty,
    /// Weakness, life damage, disease lottery, and disease damage.
    Wellness,
    /// Day/night and darkness penalty.
    Light,
    /// Low affection and leaving.
    Affection,
    /// Dirty object spawning.
    DirtSpawn,
    /// Dirty object punishment.
    DirtPunish,
    /// Night window and morning wake-up.
    Sleep,
    /// Search attempt reset.
    SearchReset,
    /// Touch bucket reset.
    TouchReset,
}

impl ChannelKind {
    /// Every pollable unit, in unified-check order.
    pub const ALL: &'static [Self] = &[
        Self::HungerDecay,
        Self::HungerPenalty,
        Self::Wellness,
        Self::Light,
        Self::Affection,
        Self::DirtSpawn,
        Self::DirtPunish,
        Self::Sleep,
        Self::SearchReset,
        Self::TouchReset,
    ];

    /// Units polled on the fast (30 second) cadence.
    pub const FAST: &'static [Self] = &[
        Self::HungerDecay,
        Self::HungerPenalty,
        Self::Wellness,
        Self::Light,
        Self::Affection,
        Self::DirtSpawn,
        Self::DirtPunish,
        Self::SearchReset,
        Self::TouchReset,
    ];

    /// Units polled on the slow (30 minute) cadence.
    pub const SLOW: &'static [Self] = &[Self::Sleep];

    /// Kebab-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HungerDecay => "hunger-decay",
            Self::HungerPenalty => "hunger-penalty",
            Self::Wellness => "wellness",
            Self::Light => "light",
            Self::Affection => "affection",
            Self::DirtSpawn => "dirt-spawn",
            Self::DirtPunish => "dirt-punish",
            Self::Sleep => "sleep",
            Self::SearchReset => "search-reset",
            Self::TouchReset => "touch-reset",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseNameError {
                kind: "channel",
                input: s.to_owned(),
            })
    }
}
