//! The mutable simulation state that channels operate on.
//!
//! [`CareState`] bundles every persisted record a channel may touch. The
//! caretaker hands a fresh copy of the latest records to each channel run
//! and writes back only the parts that changed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vivarium_ledger::ChannelLedger;
use vivarium_types::{DirtPile, EnvironmentState, PetState, VitalDelta};

/// Touch rate-limit bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TouchData {
    /// Touches used in the current bucket.
    pub count: u32,
    /// When the last accepted touch happened.
    pub last_touch: Option<DateTime<Utc>>,
}

/// Search attempt bookkeeping for a pet that has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchData {
    /// Unsuccessful attempts so far.
    pub attempts: u32,
    /// When the last attempt happened.
    pub last_attempt: Option<DateTime<Utc>>,
}

/// Every record the channels read and write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CareState {
    /// The pet.
    pub pet: PetState,
    /// Flags and room state.
    pub env: EnvironmentState,
    /// Last-check-time ledger.
    pub ledger: ChannelLedger,
    /// Live dirty objects.
    pub dirt: DirtPile,
    /// Touch bookkeeping.
    pub touch: TouchData,
    /// Search bookkeeping.
    pub search: SearchData,
}

impl CareState {
    /// Reset every ledger entry and every dirty object's punish clock to
    /// `now`, so no penalty accrued before this instant is ever applied.
    pub fn reset_clocks(&mut self, now: DateTime<Utc>) {
        self.ledger.reset_all(now);
        for object in self.dirt.iter_mut() {
            object.last_punish_time = Some(now);
        }
    }
}

/// The change in vitals between two snapshots of the same pet.
pub fn vital_delta(before: &PetState, after: &PetState) -> VitalDelta {
    let diff = |a: u32, b: u32| i64::from(b).saturating_sub(i64::from(a));
    VitalDelta {
        hunger: diff(before.current_hunger, after.current_hunger),
        friendship: after
            .current_friendship
            .checked_sub(before.current_friendship)
            .unwrap_or(Decimal::ZERO),
        wellness: diff(before.current_wellness, after.current_wellness),
        health: diff(before.current_health, after.current_health),
        max_health: diff(before.max_health, after.max_health),
    }
}
