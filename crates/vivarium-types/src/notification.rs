//! Notifications published to the presentation layer.
//!
//! Two streams share one payload type: effect summaries ("wellness -3,
//! friendship -3, 3 penalties") produced by channels, and narrative
//! prompts (the pet left, came back, evolved, died) produced by lifecycle
//! transitions.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{Channel, Disease};
use crate::ids::NotificationId;

/// What produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "name")]
pub enum Origin {
    /// A ledger-owning channel.
    Channel(Channel),
    /// A level-triggered check (weakness, day/night, sleep window).
    Check,
    /// A player action (touch, search, sleep, wake, clean).
    Player,
    /// A lifecycle transition (birth, death, release, revival).
    Lifecycle,
    /// The administrative surface.
    Operator,
}

/// Cumulative change to the pet's vitals. Negative values are losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalDelta {
    /// Change in current hunger.
    pub hunger: i64,
    /// Change in current friendship.
    pub friendship: Decimal,
    /// Change in current wellness.
    pub wellness: i64,
    /// Change in current health.
    pub health: i64,
    /// Change in maximum health.
    pub max_health: i64,
}

impl VitalDelta {
    /// Whether nothing changed.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for VitalDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.hunger != 0 {
            parts.push(format!("hunger {:+}", self.hunger));
        }
        if self.wellness != 0 {
            parts.push(format!("wellness {:+}", self.wellness));
        }
        if !self.friendship.is_zero() {
            let sign = if self.friendship.is_sign_negative() { "" } else { "+" };
            parts.push(format!("friendship {sign}{}", self.friendship.normalize()));
        }
        if self.health != 0 {
            parts.push(format!("health {:+}", self.health));
        }
        if self.max_health != 0 {
            parts.push(format!("max health {:+}", self.max_health));
        }
        if parts.is_empty() {
            f.write_str("no change")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// A lifecycle or story event that may need the observer's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum Narrative {
    /// A new egg arrived.
    Born,
    /// The egg hatched into a child.
    Hatched,
    /// Friendship fell too low and the pet ran away.
    Left,
    /// A search found the pet and it came home.
    Returned,
    /// The pet was lost for good during a search.
    Lost,
    /// Health reached zero.
    Died,
    /// A revival item brought the pet back.
    Revived,
    /// The pet was released; the slot is empty again.
    Released,
    /// The pet is ready to evolve, pending confirmation.
    EvolutionOffered,
    /// The pet evolved.
    Evolved,
    /// The disease lottery produced a disease.
    FellIll {
        /// The disease contracted.
        disease: Disease,
    },
    /// New dirty objects appeared.
    DirtAppeared {
        /// How many objects spawned.
        count: u8,
    },
    /// The pet woke up on its own in the morning.
    AwokeNaturally,
    /// A touch produced bonus coins.
    CoinBonus {
        /// Coins awarded.
        coins: u32,
    },
}

/// The payload of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum NotificationKind {
    /// A cumulative stat effect.
    Effect {
        /// Whole intervals applied (1 for one-shot effects).
        ticks: u32,
        /// Net change to the vitals.
        delta: VitalDelta,
    },
    /// A narrative prompt.
    Narrative {
        /// The event that occurred.
        narrative: Narrative,
    },
}

/// A single published notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique id.
    pub id: NotificationId,
    /// Virtual-clock time at which the notification was produced.
    pub at: DateTime<Utc>,
    /// What produced it.
    pub origin: Origin,
    /// Human-readable summary.
    pub message: String,
    /// Structured payload.
    pub kind: NotificationKind,
}

impl Notification {
    /// Build an effect summary for `ticks` applications of `delta`.
    pub fn effect(at: DateTime<Utc>, origin: Origin, ticks: u32, delta: VitalDelta) -> Self {
        let message = if ticks > 1 {
            format!("{delta}, {ticks} penalties")
        } else {
            delta.to_string()
        };
        Self {
            id: NotificationId::new(),
            at,
            origin,
            message,
            kind: NotificationKind::Effect { ticks, delta },
        }
    }

    /// Build a narrative notification with a free-form message.
    pub fn narrative(
        at: DateTime<Utc>,
        origin: Origin,
        narrative: Narrative,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            at,
            origin,
            message: message.into(),
            kind: NotificationKind::Narrative { narrative },
        }
    }

    /// The narrative carried by this notification, if any.
    pub const fn narrative_event(&self) -> Option<Narrative> {
        match &self.kind {
            NotificationKind::Narrative { narrative } => Some(*narrative),
            NotificationKind::Effect { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_renders_signed_parts() {
        let delta = VitalDelta {
            wellness: -3,
            friendship: Decimal::from(-3),
            ..VitalDelta::default()
        };
        assert_eq!(delta.to_string(), "wellness -3, friendship -3");
    }

    #[test]
    fn fractional_friendship_gain_is_trimmed() {
        let delta = VitalDelta {
            friendship: Decimal::new(5, 2),
            ..VitalDelta::default()
        };
        assert_eq!(delta.to_string(), "friendship +0.05");
    }

    #[test]
    fn effect_message_counts_penalties() {
        let delta = VitalDelta {
            wellness: -3,
            friendship: Decimal::from(-3),
            ..VitalDelta::default()
        };
        let n = Notification::effect(
            DateTime::<Utc>::default(),
            Origin::Channel(Channel::DirtySpawn),
            3,
            delta,
        );
        assert_eq!(n.message, "wellness -3, friendship -3, 3 penalties");
        assert_eq!(n.narrative_event(), None);
    }

    #[test]
    fn empty_delta_says_so() {
        assert!(VitalDelta::default().is_zero());
        assert_eq!(VitalDelta::default().to_string(), "no change");
    }
}
