//! Enumeration types for the Vivarium simulation.
//!
//! Every enum that crosses a persistence or operator boundary has a stable
//! kebab-case or camelCase name so that saved JSON and console commands stay
//! readable.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a name does not match any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {input}")]
pub struct ParseNameError {
    /// The kind of value that was being parsed (e.g. "channel").
    pub kind: &'static str,
    /// The unrecognised input.
    pub input: String,
}

/// Implements `as_str`, [`fmt::Display`], and [`FromStr`] from one name table.
macro_rules! named_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Return the stable name of this variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseNameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(ParseNameError {
                        kind: $kind,
                        input: other.to_owned(),
                    }),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Pet identity
// ---------------------------------------------------------------------------

/// Rarity tier assigned to a pet at birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rarity {
    /// Below-average roll.
    Bad,
    /// The common tier.
    Normal,
    /// Uncommon tier.
    Special,
    /// The rarest tier.
    SuperSpecial,
}

named_enum!(Rarity, "rarity", {
    Bad => "BAD",
    Normal => "NORMAL",
    Special => "SPECIAL",
    SuperSpecial => "SUPER_SPECIAL",
});

/// Life-cycle stage of a pet.
///
/// Decay channels only run while the pet is a [`LifeCycle::Child`] or in
/// [`LifeCycle::Evolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifeCycle {
    /// Freshly born, not yet hatched.
    Egg,
    /// Hatched and interactive.
    Child,
    /// Evolved form, still interactive.
    Evolution,
}

named_enum!(LifeCycle, "life cycle", {
    Egg => "EGG",
    Child => "CHILD",
    Evolution => "EVOLUTION",
});

impl LifeCycle {
    /// Whether decay channels and player interactions apply at this stage.
    pub const fn is_interactive(self) -> bool {
        matches!(self, Self::Child | Self::Evolution)
    }
}

// ---------------------------------------------------------------------------
// Channels (ledger keys)
// ---------------------------------------------------------------------------

/// A ledger-owning channel.
///
/// Each variant owns exactly one entry in the last-check-time ledger.
/// Dirty objects additionally carry their own per-object punish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    /// Hunger falls by the breed's hunger speed every interval.
    HungerDecay,
    /// Friendship and wellness penalties while hungry.
    HungerPenalty,
    /// Health damage while wellness is low.
    LifeDamage,
    /// Weighted disease draw while wellness is low.
    DiseaseLottery,
    /// Persistent health damage while any disease is active.
    DiseaseDamage,
    /// Penalty for a dark room during active hours.
    LightPenalty,
    /// Wellness penalty while friendship is low.
    LowAffection,
    /// Dirty object spawning.
    DirtySpawn,
    /// Cooldown after the search attempt cap is reached.
    SearchCooldown,
    /// Cooldown after the touch cap is reached.
    TouchCooldown,
}

named_enum!(Channel, "channel", {
    HungerDecay => "hunger-decay",
    HungerPenalty => "hunger-penalty",
    LifeDamage => "life-damage",
    DiseaseLottery => "disease-lottery",
    DiseaseDamage => "disease-damage",
    LightPenalty => "light-penalty",
    LowAffection => "low-affection",
    DirtySpawn => "dirty-spawn",
    SearchCooldown => "search-cooldown",
    TouchCooldown => "touch-cooldown",
});

// ---------------------------------------------------------------------------
// Environment flags
// ---------------------------------------------------------------------------

/// A named boolean in the environment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvFlag {
    /// The pet is angry.
    Angry,
    /// Hunger is at or below the hungry threshold.
    Hungry,
    /// Friendship is at or below the low-affection threshold.
    LowLikability,
    /// The pet is drowsy.
    Sleepy,
    /// The room is dark during active hours.
    NeedLight,
    /// It is night and the pet is not yet asleep.
    NeedSleep,
    /// Wellness is below the weakness threshold.
    Weak,
    /// Disease: headache.
    Headache,
    /// Disease: diarrhea.
    Diarrhea,
    /// Disease: gastric ulcer.
    GastricUlcer,
    /// Disease: flu.
    Flu,
    /// The pet is asleep.
    IsSleeping,
}

named_enum!(EnvFlag, "environment flag", {
    Angry => "angry",
    Hungry => "hungry",
    LowLikability => "lowLikability",
    Sleepy => "sleepy",
    NeedLight => "needLight",
    NeedSleep => "needSleep",
    Weak => "weak",
    Headache => "headache",
    Diarrhea => "diarrhea",
    GastricUlcer => "gastricUlcer",
    Flu => "flu",
    IsSleeping => "isSleeping",
});

impl EnvFlag {
    /// Human-readable label shown by the presentation layer.
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Angry => "Angry",
            Self::Hungry => "Hungry",
            Self::LowLikability => "Lonely",
            Self::Sleepy => "Sleepy",
            Self::NeedLight => "Needs light",
            Self::NeedSleep => "Needs sleep",
            Self::Weak => "Weak",
            Self::Headache => "Headache",
            Self::Diarrhea => "Diarrhea",
            Self::GastricUlcer => "Gastric ulcer",
            Self::Flu => "Flu",
            Self::IsSleeping => "Sleeping",
        }
    }

    /// The disease this flag represents, if any.
    pub const fn disease(self) -> Option<Disease> {
        match self {
            Self::Headache => Some(Disease::Headache),
            Self::Diarrhea => Some(Disease::Diarrhea),
            Self::GastricUlcer => Some(Disease::GastricUlcer),
            Self::Flu => Some(Disease::Flu),
            _ => None,
        }
    }
}

/// A persistent disease contracted through the disease lottery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Disease {
    /// Headache.
    Headache,
    /// Diarrhea.
    Diarrhea,
    /// Gastric ulcer.
    GastricUlcer,
    /// Flu.
    Flu,
}

named_enum!(Disease, "disease", {
    Headache => "headache",
    Diarrhea => "diarrhea",
    GastricUlcer => "gastricUlcer",
    Flu => "flu",
});

impl Disease {
    /// The environment flag that records this disease.
    pub const fn flag(self) -> EnvFlag {
        match self {
            Self::Headache => EnvFlag::Headache,
            Self::Diarrhea => EnvFlag::Diarrhea,
            Self::GastricUlcer => EnvFlag::GastricUlcer,
            Self::Flu => EnvFlag::Flu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_round_trip() {
        for channel in Channel::ALL {
            let parsed: Channel = channel.as_str().parse().unwrap_or(Channel::HungerDecay);
            assert_eq!(parsed, *channel);
        }
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let err = "thirst".parse::<Channel>();
        assert!(err.is_err());
    }

    #[test]
    fn channel_serializes_kebab_case() {
        let json = serde_json::to_string(&Channel::LowAffection).unwrap_or_default();
        assert_eq!(json, "\"low-affection\"");
    }

    #[test]
    fn only_child_and_evolution_are_interactive() {
        assert!(!LifeCycle::Egg.is_interactive());
        assert!(LifeCycle::Child.is_interactive());
        assert!(LifeCycle::Evolution.is_interactive());
    }

    #[test]
    fn disease_flags_map_back() {
        for disease in Disease::ALL {
            assert_eq!(disease.flag().disease(), Some(*disease));
        }
        assert_eq!(EnvFlag::Hungry.disease(), None);
    }

    #[test]
    fn rarity_uses_screaming_snake_case() {
        let json = serde_json::to_string(&Rarity::SuperSpecial).unwrap_or_default();
        assert_eq!(json, "\"SUPER_SPECIAL\"");
        assert_eq!("SUPER_SPECIAL".parse::<Rarity>().ok(), Some(Rarity::SuperSpecial));
    }
}
