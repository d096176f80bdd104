//! The environment state record.
//!
//! A mapping from [`EnvFlag`] to a labelled on/off state, plus room
//! booleans (day, light) and two freeform positions used only by the
//! presentation layer. It shares the store lifecycle of the pet record
//! but is independent of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{Disease, EnvFlag};
use crate::pet::Normalize;

/// A single labelled flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagState {
    /// Label shown by the presentation layer.
    pub display_label: String,
    /// Whether the flag is currently raised.
    pub is_active: bool,
}

/// A freeform screen position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

/// Activity flags and room state surrounding the pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentState {
    /// Every known flag with its label and active state.
    pub flags: BTreeMap<EnvFlag, FlagState>,
    /// Whether it is currently daytime (refreshed by the light channel).
    pub is_day: bool,
    /// Whether the room light is switched on.
    pub light_on: bool,
    /// Where the pet is drawn.
    pub character_position: Position,
    /// Where the bed is drawn.
    pub bed_position: Position,
}

impl Default for EnvironmentState {
    fn default() -> Self {
        let flags = EnvFlag::ALL
            .iter()
            .map(|flag| {
                (
                    *flag,
                    FlagState {
                        display_label: flag.display_label().to_owned(),
                        is_active: false,
                    },
                )
            })
            .collect();
        Self {
            flags,
            is_day: true,
            light_on: false,
            character_position: Position::default(),
            bed_position: Position::default(),
        }
    }
}

impl EnvironmentState {
    /// Whether `flag` is currently raised.
    pub fn is_active(&self, flag: EnvFlag) -> bool {
        self.flags.get(&flag).is_some_and(|state| state.is_active)
    }

    /// Raise or clear `flag`. Returns `true` if the value changed.
    pub fn set(&mut self, flag: EnvFlag, active: bool) -> bool {
        let entry = self.flags.entry(flag).or_insert_with(|| FlagState {
            display_label: flag.display_label().to_owned(),
            is_active: false,
        });
        let changed = entry.is_active != active;
        entry.is_active = active;
        changed
    }

    /// Diseases whose flags are currently raised.
    pub fn active_diseases(&self) -> Vec<Disease> {
        Disease::ALL
            .iter()
            .copied()
            .filter(|disease| self.is_active(disease.flag()))
            .collect()
    }

    /// Labels of every raised flag, in flag order.
    pub fn active_labels(&self) -> Vec<&str> {
        self.flags
            .values()
            .filter(|state| state.is_active)
            .map(|state| state.display_label.as_str())
            .collect()
    }
}

impl Normalize for EnvironmentState {
    /// Restore any flag missing from a partially persisted record.
    fn normalized(mut self) -> Self {
        for flag in EnvFlag::ALL {
            self.flags.entry(*flag).or_insert_with(|| FlagState {
                display_label: flag.display_label().to_owned(),
                is_active: false,
            });
        }
        self
    }
}
