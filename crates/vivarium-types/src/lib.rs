//! Shared type definitions for the Vivarium pet simulation.
//!
//! This crate is the single source of truth for the data model shared by
//! the ledger, the persistence layer, and the simulation core.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for notification identifiers
//! - [`enums`] -- Rarity, life cycle, channel, environment flag, and disease enums
//! - [`pet`] -- The [`PetState`] record and its clamping rules
//! - [`environment`] -- The [`EnvironmentState`] flag map and positions
//! - [`dirt`] -- Dirty objects and their bounded slot pile
//! - [`notification`] -- Notification payloads published to observers

pub mod dirt;
pub mod enums;
pub mod environment;
pub mod ids;
pub mod notification;
pub mod pet;

// Re-export all public types at crate root for convenience.
pub use dirt::{DirtPile, DirtyObject, MAX_DIRTY_OBJECTS};
pub use enums::{Channel, Disease, EnvFlag, LifeCycle, ParseNameError, Rarity};
pub use environment::{EnvironmentState, FlagState, Position};
pub use ids::NotificationId;
pub use notification::{Narrative, Notification, NotificationKind, Origin, VitalDelta};
pub use pet::{Normalize, PetState};
