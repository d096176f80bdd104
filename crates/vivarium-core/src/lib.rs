//! Virtual clock, decay channels, lifecycle, and coordination for the
//! Vivarium pet simulation.
//!
//! A single pet lives in a single slot. Its vitals decay over real (or
//! virtual) time through independent channels, each of which remembers when
//! it last processed elapsed time. Whenever a channel is polled it applies
//! every whole interval missed since then in one step, so a pet left alone
//! for a week is caught up by its first poll.
//!
//! # Modules
//!
//! - [`clock`] -- Virtual clock over a pluggable wall clock.
//! - [`config`] -- Configuration loading from `vivarium-config.yaml` into
//!   strongly-typed structs.
//! - [`catchup`] -- The shared whole-interval catch-up step.
//! - [`state`] -- [`CareState`], the bundle of records channels operate on.
//! - [`channels`] -- Every decay, penalty, and bookkeeping channel.
//! - [`lifecycle`] -- Birth, hatching, evolution, death, revival, release.
//! - [`checker`] -- Channel dispatch and the unified check.
//! - [`prompt`] -- [`EvolutionPrompt`] trait and [`AutoConfirm`].
//! - [`caretaker`] -- [`Caretaker`], the coordinator owning every record.
//! - [`operator`] -- [`Operator`], the administrative surface.
//! - [`error`] -- Error types for refused requests.
//!
//! [`CareState`]: state::CareState
//! [`EvolutionPrompt`]: prompt::EvolutionPrompt
//! [`AutoConfirm`]: prompt::AutoConfirm
//! [`Caretaker`]: caretaker::Caretaker
//! [`Operator`]: operator::Operator

pub mod caretaker;
pub mod catchup;
pub mod channels;
pub mod checker;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod operator;
pub mod prompt;
pub mod state;

pub use caretaker::Caretaker;
pub use channels::ChannelKind;
pub use clock::{ClockError, ManualWallClock, SystemWallClock, VirtualClock, WallClock};
pub use config::{ConfigError, VivariumConfig};
pub use error::{CareError, OperatorError};
pub use lifecycle::BreedProfile;
pub use operator::{LedgerReport, Operator, PetOverride};
pub use prompt::{AutoConfirm, EvolutionPrompt};
pub use state::CareState;
