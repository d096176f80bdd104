//! Last-check-time ledger for the Vivarium pet simulation.
//!
//! Every decay channel remembers when it last processed elapsed time. This
//! crate owns those timestamps in a single explicitly-owned map keyed by
//! [`Channel`], so no channel ever reaches into another's private state.
//!
//! # Lifecycle of an entry
//!
//! | Event | Effect |
//! |-------|--------|
//! | Pet released | every entry set to `None` |
//! | Pet born / hatched | every entry set to now |
//! | Catch-up tick | entry advanced by whole intervals (monotonic) |
//! | Return home / pet lost | every entry reset to now |
//! | Operator preset | every entry forced to an arbitrary time |
//!
//! `None` means "not yet observed since the last birth or reset": the
//! next poll establishes a baseline instead of applying penalties.
//!
//! # Usage
//!
//! ```
//! use chrono::{Duration, Utc};
//! use vivarium_ledger::ChannelLedger;
//! use vivarium_types::Channel;
//!
//! let now = Utc::now();
//! let mut ledger = ChannelLedger::new();
//! ledger.initialize_all(now);
//! ledger.advance(Channel::HungerDecay, now + Duration::minutes(60)).ok();
//! assert_eq!(ledger.get(Channel::HungerDecay), Some(now + Duration::minutes(60)));
//! ```
//!
//! [`Channel`]: vivarium_types::Channel

pub mod ledger;

pub use ledger::{ChannelLedger, LedgerStatus};

use chrono::{DateTime, Utc};
use vivarium_types::Channel;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when mutating ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A catch-up attempted to move an entry backwards in time.
    #[error("ledger entry for {channel} cannot move backwards from {current} to {attempted}")]
    NonMonotonic {
        /// The channel whose entry was being advanced.
        channel: Channel,
        /// The entry's current value.
        current: DateTime<Utc>,
        /// The rejected earlier value.
        attempted: DateTime<Utc>,
    },

    /// A catch-up attempted to advance an entry that has no baseline.
    #[error("ledger entry for {channel} has no baseline to advance from")]
    Uninitialized {
        /// The channel whose entry is `None`.
        channel: Channel,
    },
}
