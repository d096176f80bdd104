//! The [`ChannelLedger`]: one "last processed" timestamp per channel.
//!
//! # Design
//!
//! - **Explicit ownership**: a single map keyed by [`Channel`]; channels
//!   read and write only their own key through [`ChannelLedger::get`] and
//!   [`ChannelLedger::advance`].
//! - **Monotonic catch-up**: [`ChannelLedger::advance`] refuses to move an
//!   entry backwards. Only the bulk operations (reset, preset, null) may.
//! - **Lenient decoding**: the persisted form is a map of channel name to
//!   RFC 3339 string. A malformed timestamp decodes to `None` for that entry
//!   alone, so the channel re-baselines instead of the whole ledger being
//!   discarded.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use vivarium_types::Channel;

use crate::LedgerError;

/// Point-in-time copy of every ledger entry, for the operator surface.
pub type LedgerStatus = BTreeMap<Channel, Option<DateTime<Utc>>>;

/// Persisted shape: channel name -> optional RFC 3339 timestamp.
type RawLedger = BTreeMap<String, Option<String>>;

/// The last-check-time ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLedger", into = "RawLedger")]
pub struct ChannelLedger {
    entries: BTreeMap<Channel, Option<DateTime<Utc>>>,
}

impl Default for ChannelLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelLedger {
    /// Create a ledger with every entry unset.
    pub fn new() -> Self {
        Self {
            entries: Channel::ALL.iter().map(|channel| (*channel, None)).collect(),
        }
    }

    /// Return the entry for `channel`, or `None` if unset.
    pub fn get(&self, channel: Channel) -> Option<DateTime<Utc>> {
        self.entries.get(&channel).copied().flatten()
    }

    /// Establish a baseline for `channel` (or clear it with `None`).
    ///
    /// This is an unconditional write used for baselines and for nulling
    /// an inactive channel. Catch-up ticks use [`advance`](Self::advance).
    pub fn set(&mut self, channel: Channel, at: Option<DateTime<Utc>>) {
        self.entries.insert(channel, at);
    }

    /// Clear the entry for `channel`.
    pub fn clear(&mut self, channel: Channel) {
        self.set(channel, None);
    }

    /// Advance the entry for `channel` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Uninitialized`] if the entry is unset, or
    /// [`LedgerError::NonMonotonic`] if `to` is earlier than the current
    /// value.
    pub fn advance(&mut self, channel: Channel, to: DateTime<Utc>) -> Result<(), LedgerError> {
        let current = self
            .get(channel)
            .ok_or(LedgerError::Uninitialized { channel })?;
        if to < current {
            return Err(LedgerError::NonMonotonic {
                channel,
                current,
                attempted: to,
            });
        }
        self.entries.insert(channel, Some(to));
        Ok(())
    }

    /// Set every entry to `now` (birth and hatching).
    pub fn initialize_all(&mut self, now: DateTime<Utc>) {
        self.preset_all(now);
    }

    /// Reset every entry to `now` (return home, pet lost, operator reset).
    pub fn reset_all(&mut self, now: DateTime<Utc>) {
        self.preset_all(now);
    }

    /// Force every entry to an arbitrary timestamp (operator preset).
    pub fn preset_all(&mut self, at: DateTime<Utc>) {
        for channel in Channel::ALL {
            self.entries.insert(*channel, Some(at));
        }
    }

    /// Unset every entry (pet release).
    pub fn null_all(&mut self) {
        for channel in Channel::ALL {
            self.entries.insert(*channel, None);
        }
    }

    /// Copy of every entry, ordered by channel.
    pub fn status(&self) -> LedgerStatus {
        self.entries.clone()
    }
}

impl From<RawLedger> for ChannelLedger {
    fn from(raw: RawLedger) -> Self {
        let mut ledger = Self::new();
        for (name, value) in raw {
            let Ok(channel) = name.parse::<Channel>() else {
                warn!(entry = %name, "Ignoring unknown ledger entry");
                continue;
            };
            let at = value.and_then(|text| match DateTime::parse_from_rfc3339(&text) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(err) => {
                    warn!(%channel, value = %text, error = %err, "Malformed ledger timestamp; entry reset");
                    None
                }
            });
            ledger.entries.insert(channel, at);
        }
        ledger
    }
}

impl From<ChannelLedger> for RawLedger {
    fn from(ledger: ChannelLedger) -> Self {
        ledger
            .entries
            .into_iter()
            .map(|(channel, at)| (channel.as_str().to_owned(), at.map(|t| t.to_rfc3339())))
            .collect()
    }
}
