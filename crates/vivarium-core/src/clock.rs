//! Virtual clock for the Vivarium simulation.
//!
//! Every channel reads "now" from the [`VirtualClock`] and never from the
//! system directly. The clock is either in real-time mode (it reports the
//! wall clock verbatim) or pinned to a chosen instant, in which case it
//! keeps ticking forward at wall-clock speed from that instant:
//!
//! ```text
//! now = pinned + (wall_now - anchor)
//! ```
//!
//! The wall clock itself sits behind the [`WallClock`] trait so tests can
//! drive time by hand with [`ManualWallClock`].
//!
//! # Design Principles
//!
//! - Time-of-day rules (light window, sleep window) use local time derived
//!   from a fixed UTC offset, never the host's zone database.
//! - Pin and release both re-anchor, so switching modes never jumps time
//!   by the amount of wall time spent in the previous mode.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The configured UTC offset is out of range.
    #[error("invalid UTC offset: {minutes} minutes")]
    InvalidOffset {
        /// The rejected offset in minutes east of UTC.
        minutes: i32,
    },

    /// A virtual time string could not be parsed.
    #[error("invalid virtual time {input:?}: {source}")]
    InvalidTime {
        /// The rejected input.
        input: String,
        /// The underlying parse error.
        source: chrono::ParseError,
    },
}

// ---------------------------------------------------------------------------
// Wall clocks
// ---------------------------------------------------------------------------

/// A source of real (wall-clock) time.
pub trait WallClock: Send + Sync {
    /// The current wall-clock instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A hand-driven clock for tests and replays.
///
/// Clones share the same instant, so a test can keep one handle and give
/// another to the caretaker.
#[derive(Debug, Clone)]
pub struct ManualWallClock {
    at: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualWallClock {
    /// Create a clock stopped at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at: Arc::new(Mutex::new(at)),
        }
    }

    /// Jump to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.at.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = at;
    }

    /// Move forward (or backward, for a negative `by`).
    pub fn advance(&self, by: Duration) {
        let mut guard = self.at.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = guard.checked_add_signed(by).unwrap_or(*guard);
    }
}

impl WallClock for ManualWallClock {
    fn now(&self) -> DateTime<Utc> {
        *self.at.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Virtual clock
// ---------------------------------------------------------------------------

/// Persisted virtual clock settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockSettings {
    /// Whether the clock is pinned to a virtual instant.
    pub enabled: bool,
    /// The virtual instant the clock was pinned to.
    pub pinned: Option<DateTime<Utc>>,
    /// The wall-clock instant at which the pin was taken.
    pub anchor: Option<DateTime<Utc>>,
}

/// The simulation's single source of "now".
#[derive(Clone)]
pub struct VirtualClock {
    wall: Arc<dyn WallClock>,
    settings: ClockSettings,
    offset: FixedOffset,
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualClock")
            .field("settings", &self.settings)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl VirtualClock {
    /// Create a clock in real-time mode.
    pub fn new(wall: Arc<dyn WallClock>, offset: FixedOffset) -> Self {
        Self {
            wall,
            settings: ClockSettings::default(),
            offset,
        }
    }

    /// Restore a clock from persisted settings.
    ///
    /// Settings that claim to be enabled but lack a pin or anchor are
    /// discarded in favour of real time.
    pub fn from_settings(
        wall: Arc<dyn WallClock>,
        offset: FixedOffset,
        settings: ClockSettings,
    ) -> Self {
        let settings = if settings.enabled && (settings.pinned.is_none() || settings.anchor.is_none())
        {
            warn!("Incomplete virtual clock settings; using real time");
            ClockSettings::default()
        } else {
            settings
        };
        Self {
            wall,
            settings,
            offset,
        }
    }

    /// Resolve the fixed offset used for local time.
    ///
    /// `None` takes the host's current offset once, at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidOffset`] if `minutes` is outside
    /// +/- 24 hours.
    pub fn resolve_offset(minutes: Option<i32>) -> Result<FixedOffset, ClockError> {
        match minutes {
            None => Ok(*Local::now().offset()),
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or(ClockError::InvalidOffset { minutes }),
        }
    }

    /// The current simulation instant.
    pub fn now(&self) -> DateTime<Utc> {
        let wall_now = self.wall.now();
        match (self.settings.enabled, self.settings.pinned, self.settings.anchor) {
            (true, Some(pinned), Some(anchor)) => pinned
                .checked_add_signed(wall_now.signed_duration_since(anchor))
                .unwrap_or(pinned),
            _ => wall_now,
        }
    }

    /// The current simulation instant in local time.
    pub fn local_now(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&self.offset)
    }

    /// The local wall-clock time of day.
    pub fn local_time(&self) -> NaiveTime {
        self.local_now().time()
    }

    /// The local hour, `0..24`.
    pub fn local_hour(&self) -> u32 {
        self.local_time().hour()
    }

    /// Pin the clock to `at`; it keeps advancing at wall-clock speed.
    pub fn set_virtual_time(&mut self, at: DateTime<Utc>) {
        self.settings = ClockSettings {
            enabled: true,
            pinned: Some(at),
            anchor: Some(self.wall.now()),
        };
        info!(virtual_time = %at, "Virtual clock pinned");
    }

    /// Parse an RFC 3339 instant and pin the clock to it.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidTime`] if `input` is not RFC 3339.
    pub fn set_virtual_time_str(&mut self, input: &str) -> Result<DateTime<Utc>, ClockError> {
        let at = parse_instant(input)?;
        self.set_virtual_time(at);
        Ok(at)
    }

    /// Move virtual time forward by `by` from the current simulated instant.
    pub fn advance(&mut self, by: Duration) {
        let target = self.now().checked_add_signed(by).unwrap_or_else(|| self.now());
        self.set_virtual_time(target);
    }

    /// Return to real time.
    pub fn disable(&mut self) {
        self.settings = ClockSettings {
            enabled: false,
            pinned: None,
            anchor: Some(self.wall.now()),
        };
        info!("Virtual clock released; using real time");
    }

    /// Whether the clock is pinned to a virtual instant.
    pub const fn is_virtual(&self) -> bool {
        self.settings.enabled
    }

    /// The settings to persist.
    pub const fn settings(&self) -> ClockSettings {
        self.settings
    }

    /// The fixed offset used for local time.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Parse an RFC 3339 instant into UTC.
///
/// # Errors
///
/// Returns [`ClockError::InvalidTime`] on malformed input.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, ClockError> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| ClockError::InvalidTime {
            input: input.to_owned(),
            source,
        })
}
