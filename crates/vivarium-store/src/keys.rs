//! Key names used by the simulation.
//!
//! | Key | Value |
//! |-----|-------|
//! | `pet-state` | `PetState` |
//! | `environment-state` | `EnvironmentState` |
//! | `channel-ledger` | `ChannelLedger` (channel name -> RFC 3339 or null) |
//! | `dirty-objects` | `DirtPile` |
//! | `touch-data` | touch counter and last touch time |
//! | `search-data` | search attempt counter and last attempt time |
//! | `clock-settings` | virtual clock pin and anchor |

/// The pet record.
pub const PET_STATE: &str = "pet-state";

/// The environment record.
pub const ENVIRONMENT_STATE: &str = "environment-state";

/// The last-check-time ledger.
pub const CHANNEL_LEDGER: &str = "channel-ledger";

/// Live dirty objects.
pub const DIRTY_OBJECTS: &str = "dirty-objects";

/// Touch rate-limit bookkeeping.
pub const TOUCH_DATA: &str = "touch-data";

/// Search (window click) attempt bookkeeping.
pub const SEARCH_DATA: &str = "search-data";

/// Virtual clock settings.
pub const CLOCK_SETTINGS: &str = "clock-settings";
