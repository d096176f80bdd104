//! Persistence layer for the Vivarium pet simulation.
//!
//! The simulation treats storage abstractly as a key-value store holding
//! JSON documents. Every write to in-memory state is mirrored to the store;
//! every load tolerates missing or malformed documents by falling back to
//! defaults. Storage failures are logged and absorbed here so they never
//! crash a channel.
//!
//! # Architecture
//!
//! ```text
//! Caretaker
//!     |
//!     +-- StateStore<PetState>          (observable, clamped)
//!     +-- StateStore<EnvironmentState>  (observable)
//!     +-- load_or_default / persist      (ledger, dirt, touch, search blobs)
//!             |
//!             +--> dyn KeyValueStore
//!                     |-- MemoryStore (tests, ephemeral runs)
//!                     +-- FileStore   (one JSON file per key)
//! ```
//!
//! # Modules
//!
//! - [`backend`] -- The [`KeyValueStore`] trait and its two implementations
//! - [`keys`] -- Key names used by the simulation
//! - [`json`] -- Typed JSON helpers with log-and-fallback error handling
//! - [`observable`] -- [`StateStore`]: cached record + change stream
//! - [`error`] -- Shared error types

pub mod backend;
pub mod error;
pub mod json;
pub mod keys;
pub mod observable;

// Re-export primary types for convenience.
pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use error::StoreError;
pub use json::{load_json, load_or_default, persist};
pub use observable::StateStore;
