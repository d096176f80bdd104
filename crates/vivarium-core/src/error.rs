//! Error types for caretaker and operator requests.
//!
//! Channel polls never fail: persistence problems are logged and skipped,
//! and impossible player actions are silent no-ops reported through
//! outcome enums. Errors are reserved for requests that a caller must be
//! told were refused.

use vivarium_types::LifeCycle;

use crate::clock::ClockError;

/// Errors from lifecycle requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CareError {
    /// A living pet already occupies the slot.
    #[error("a pet is already present")]
    PetAlreadyPresent,

    /// No pet exists.
    #[error("no pet is present")]
    NoPet,

    /// Only an egg can hatch.
    #[error("only an egg can hatch (life cycle: {life_cycle:?})")]
    NotAnEgg {
        /// The pet's actual life cycle.
        life_cycle: Option<LifeCycle>,
    },

    /// Only a dead, uncooked pet can be revived.
    #[error("the pet cannot be revived")]
    NotRevivable,
}

/// Errors from the administrative surface.
#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    /// A timestamp or clock argument was rejected.
    #[error("invalid timestamp: {source}")]
    InvalidTimestamp {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A pet override patch could not be decoded.
    #[error("invalid pet override: {source}")]
    InvalidOverride {
        /// The underlying decode error.
        source: serde_json::Error,
    },

    /// A lifecycle request was refused.
    #[error("lifecycle request refused: {source}")]
    Lifecycle {
        /// The underlying lifecycle error.
        #[from]
        source: CareError,
    },
}
