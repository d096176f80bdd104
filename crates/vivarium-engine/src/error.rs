//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and console command execution.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: vivarium_core::ConfigError,
    },

    /// Virtual clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: vivarium_core::ClockError,
    },

    /// The data directory could not be opened.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: vivarium_store::StoreError,
    },

    /// An operator command was rejected.
    #[error("operator error: {source}")]
    Operator {
        /// The underlying operator error.
        #[from]
        source: vivarium_core::OperatorError,
    },

    /// A lifecycle request was refused.
    #[error("care error: {source}")]
    Care {
        /// The underlying lifecycle error.
        #[from]
        source: vivarium_core::CareError,
    },

    /// Writing console output failed.
    #[error("console I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A report could not be rendered.
    #[error("render error: {source}")]
    Render {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
