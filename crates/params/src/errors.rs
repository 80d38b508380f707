//! Errors for the relay parameters.

use thiserror::Error;

/// Error while loading or validating [`RelayParams`](crate::relay::RelayParams).
#[derive(Debug, Clone, Error)]
pub enum ParamsError {
    /// The TOML document could not be parsed into parameters.
    #[error("could not parse relay params: {0}")]
    Parse(#[from] toml::de::Error),

    /// The parameter file could not be read.
    #[error("could not read relay params from {path}: {reason}")]
    Io {
        /// Path that was read.
        path: String,

        /// Underlying I/O error message.
        reason: String,
    },

    /// A divisor or length parameter is zero.
    #[error("{0} must be non-zero")]
    Zero(&'static str),

    /// The gas limit range is empty.
    #[error("min gas limit {min} exceeds max gas limit {max}")]
    GasLimitRange {
        /// Configured minimum.
        min: u64,

        /// Configured maximum.
        max: u64,
    },
}
