//! Errors returned by relay operations.
//!
//! Every error means the operation had no effect.

use ethnum::U256;
use ethrelay_dispute::DisputeError;
use ethrelay_header_tree::{QueryError, SubmitError};
use ethrelay_params::errors::ParamsError;
use ethrelay_primitives::errors::HeaderCodecError;
use ethrelay_stake_ledger::StakeError;
use thiserror::Error;

/// A verification fee that does not fit the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeeError {
    /// The value sent differs from the declared fee.
    #[error("transfer amount not equal to function parameter (fee {fee}, transferred {transferred})")]
    TransferMismatch {
        /// The declared fee.
        fee: U256,

        /// The value actually sent.
        transferred: U256,
    },

    /// The fee is below the required verification fee.
    #[error("provided fee is less than expected fee ({fee} < {required})")]
    TooSmall {
        /// The declared fee.
        fee: U256,

        /// The required fee.
        required: U256,
    },

    /// The fee is above the required verification fee.
    #[error("provided fee is higher than expected fee ({fee} > {required})")]
    TooLarge {
        /// The declared fee.
        fee: U256,

        /// The required fee.
        required: U256,
    },
}

/// Errors of the relay service.
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// The relay parameters are inconsistent.
    #[error("invalid parameters: {0}")]
    Params(#[from] ParamsError),

    /// Header bytes could not be decoded.
    #[error("invalid header encoding: {0}")]
    Codec(#[from] HeaderCodecError),

    /// A header submission was rejected.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// A stake operation was rejected.
    #[error(transparent)]
    Stake(#[from] StakeError),

    /// A dispute could not be decided.
    #[error(transparent)]
    Dispute(#[from] DisputeError),

    /// The header cannot serve as the basis of a verification.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The verification fee does not fit.
    #[error(transparent)]
    Fee(#[from] FeeError),
}
