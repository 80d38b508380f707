//! Errors that can occur when moving stake.

use ethnum::U256;
use thiserror::Error;

/// Errors that can occur when depositing or withdrawing stake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeError {
    /// The value transferred with a deposit differs from the declared amount.
    #[error("transfer amount not equal to function parameter (declared {declared}, transferred {transferred})")]
    TransferMismatch {
        /// The amount the caller declared.
        declared: U256,

        /// The value actually transferred.
        transferred: U256,
    },

    /// The withdrawal request exceeds everything the caller ever deposited.
    #[error("amount higher than deposited stake (requested {requested}, deposited {deposited})")]
    AmountExceedsDeposit {
        /// The requested amount.
        requested: U256,

        /// The caller's deposited stake.
        deposited: U256,
    },
}
