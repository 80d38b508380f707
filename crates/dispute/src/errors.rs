//! Reasons a dispute fails without changing any state.

use ethrelay_header_tree::PruneError;
use ethrelay_pow_oracle::PowOracleError;
use ethrelay_primitives::buf::Buf32;
use thiserror::Error;

/// A dispute that could not be decided.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisputeError {
    /// The disputed header is not stored, e.g. because an earlier dispute removed it.
    #[error("block does not exist: {0}")]
    HeaderNotFound(Buf32),

    /// The given parent is not stored.
    #[error("parent does not exist: {0}")]
    ParentNotFound(Buf32),

    /// The given parent is not the disputed header's parent.
    #[error("{parent} is not the parent of {header}")]
    NotLinked {
        /// The disputed header.
        header: Buf32,

        /// The header given as its parent.
        parent: Buf32,
    },

    /// The trusted genesis header cannot be disputed.
    #[error("genesis cannot be disputed")]
    Genesis,

    /// The PoW witness could not be used.
    #[error("unusable pow witness: {0}")]
    Witness(#[from] PowOracleError),

    /// The subtree could not be removed.
    #[error("pruning failed: {0}")]
    Prune(#[from] PruneError),
}
