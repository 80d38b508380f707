//! Errors returned by the header tree.

use ethrelay_primitives::buf::Buf32;
use thiserror::Error;

use crate::validation::Violation;

/// Reasons a header submission is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The header's parent is not stored.
    #[error("parent does not exist: {0}")]
    ParentNotFound(Buf32),

    /// The header is already stored.
    #[error("header already exists: {0}")]
    Duplicate(Buf32),

    /// A batch header does not extend the header before it.
    #[error("batch header {index} does not extend its predecessor")]
    NotChained {
        /// Position of the offending header in the batch.
        index: usize,
    },

    /// The batch holds no headers.
    #[error("empty header batch")]
    EmptyBatch,

    /// The header breaks a structural rule.
    #[error("header {hash} is invalid: {violation}")]
    Invalid {
        /// Hash of the offending header.
        hash: Buf32,

        /// The rule it breaks.
        violation: Violation,
    },
}

/// Reasons a header cannot serve as the basis of a verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The header is not stored.
    #[error("block does not exist: {0}")]
    NotFound(Buf32),

    /// The header is stored but not on the heaviest branch.
    #[error("block is not part of the longest PoW chain: {0}")]
    NotOnLongestChain(Buf32),

    /// The header is too recent or lacks confirmations.
    #[error("block is locked or not confirmed by enough blocks: {hash} (requested {requested})")]
    NotConfirmed {
        /// Hash of the header.
        hash: Buf32,

        /// The number of confirmations asked for.
        requested: u64,
    },
}

/// Reasons a subtree cannot be pruned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PruneError {
    /// The subtree root is not stored.
    #[error("block does not exist: {0}")]
    NotFound(Buf32),

    /// The genesis header is trusted and cannot be removed.
    #[error("genesis cannot be pruned")]
    Genesis,
}
