//! Errors raised when a PoW witness cannot be used.

use thiserror::Error;

/// The witness supplied to the oracle is unusable, so no verdict can be given.
///
/// These are distinct from an invalid PoW, which is a [`PowVerdict`](crate::PowVerdict).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowOracleError {
    /// No dataset root has been committed for the header's epoch.
    #[error("no dataset committed for epoch {0}")]
    UnknownEpoch(u64),

    /// The witness does not carry one page (and branch) per dataset access.
    #[error("witness carries {actual} entries, expected {expected}")]
    WitnessShape {
        /// Number of dataset accesses.
        expected: usize,

        /// Number of entries found.
        actual: usize,
    },

    /// A branch authenticates a different page than the one hashimoto accessed.
    #[error("access {access} reads page {expected} but the branch is for page {actual}")]
    PagePosition {
        /// Index of the dataset access.
        access: usize,

        /// Page the access reads.
        expected: u64,

        /// Page the branch was built for.
        actual: u64,
    },

    /// A page does not hash up to the committed dataset root.
    #[error("dataset page for access {0} does not match the committed root")]
    DatasetProof(usize),

    /// The oracle was configured with an unusable PoW layout.
    #[error("invalid pow parameters: {0}")]
    InvalidParams(String),

    /// A dataset cannot be built from zero pages.
    #[error("dataset has no pages")]
    EmptyDataset,
}
