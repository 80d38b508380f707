//! The interface the dispute engine uses to check proof-of-work.

use ethrelay_primitives::header::Header;

use crate::{errors::PowOracleError, witness::{FullPowWitness, LookupWitness}};

/// The outcome of a PoW check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowVerdict {
    /// The header's mix digest and nonce satisfy its declared difficulty.
    Valid,

    /// The recomputed digest contradicts the header.
    Invalid,
}

impl PowVerdict {
    /// Returns `true` for [`PowVerdict::Valid`].
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Answers whether a header's proof-of-work is valid.
pub trait PowOracle {
    /// Cheap, probabilistic check: recomputes the digest but only authenticates a single sampled
    /// dataset access.
    ///
    /// An [`Invalid`](PowVerdict::Invalid) verdict is strong evidence but not a proof, since the
    /// unauthenticated pages could have been supplied wrongly.
    fn verify_sample(
        &self,
        header: &Header,
        witness: &LookupWitness,
    ) -> Result<PowVerdict, PowOracleError>;

    /// Conclusive check: recomputes the digest with every dataset access authenticated.
    fn verify_full(
        &self,
        header: &Header,
        witness: &FullPowWitness,
    ) -> Result<PowVerdict, PowOracleError>;
}
