//! Economic parameters: how much stake bonds a header and what a verification costs.

use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::default::{STAKE_PER_HEADER, VERIFICATION_FEE};

/// The stake and fee amounts, in the host ledger's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeParams {
    /// Stake that is locked for every submitted header until its lock period elapses.
    #[serde(with = "ethrelay_primitives::serde_u256")]
    pub stake_per_header: U256,

    /// Exact fee a verifier pays per inclusion-proof verification.
    #[serde(with = "ethrelay_primitives::serde_u256")]
    pub verification_fee: U256,
}

impl Default for StakeParams {
    fn default() -> Self {
        Self {
            stake_per_header: STAKE_PER_HEADER,
            verification_fee: VERIFICATION_FEE,
        }
    }
}
