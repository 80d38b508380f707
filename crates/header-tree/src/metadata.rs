//! Relay bookkeeping attached to stored headers.

use ethnum::U256;
use ethrelay_primitives::buf::{Address, Buf32};
use serde::{Deserialize, Serialize};

/// Relay bookkeeping of a stored header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMetadata {
    /// Identity that bonded stake for the header. Zero for genesis.
    pub submitter: Address,

    /// Time after which the header is unlocked.
    pub locked_until: u64,

    /// Branch the header belongs to.
    pub fork_id: u64,

    /// Slot in the endpoint list. Only meaningful while the header is an endpoint.
    pub iterable_index: usize,

    /// Nearest ancestor with more than one successor, zero if there is none.
    pub latest_fork: Buf32,

    /// Children in insertion order.
    pub successors: Vec<Buf32>,

    /// Sum of the difficulties from genesis (inclusive of genesis' own total) to this header.
    #[serde(with = "ethrelay_primitives::serde_u256")]
    pub total_difficulty: U256,
}

/// A header removed by pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrunedHeader {
    /// Hash of the removed header.
    pub hash: Buf32,

    /// Identity that submitted it.
    pub submitter: Address,
}
