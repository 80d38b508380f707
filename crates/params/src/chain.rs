//! The source chain's header-validity rules that the relay re-derives.
//!
//! These only cover what a header can be checked against given its parent: gas limit bounds,
//! the difficulty adjustment and the ethash dataset layout. The relay does not execute blocks.

use ethnum::U256;
use ethrelay_primitives::header::{Header, EMPTY_OMMERS_HASH};
use serde::{Deserialize, Serialize};

use crate::{
    default::{
        BOMB_DELAY, DATASET_ACCESSES, DIFFICULTY_BOUND_DIVISOR, DURATION_LIMIT, EPOCH_LENGTH,
        GAS_LIMIT_BOUND_DIVISOR, MAX_GAS_LIMIT, MINIMUM_DIFFICULTY, MIN_GAS_LIMIT,
    },
    errors::ParamsError,
};

/// Absolute and relative bounds on a header's gas limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasLimitParams {
    /// Lowest gas limit a header may declare.
    pub min_gas_limit: u64,

    /// Highest gas limit a header may declare.
    pub max_gas_limit: u64,

    /// A header's gas limit may differ from its parent's by at most
    /// `parent.gas_limit / bound_divisor`.
    pub bound_divisor: u64,
}

impl Default for GasLimitParams {
    fn default() -> Self {
        Self {
            min_gas_limit: MIN_GAS_LIMIT,
            max_gas_limit: MAX_GAS_LIMIT,
            bound_divisor: GAS_LIMIT_BOUND_DIVISOR,
        }
    }
}

/// Parameters of the difficulty adjustment formula.
///
/// The formula is the Byzantium-style adjustment with uncle awareness and a delayed exponential
/// "bomb" term:
///
/// ```text
/// sigma = max((ommers ? 2 : 1) - (t - parent_t) / duration_limit, -99)
/// diff  = max(parent_diff + parent_diff / bound_divisor * sigma, minimum)
///       + 2^(period - 2)   where period = max(parent_number + 1 - bomb_delay, 0) / 100_000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Divisor of the parent difficulty giving one adjustment step.
    pub bound_divisor: u64,

    /// Lowest difficulty the formula can produce (before the bomb term).
    pub minimum: u64,

    /// Block-time window in seconds that one adjustment step corresponds to.
    pub duration_limit: u64,

    /// Number of blocks by which the bomb is delayed.
    pub bomb_delay: u64,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self {
            bound_divisor: DIFFICULTY_BOUND_DIVISOR,
            minimum: MINIMUM_DIFFICULTY,
            duration_limit: DURATION_LIMIT,
            bomb_delay: BOMB_DELAY,
        }
    }
}

/// Blocks per bomb period.
const BOMB_PERIOD: u64 = 100_000;

/// Lower bound of the adjustment factor.
const MAX_SIGMA_DECREASE: i64 = -99;

impl DifficultyParams {
    /// Computes the difficulty a child of `parent` with the given `timestamp` must declare.
    ///
    /// A `timestamp` not after the parent's is treated as a zero block time; such headers are
    /// invalid for other reasons.
    pub fn expected_difficulty(&self, parent: &Header, timestamp: u64) -> U256 {
        let parent_diff = parent.difficulty;

        let elapsed = timestamp.saturating_sub(parent.timestamp) / self.duration_limit;
        let base = if parent.ommers_hash == EMPTY_OMMERS_HASH { 1 } else { 2 };
        let sigma = i64::try_from(elapsed)
            .map_or(MAX_SIGMA_DECREASE, |elapsed| base - elapsed)
            .max(MAX_SIGMA_DECREASE);

        let step = parent_diff / U256::from(self.bound_divisor);
        let adjust = step * U256::from(sigma.unsigned_abs());
        let mut diff = if sigma >= 0 {
            parent_diff.saturating_add(adjust)
        } else {
            parent_diff.saturating_sub(adjust)
        };
        diff = diff.max(U256::from(self.minimum));

        // the exponential term only kicks in after the delay has passed
        let period = (parent.number + 1).saturating_sub(self.bomb_delay) / BOMB_PERIOD;
        if period > 1 {
            let bomb = match u32::try_from(period - 2) {
                Ok(shift) if shift < 256 => U256::ONE << shift,
                _ => U256::MAX,
            };
            diff = diff.saturating_add(bomb);
        }

        diff
    }
}

/// Layout of the ethash proof-of-work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowParams {
    /// Number of consecutive blocks sharing one dataset.
    pub epoch_length: u64,

    /// Number of dataset pages accessed by one hashimoto run.
    pub dataset_accesses: usize,
}

impl Default for PowParams {
    fn default() -> Self {
        Self {
            epoch_length: EPOCH_LENGTH,
            dataset_accesses: DATASET_ACCESSES,
        }
    }
}

impl PowParams {
    /// Checks that epochs and hashimoto runs are non-empty.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.epoch_length == 0 {
            return Err(ParamsError::Zero("pow.epoch_length"));
        }
        if self.dataset_accesses == 0 {
            return Err(ParamsError::Zero("pow.dataset_accesses"));
        }

        Ok(())
    }

    /// Returns the dataset epoch that a block at `number` belongs to.
    pub const fn epoch_of(&self, number: u64) -> u64 {
        number / self.epoch_length
    }
}
