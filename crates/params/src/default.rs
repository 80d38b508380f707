//! Default values for the relay parameters.

use ethnum::U256;

/// Default duration in seconds for which a submitted header and its bonded stake stay locked.
pub(crate) const LOCK_PERIOD: u64 = 5 * 60;

/// Default number of seconds a header timestamp may lie in the future of the relay's clock.
pub(crate) const ALLOWED_FUTURE_SKEW: u64 = 15;

/// Default stake bonded per submitted header (1 ether in wei).
pub(crate) const STAKE_PER_HEADER: U256 = U256::new(1_000_000_000_000_000_000);

/// Default fee charged for a single inclusion-proof verification (0.01 ether in wei).
pub(crate) const VERIFICATION_FEE: U256 = U256::new(10_000_000_000_000_000);

/// Default lowest gas limit a header may declare.
pub(crate) const MIN_GAS_LIMIT: u64 = 5_000;

/// Default highest gas limit a header may declare.
pub(crate) const MAX_GAS_LIMIT: u64 = (1 << 63) - 1;

/// Default divisor bounding the gas limit change relative to the parent.
pub(crate) const GAS_LIMIT_BOUND_DIVISOR: u64 = 1_024;

/// Default divisor bounding the difficulty adjustment step.
pub(crate) const DIFFICULTY_BOUND_DIVISOR: u64 = 2_048;

/// Default lowest difficulty the adjustment formula can produce.
pub(crate) const MINIMUM_DIFFICULTY: u64 = 131_072;

/// Default block-time window of the difficulty adjustment, in seconds.
pub(crate) const DURATION_LIMIT: u64 = 9;

/// Default number of blocks the difficulty bomb is delayed by (the last PoW-era delay).
pub(crate) const BOMB_DELAY: u64 = 11_400_000;

/// Default number of blocks sharing one ethash dataset.
pub(crate) const EPOCH_LENGTH: u64 = 30_000;

/// Default number of dataset pages accessed by one hashimoto run.
pub(crate) const DATASET_ACCESSES: usize = 64;
