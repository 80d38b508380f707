//! Structural header rules.
//!
//! These are the rules a header can be checked against given only its parent and the current
//! time. Each rule has a stable numeric code that disputes report.

use ethrelay_params::relay::RelayParams;
use ethrelay_primitives::header::Header;
use thiserror::Error;
use tracing::debug;

/// A broken structural rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Violation {
    /// The number is not the parent's plus one.
    #[error("block number is not parent number + 1")]
    Number,

    /// The timestamp lies too far in the future.
    #[error("timestamp too far in the future")]
    FutureTimestamp,

    /// The timestamp is not after the parent's.
    #[error("timestamp not after parent timestamp")]
    TimestampNotAfterParent,

    /// The difficulty does not follow from the parent.
    #[error("difficulty does not match the adjustment formula")]
    Difficulty,

    /// The gas limit exceeds the absolute maximum.
    #[error("gas limit above maximum")]
    GasLimitTooHigh,

    /// The gas limit is below the absolute minimum.
    #[error("gas limit below minimum")]
    GasLimitTooLow,

    /// The gas limit moved too far from the parent's.
    #[error("gas limit outside the range allowed by the parent")]
    GasLimitDelta,

    /// More gas was used than the limit allows.
    #[error("gas used exceeds gas limit")]
    GasUsed,
}

impl Violation {
    /// Returns the numeric code reported for this violation.
    pub const fn code(self) -> u8 {
        match self {
            Self::Number => 4,
            Self::FutureTimestamp => 5,
            Self::TimestampNotAfterParent => 6,
            Self::Difficulty => 7,
            Self::GasLimitTooHigh => 8,
            Self::GasLimitTooLow => 9,
            Self::GasLimitDelta => 10,
            Self::GasUsed => 11,
        }
    }
}

/// Checks `header` against `parent` at time `now`, returning the first broken rule in code order.
pub fn check_header(
    header: &Header,
    parent: &Header,
    now: u64,
    params: &RelayParams,
) -> Result<(), Violation> {
    let res = check_rules(header, parent, now, params);
    if let Err(violation) = res {
        debug!(number = header.number, code = violation.code(), %violation, "header violates rule");
    }
    res
}

fn check_rules(
    header: &Header,
    parent: &Header,
    now: u64,
    params: &RelayParams,
) -> Result<(), Violation> {
    if parent.number.checked_add(1) != Some(header.number) {
        return Err(Violation::Number);
    }

    if header.timestamp >= now.saturating_add(params.allowed_future_skew) {
        return Err(Violation::FutureTimestamp);
    }

    if header.timestamp <= parent.timestamp {
        return Err(Violation::TimestampNotAfterParent);
    }

    let expected = params
        .difficulty
        .expected_difficulty(parent, header.timestamp);
    if header.difficulty != expected {
        return Err(Violation::Difficulty);
    }

    if header.gas_limit > params.gas.max_gas_limit {
        return Err(Violation::GasLimitTooHigh);
    }

    if header.gas_limit < params.gas.min_gas_limit {
        return Err(Violation::GasLimitTooLow);
    }

    let bound = parent.gas_limit / params.gas.bound_divisor;
    if header.gas_limit.abs_diff(parent.gas_limit) > bound {
        return Err(Violation::GasLimitDelta);
    }

    if header.gas_used > header.gas_limit {
        return Err(Violation::GasUsed);
    }

    Ok(())
}
