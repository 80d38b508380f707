//! Dispute outcomes.

use std::fmt;

use ethnum::U256;
use ethrelay_header_tree::{PrunedHeader, Violation};
use ethrelay_primitives::buf::Address;

/// What a dispute found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnCode {
    /// The header passed every check.
    NoViolation,

    /// The header's proof of work does not hold up.
    PowViolation,

    /// The header breaks a structural rule.
    Structural(Violation),
}

impl ReturnCode {
    /// Returns the numeric code of the outcome, `0` meaning no violation.
    pub const fn code(&self) -> u8 {
        match self {
            Self::NoViolation => 0,
            Self::PowViolation => 2,
            Self::Structural(violation) => violation.code(),
        }
    }

    /// Returns `true` if the disputed header was found invalid.
    pub const fn is_violation(&self) -> bool {
        !matches!(self, Self::NoViolation)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoViolation => write!(f, "no violation"),
            Self::PowViolation => write!(f, "pow violation"),
            Self::Structural(violation) => write!(f, "{violation}"),
        }
    }
}

/// The tier a dispute ran at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisputeTier {
    /// Sampled PoW check, bonds of removed headers are released.
    Lightweight,

    /// Full PoW check, bonds of removed headers go to the disputer.
    Full,
}

/// Result of a dispute that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeReport {
    /// The tier the dispute ran at.
    pub tier: DisputeTier,

    /// What the dispute found.
    pub code: ReturnCode,

    /// Removed headers in depth-first order, starting with the disputed header.
    pub removed: Vec<PrunedHeader>,

    /// Stake moved to the disputer.
    pub slashed: U256,
}

impl DisputeReport {
    pub(crate) const fn clean(tier: DisputeTier) -> Self {
        Self {
            tier,
            code: ReturnCode::NoViolation,
            removed: Vec::new(),
            slashed: U256::ZERO,
        }
    }

    /// Returns the submitters of the removed headers, one entry per header.
    pub fn submitters(&self) -> Vec<Address> {
        self.removed.iter().map(|pruned| pruned.submitter).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ReturnCode::NoViolation.code(), 0);
        assert_eq!(ReturnCode::PowViolation.code(), 2);
        assert_eq!(ReturnCode::Structural(Violation::Number).code(), 4);
        assert_eq!(ReturnCode::Structural(Violation::GasUsed).code(), 11);
        assert!(!ReturnCode::NoViolation.is_violation());
        assert!(ReturnCode::PowViolation.is_violation());
    }
}
