//! Top-level relay parameters.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    chain::{DifficultyParams, GasLimitParams, PowParams},
    default::{ALLOWED_FUTURE_SKEW, LOCK_PERIOD},
    errors::ParamsError,
    stake::StakeParams,
};

/// How much validation a header goes through when it is submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionChecks {
    /// Only the parent link, duplicates and stake are checked; invalid headers are accepted and
    /// left to be removed by disputes.
    #[default]
    Optimistic,

    /// Every structural rule is checked at submission and violating headers are rejected.
    Strict,
}

/// All parameters of a relay instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayParams {
    /// Seconds a header (and the stake bonding it) stays locked after submission.
    pub lock_period: u64,

    /// Seconds a header's timestamp may lie ahead of the relay's clock.
    pub allowed_future_skew: u64,

    /// Validation applied at submission time.
    #[serde(default)]
    pub submission_checks: SubmissionChecks,

    /// Stake and fee amounts.
    pub stake: StakeParams,

    /// Gas limit rules.
    #[serde(default)]
    pub gas: GasLimitParams,

    /// Difficulty adjustment rules.
    #[serde(default)]
    pub difficulty: DifficultyParams,

    /// Ethash layout.
    #[serde(default)]
    pub pow: PowParams,
}

impl Default for RelayParams {
    fn default() -> Self {
        Self {
            lock_period: LOCK_PERIOD,
            allowed_future_skew: ALLOWED_FUTURE_SKEW,
            submission_checks: SubmissionChecks::default(),
            stake: StakeParams::default(),
            gas: GasLimitParams::default(),
            difficulty: DifficultyParams::default(),
            pow: PowParams::default(),
        }
    }
}

impl RelayParams {
    /// Parses and validates parameters from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ParamsError> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;

        Ok(params)
    }

    /// Reads, parses and validates parameters from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ParamsError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&contents)
    }

    /// Checks that the parameters are internally consistent.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.gas.bound_divisor == 0 {
            return Err(ParamsError::Zero("gas.bound_divisor"));
        }
        if self.difficulty.bound_divisor == 0 {
            return Err(ParamsError::Zero("difficulty.bound_divisor"));
        }
        if self.difficulty.duration_limit == 0 {
            return Err(ParamsError::Zero("difficulty.duration_limit"));
        }
        self.pow.validate()?;
        if self.gas.min_gas_limit > self.gas.max_gas_limit {
            return Err(ParamsError::GasLimitRange {
                min: self.gas.min_gas_limit,
                max: self.gas.max_gas_limit,
            });
        }

        Ok(())
    }
}
