//! Per-submitter stake accounts.

use std::collections::BTreeMap;

use ethnum::U256;
use ethrelay_primitives::buf::{Address, Buf32};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::StakeError;

/// Stake bonded to a single submitted header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    /// The header the stake is bonded to.
    pub header: Buf32,

    /// Time after which the bond no longer locks stake.
    pub locked_until: u64,
}

impl Bond {
    /// Returns `true` if the bond still locks stake at `now`.
    pub const fn is_locked(&self, now: u64) -> bool {
        now < self.locked_until
    }
}

/// The stake account of a single identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeAccount {
    /// Total stake deposited and not yet withdrawn or slashed.
    #[serde(with = "ethrelay_primitives::serde_u256")]
    deposited: U256,

    /// Verification fees earned and not yet withdrawn.
    #[serde(with = "ethrelay_primitives::serde_u256")]
    earned_fees: U256,

    /// Bonds in submission order. May contain expired bonds and bonds of pruned headers until
    /// the next sweep.
    bonds: Vec<Bond>,
}

impl StakeAccount {
    /// Returns the deposited stake.
    pub const fn deposited(&self) -> U256 {
        self.deposited
    }

    /// Returns the unwithdrawn verification fees.
    pub const fn earned_fees(&self) -> U256 {
        self.earned_fees
    }

    /// Returns the tracked bonds.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    fn locked_bonds(&self, now: u64, is_live: impl Fn(&Buf32) -> bool) -> u64 {
        self.bonds
            .iter()
            .filter(|bond| bond.is_locked(now) && is_live(&bond.header))
            .count() as u64
    }
}

/// All stake accounts of a relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeLedger {
    /// Stake bonded per header.
    #[serde(with = "ethrelay_primitives::serde_u256")]
    stake_per_header: U256,

    accounts: BTreeMap<Address, StakeAccount>,
}

impl StakeLedger {
    /// Creates an empty ledger bonding `stake_per_header` per submitted header.
    pub const fn new(stake_per_header: U256) -> Self {
        Self {
            stake_per_header,
            accounts: BTreeMap::new(),
        }
    }

    /// Returns the stake bonded per header.
    pub const fn stake_per_header(&self) -> U256 {
        self.stake_per_header
    }

    /// Returns the account of `who`, if it was ever credited.
    pub fn account(&self, who: &Address) -> Option<&StakeAccount> {
        self.accounts.get(who)
    }

    /// Returns the deposited stake of `who`.
    pub fn deposited(&self, who: &Address) -> U256 {
        self.accounts.get(who).map_or(U256::ZERO, StakeAccount::deposited)
    }

    /// Credits `amount` to `who`.
    ///
    /// `transferred` is the value that actually accompanied the request and must equal `amount`.
    /// Returns the new deposited stake.
    pub fn deposit(
        &mut self,
        who: Address,
        amount: U256,
        transferred: U256,
    ) -> Result<U256, StakeError> {
        if amount != transferred {
            return Err(StakeError::TransferMismatch {
                declared: amount,
                transferred,
            });
        }

        let account = self.accounts.entry(who).or_default();
        account.deposited += amount;

        info!(%who, %amount, deposited = %account.deposited, "deposited stake");
        Ok(account.deposited)
    }

    /// Returns the stake of `who` currently locked by bonds, given which headers are still
    /// present.
    pub fn locked(&self, who: &Address, now: u64, is_live: impl Fn(&Buf32) -> bool) -> U256 {
        let count = self
            .accounts
            .get(who)
            .map_or(0, |account| account.locked_bonds(now, is_live));
        self.stake_per_header.saturating_mul(U256::from(count))
    }

    /// Returns the deposited stake of `who` that is not locked.
    pub fn unused(&self, who: &Address, now: u64, is_live: impl Fn(&Buf32) -> bool) -> U256 {
        self.deposited(who)
            .saturating_sub(self.locked(who, now, is_live))
    }

    /// Returns `true` if `who` has enough unused stake to bond `headers` more headers.
    pub fn can_bond(
        &self,
        who: &Address,
        headers: usize,
        now: u64,
        is_live: impl Fn(&Buf32) -> bool,
    ) -> bool {
        let needed = self
            .stake_per_header
            .checked_mul(U256::from(headers as u64));
        needed.is_some_and(|needed| self.unused(who, now, is_live) >= needed)
    }

    /// Bonds stake of `who` to `header` until `locked_until`.
    ///
    /// Callers check [`Self::can_bond`] first.
    pub fn bond(&mut self, who: Address, header: Buf32, locked_until: u64) {
        self.accounts.entry(who).or_default().bonds.push(Bond {
            header,
            locked_until,
        });
        debug!(%who, %header, locked_until, "bonded stake");
    }

    /// Drops bonds of `who` that expired or whose header no longer exists.
    pub fn sweep(&mut self, who: &Address, now: u64, is_live: impl Fn(&Buf32) -> bool) {
        if let Some(account) = self.accounts.get_mut(who) {
            let before = account.bonds.len();
            account
                .bonds
                .retain(|bond| bond.is_locked(now) && is_live(&bond.header));
            debug!(%who, dropped = before - account.bonds.len(), "swept bonds");
        }
    }

    /// Withdraws up to `amount` of unlocked stake of `who` and returns the amount withdrawn.
    ///
    /// Requests above the deposited stake fail. Requests within the deposited stake but above the
    /// unlocked part withdraw just the unlocked part.
    pub fn withdraw(
        &mut self,
        who: &Address,
        amount: U256,
        now: u64,
        is_live: impl Fn(&Buf32) -> bool,
    ) -> Result<U256, StakeError> {
        self.sweep(who, now, &is_live);

        let deposited = self.deposited(who);
        if amount > deposited {
            return Err(StakeError::AmountExceedsDeposit {
                requested: amount,
                deposited,
            });
        }

        let withdrawn = amount.min(self.unused(who, now, &is_live));
        if let Some(account) = self.accounts.get_mut(who) {
            account.deposited -= withdrawn;
        }

        info!(%who, requested = %amount, %withdrawn, "withdrew stake");
        Ok(withdrawn)
    }

    /// Removes the bond of `who` on `header`, returning its stake to the unlocked part.
    ///
    /// Returns `false` if no such bond is tracked.
    pub fn release(&mut self, who: &Address, header: &Buf32) -> bool {
        let released = self
            .accounts
            .get_mut(who)
            .is_some_and(|account| remove_bond(account, header));
        debug!(%who, %header, released, "released bond");
        released
    }

    /// Removes the bond of `from` on `header` and moves its stake to `to`.
    ///
    /// The full bond is moved whenever it was still locking stake. Otherwise only what `from`
    /// has left beyond its other locked bonds is taken, so an account never ends up with less
    /// deposited stake than it has locked. Returns the amount moved.
    pub fn slash(
        &mut self,
        from: &Address,
        to: Address,
        header: &Buf32,
        now: u64,
        is_live: impl Fn(&Buf32) -> bool,
    ) -> U256 {
        let Some(account) = self.accounts.get_mut(from) else {
            return U256::ZERO;
        };
        remove_bond(account, header);

        let remaining_locked = self.locked(from, now, is_live);
        let available = self.deposited(from).saturating_sub(remaining_locked);
        let amount = self.stake_per_header.min(available);

        if let Some(account) = self.accounts.get_mut(from) {
            account.deposited -= amount;
        }
        self.accounts.entry(to).or_default().deposited += amount;

        info!(%from, %to, %header, %amount, "slashed bond");
        amount
    }

    /// Credits a verification fee to `who`.
    pub fn credit_fee(&mut self, who: Address, amount: U256) {
        let account = self.accounts.entry(who).or_default();
        account.earned_fees += amount;
        debug!(%who, %amount, earned = %account.earned_fees, "credited fee");
    }

    /// Returns the unwithdrawn verification fees of `who`.
    pub fn earned_fees(&self, who: &Address) -> U256 {
        self.accounts.get(who).map_or(U256::ZERO, StakeAccount::earned_fees)
    }

    /// Pays out all earned fees of `who` and returns the amount.
    pub fn withdraw_fees(&mut self, who: &Address) -> U256 {
        let amount = self
            .accounts
            .get_mut(who)
            .map_or(U256::ZERO, |account| std::mem::take(&mut account.earned_fees));
        info!(%who, %amount, "withdrew fees");
        amount
    }

    /// Returns the headers `who` has bonded stake to and that have not been swept.
    pub fn bonded_headers(&self, who: &Address) -> Vec<Buf32> {
        self.accounts
            .get(who)
            .map(|account| account.bonds.iter().map(|bond| bond.header).collect())
            .unwrap_or_default()
    }
}

fn remove_bond(account: &mut StakeAccount, header: &Buf32) -> bool {
    match account.bonds.iter().position(|bond| bond.header == *header) {
        Some(pos) => {
            account.bonds.remove(pos);
            true
        }
        None => false,
    }
}
