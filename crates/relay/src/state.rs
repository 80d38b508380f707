//! The relay state machine.

use ethnum::U256;
use ethrelay_dispute::{DisputeEngine, DisputeReport};
use ethrelay_header_tree::{HeaderMetadata, HeaderTree};
use ethrelay_params::relay::RelayParams;
use ethrelay_pow_oracle::{EthashOracle, FullPowWitness, LookupWitness, PowOracle};
use ethrelay_primitives::{
    buf::{Address, Buf32},
    header::Header,
};
use ethrelay_stake_ledger::StakeLedger;
use tracing::{debug, info, warn};

use crate::errors::RelayError;

/// Outcome of a submission that was not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The headers were stored, with these hashes.
    Accepted(Vec<Buf32>),

    /// The submitter lacked unused stake for the headers, nothing happened.
    Ignored,
}

/// The complete relay: header tree, stake ledger and dispute engine.
///
/// Every operation takes the current time explicitly and either completes or fails without any
/// effect.
#[derive(Debug)]
pub struct RelayState<O = EthashOracle> {
    pub(crate) tree: HeaderTree,
    pub(crate) ledger: StakeLedger,
    engine: DisputeEngine<O>,
    pub(crate) params: RelayParams,
}

impl<O: PowOracle> RelayState<O> {
    /// Creates a relay trusting `genesis`, whose total difficulty is `genesis_td`.
    pub fn new(
        genesis: Header,
        genesis_td: U256,
        params: RelayParams,
        oracle: O,
        now: u64,
    ) -> Result<Self, RelayError> {
        params.validate()?;

        Ok(Self {
            tree: HeaderTree::new(genesis, genesis_td, now),
            ledger: StakeLedger::new(params.stake.stake_per_header),
            engine: DisputeEngine::new(oracle, params),
            params,
        })
    }

    /// Returns the parameters.
    pub const fn params(&self) -> &RelayParams {
        &self.params
    }

    /// Returns the header tree.
    pub const fn tree(&self) -> &HeaderTree {
        &self.tree
    }

    /// Returns the stake ledger.
    pub const fn ledger(&self) -> &StakeLedger {
        &self.ledger
    }

    /// Returns the PoW oracle.
    pub const fn oracle(&self) -> &O {
        self.engine.oracle()
    }

    /// Returns the PoW oracle for updates, such as committing new epochs.
    pub fn oracle_mut(&mut self) -> &mut O {
        self.engine.oracle_mut()
    }

    /// Submits a single header on behalf of `submitter`.
    pub fn submit(
        &mut self,
        header: Header,
        submitter: Address,
        now: u64,
    ) -> Result<Submission, RelayError> {
        self.submit_batch(vec![header], submitter, now)
    }

    /// Decodes and submits an RLP-encoded header on behalf of `submitter`.
    pub fn submit_rlp(
        &mut self,
        rlp: &[u8],
        submitter: Address,
        now: u64,
    ) -> Result<Submission, RelayError> {
        let header = Header::from_rlp(rlp)?;
        self.submit(header, submitter, now)
    }

    /// Submits a chain of headers on behalf of `submitter`, bonding stake to each.
    ///
    /// If `submitter` cannot bond stake for all of them the call is ignored. Otherwise either all
    /// headers are stored or the call fails.
    pub fn submit_batch(
        &mut self,
        headers: Vec<Header>,
        submitter: Address,
        now: u64,
    ) -> Result<Submission, RelayError> {
        let tree = &self.tree;
        if !self
            .ledger
            .can_bond(&submitter, headers.len(), now, |hash| tree.contains(hash))
        {
            info!(%submitter, headers = headers.len(), "not enough unused stake, ignoring submission");
            return Ok(Submission::Ignored);
        }

        let hashes = self
            .tree
            .submit_batch(headers, submitter, now, &self.params)
            .inspect_err(|err| warn!(%submitter, %err, "rejected submission"))?;

        let locked_until = now.saturating_add(self.params.lock_period);
        for hash in &hashes {
            self.ledger.bond(submitter, *hash, locked_until);
        }

        Ok(Submission::Accepted(hashes))
    }

    /// Deposits `amount` of stake for `who`; `transferred` is the value that came with the
    /// request. Returns the new deposited stake.
    pub fn deposit(
        &mut self,
        who: Address,
        amount: U256,
        transferred: U256,
    ) -> Result<U256, RelayError> {
        Ok(self.ledger.deposit(who, amount, transferred)?)
    }

    /// Withdraws up to `amount` of the unlocked stake of `who`. Returns the amount withdrawn.
    pub fn withdraw(&mut self, who: Address, amount: U256, now: u64) -> Result<U256, RelayError> {
        let tree = &self.tree;
        let withdrawn = self
            .ledger
            .withdraw(&who, amount, now, |hash| tree.contains(hash))?;
        Ok(withdrawn)
    }

    /// Pays out the verification fees earned by `who`.
    pub fn withdraw_fees(&mut self, who: Address) -> U256 {
        self.ledger.withdraw_fees(&who)
    }

    /// Runs a lightweight dispute against `header`. See
    /// [`DisputeEngine::dispute_without_punishment`].
    pub fn dispute_without_punishment(
        &mut self,
        header: &Buf32,
        parent: &Buf32,
        witness: &LookupWitness,
        now: u64,
    ) -> Result<DisputeReport, RelayError> {
        let report = self
            .engine
            .dispute_without_punishment(
                &mut self.tree,
                &mut self.ledger,
                header,
                parent,
                witness,
                now,
            )
            .inspect_err(|err| warn!(%header, %err, "lightweight dispute failed"))?;
        Ok(report)
    }

    /// Runs a full dispute by `disputer` against `header`. See [`DisputeEngine::dispute`].
    pub fn dispute(
        &mut self,
        disputer: Address,
        header: &Buf32,
        parent: &Buf32,
        witness: &FullPowWitness,
        now: u64,
    ) -> Result<DisputeReport, RelayError> {
        let report = self
            .engine
            .dispute(
                &mut self.tree,
                &mut self.ledger,
                disputer,
                header,
                parent,
                witness,
                now,
            )
            .inspect_err(|err| warn!(%header, %disputer, %err, "full dispute failed"))?;
        Ok(report)
    }
}

impl<O> RelayState<O> {
    /// Returns the stored header with `hash`.
    pub fn get_header(&self, hash: &Buf32) -> Option<&Header> {
        self.tree.header(hash)
    }

    /// Returns the relay bookkeeping of the stored header with `hash`.
    pub fn get_header_metadata(&self, hash: &Buf32) -> Option<&HeaderMetadata> {
        self.tree.metadata(hash)
    }

    /// Returns `true` if a header with `hash` is stored.
    pub fn contains(&self, hash: &Buf32) -> bool {
        self.tree.contains(hash)
    }

    /// Returns the genesis hash.
    pub const fn genesis(&self) -> Buf32 {
        self.tree.genesis()
    }

    /// Returns the endpoint at `index`.
    pub fn get_endpoint(&self, index: usize) -> Option<Buf32> {
        self.tree.endpoint(index)
    }

    /// Returns the tip of the heaviest branch.
    pub const fn longest_chain_endpoint(&self) -> Buf32 {
        self.tree.longest_chain_endpoint()
    }

    /// Returns the number of branches.
    pub fn number_of_forks(&self) -> usize {
        self.tree.number_of_forks()
    }

    /// Returns `true` if the header with `hash` is stored and unlocked at `now`.
    pub fn is_unlocked(&self, hash: &Buf32, now: u64) -> bool {
        self.tree.is_unlocked(hash, now)
    }

    /// Counts the headers on the heaviest branch after the header with `hash`.
    pub fn confirmations_for(&self, hash: &Buf32) -> Option<u64> {
        self.tree.confirmations_for(hash)
    }

    /// Returns the deposited stake of `who`.
    pub fn get_stake(&self, who: &Address) -> U256 {
        self.ledger.deposited(who)
    }

    /// Returns the verification fees `who` earned and has not withdrawn.
    pub fn earned_fees(&self, who: &Address) -> U256 {
        self.ledger.earned_fees(who)
    }

    /// Returns the stored headers `who` still has stake bonded to, in submission order.
    ///
    /// Expired bonds are only dropped by the next withdrawal of `who`.
    pub fn submitted_headers_for(&self, who: &Address) -> Vec<Buf32> {
        let headers: Vec<Buf32> = self
            .ledger
            .bonded_headers(who)
            .into_iter()
            .filter(|hash| self.tree.contains(hash))
            .collect();
        debug!(%who, headers = headers.len(), "listed submitted headers");
        headers
    }

    /// Returns the stake bonded per submitted header.
    pub const fn required_stake_per_header(&self) -> U256 {
        self.params.stake.stake_per_header
    }

    /// Returns the fee charged per verification.
    pub const fn required_verification_fee(&self) -> U256 {
        self.params.stake.verification_fee
    }
}
