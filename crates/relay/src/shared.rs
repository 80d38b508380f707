//! Serialized access to a relay from many callers.

use std::sync::Arc;

use ethnum::U256;
use ethrelay_dispute::DisputeReport;
use ethrelay_header_tree::HeaderMetadata;
use ethrelay_pow_oracle::{EthashOracle, FullPowWitness, LookupWitness, PowOracle};
use ethrelay_primitives::{
    buf::{Address, Buf32},
    header::Header,
};
use ethrelay_trie_proof::{ReceiptProof, TransactionProof};
use parking_lot::Mutex;

use crate::{
    errors::RelayError,
    state::{RelayState, Submission},
    verify::{Payment, VerificationResult},
};

/// A cloneable handle to a [`RelayState`].
///
/// Each operation holds the lock for its whole duration, so operations from different callers
/// are applied one at a time in the order they acquire the lock.
#[derive(Debug)]
pub struct SharedRelay<O = EthashOracle> {
    inner: Arc<Mutex<RelayState<O>>>,
}

impl<O> Clone for SharedRelay<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: PowOracle> SharedRelay<O> {
    /// Wraps `state`.
    pub fn new(state: RelayState<O>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Runs `f` with exclusive access to the relay.
    pub fn with<R>(&self, f: impl FnOnce(&mut RelayState<O>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// See [`RelayState::submit`].
    pub fn submit(
        &self,
        header: Header,
        submitter: Address,
        now: u64,
    ) -> Result<Submission, RelayError> {
        self.inner.lock().submit(header, submitter, now)
    }

    /// See [`RelayState::submit_rlp`].
    pub fn submit_rlp(
        &self,
        rlp: &[u8],
        submitter: Address,
        now: u64,
    ) -> Result<Submission, RelayError> {
        self.inner.lock().submit_rlp(rlp, submitter, now)
    }

    /// See [`RelayState::submit_batch`].
    pub fn submit_batch(
        &self,
        headers: Vec<Header>,
        submitter: Address,
        now: u64,
    ) -> Result<Submission, RelayError> {
        self.inner.lock().submit_batch(headers, submitter, now)
    }

    /// See [`RelayState::deposit`].
    pub fn deposit(
        &self,
        who: Address,
        amount: U256,
        transferred: U256,
    ) -> Result<U256, RelayError> {
        self.inner.lock().deposit(who, amount, transferred)
    }

    /// See [`RelayState::withdraw`].
    pub fn withdraw(&self, who: Address, amount: U256, now: u64) -> Result<U256, RelayError> {
        self.inner.lock().withdraw(who, amount, now)
    }

    /// See [`RelayState::withdraw_fees`].
    pub fn withdraw_fees(&self, who: Address) -> U256 {
        self.inner.lock().withdraw_fees(who)
    }

    /// See [`RelayState::dispute_without_punishment`].
    pub fn dispute_without_punishment(
        &self,
        header: &Buf32,
        parent: &Buf32,
        witness: &LookupWitness,
        now: u64,
    ) -> Result<DisputeReport, RelayError> {
        self.inner
            .lock()
            .dispute_without_punishment(header, parent, witness, now)
    }

    /// See [`RelayState::dispute`].
    pub fn dispute(
        &self,
        disputer: Address,
        header: &Buf32,
        parent: &Buf32,
        witness: &FullPowWitness,
        now: u64,
    ) -> Result<DisputeReport, RelayError> {
        self.inner
            .lock()
            .dispute(disputer, header, parent, witness, now)
    }

    /// See [`RelayState::verify_transaction`].
    pub fn verify_transaction(
        &self,
        payment: Payment,
        header: &Buf32,
        confirmations: u64,
        value: &[u8],
        proof: &TransactionProof,
        now: u64,
    ) -> Result<VerificationResult, RelayError> {
        self.inner
            .lock()
            .verify_transaction(payment, header, confirmations, value, proof, now)
    }

    /// See [`RelayState::verify_receipt`].
    pub fn verify_receipt(
        &self,
        payment: Payment,
        header: &Buf32,
        confirmations: u64,
        value: &[u8],
        proof: &ReceiptProof,
        now: u64,
    ) -> Result<VerificationResult, RelayError> {
        self.inner
            .lock()
            .verify_receipt(payment, header, confirmations, value, proof, now)
    }

    /// Returns a copy of the stored header with `hash`.
    pub fn get_header(&self, hash: &Buf32) -> Option<Header> {
        self.inner.lock().get_header(hash).cloned()
    }

    /// Returns a copy of the bookkeeping of the stored header with `hash`.
    pub fn get_header_metadata(&self, hash: &Buf32) -> Option<HeaderMetadata> {
        self.inner.lock().get_header_metadata(hash).cloned()
    }

    /// See [`RelayState::contains`].
    pub fn contains(&self, hash: &Buf32) -> bool {
        self.inner.lock().contains(hash)
    }

    /// See [`RelayState::get_endpoint`].
    pub fn get_endpoint(&self, index: usize) -> Option<Buf32> {
        self.inner.lock().get_endpoint(index)
    }

    /// See [`RelayState::longest_chain_endpoint`].
    pub fn longest_chain_endpoint(&self) -> Buf32 {
        self.inner.lock().longest_chain_endpoint()
    }

    /// See [`RelayState::number_of_forks`].
    pub fn number_of_forks(&self) -> usize {
        self.inner.lock().number_of_forks()
    }

    /// See [`RelayState::is_unlocked`].
    pub fn is_unlocked(&self, hash: &Buf32, now: u64) -> bool {
        self.inner.lock().is_unlocked(hash, now)
    }

    /// See [`RelayState::confirmations_for`].
    pub fn confirmations_for(&self, hash: &Buf32) -> Option<u64> {
        self.inner.lock().confirmations_for(hash)
    }

    /// See [`RelayState::get_stake`].
    pub fn get_stake(&self, who: &Address) -> U256 {
        self.inner.lock().get_stake(who)
    }

    /// See [`RelayState::earned_fees`].
    pub fn earned_fees(&self, who: &Address) -> U256 {
        self.inner.lock().earned_fees(who)
    }

    /// See [`RelayState::submitted_headers_for`].
    pub fn submitted_headers_for(&self, who: &Address) -> Vec<Buf32> {
        self.inner.lock().submitted_headers_for(who)
    }
}
