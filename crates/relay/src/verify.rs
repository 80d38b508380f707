//! Paid verification of inclusion proofs against relayed headers.

use ethnum::U256;
use ethrelay_header_tree::QueryError;
use ethrelay_pow_oracle::PowOracle;
use ethrelay_primitives::buf::Buf32;
use ethrelay_trie_proof::{MptProof, ReceiptProof, TransactionProof, TrieRoot};
use tracing::{debug, info};

use crate::{
    errors::{FeeError, RelayError},
    state::RelayState,
};

/// The fee attached to a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    /// The fee the caller declares to pay.
    pub fee: U256,

    /// The value that actually came with the request.
    pub transferred: U256,
}

impl Payment {
    /// A payment whose transferred value matches the declared fee.
    pub const fn exact(fee: U256) -> Self {
        Self {
            fee,
            transferred: fee,
        }
    }
}

/// Result of a verification whose preconditions held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    /// The proof shows the value is included.
    Match,

    /// The proof does not show the value is included.
    Mismatch,
}

impl<O: PowOracle> RelayState<O> {
    /// Verifies that `value` is the transaction `proof` points to in the header with `header`.
    ///
    /// The header must be on the heaviest branch with the header `confirmations` positions
    /// after it unlocked. The fee goes to the header's submitter whether the proof matches or
    /// not.
    pub fn verify_transaction(
        &mut self,
        payment: Payment,
        header: &Buf32,
        confirmations: u64,
        value: &[u8],
        proof: &TransactionProof,
        now: u64,
    ) -> Result<VerificationResult, RelayError> {
        self.verify_inclusion(payment, header, confirmations, value, proof, now)
    }

    /// Verifies that `value` is the receipt `proof` points to in the header with `header`.
    ///
    /// See [`Self::verify_transaction`].
    pub fn verify_receipt(
        &mut self,
        payment: Payment,
        header: &Buf32,
        confirmations: u64,
        value: &[u8],
        proof: &ReceiptProof,
        now: u64,
    ) -> Result<VerificationResult, RelayError> {
        self.verify_inclusion(payment, header, confirmations, value, proof, now)
    }

    fn verify_inclusion<T: TrieRoot>(
        &mut self,
        payment: Payment,
        header: &Buf32,
        confirmations: u64,
        value: &[u8],
        proof: &MptProof<T>,
        now: u64,
    ) -> Result<VerificationResult, RelayError> {
        self.check_payment(payment)?;
        self.tree.require_confirmed(header, confirmations, now)?;

        let (Some(stored), Some(meta)) = (self.tree.header(header), self.tree.metadata(header))
        else {
            return Err(QueryError::NotFound(*header).into());
        };
        let submitter = meta.submitter;

        let result = match proof.verify(stored, value) {
            Ok(()) => VerificationResult::Match,
            Err(err) => {
                debug!(%header, %err, "inclusion proof does not match");
                VerificationResult::Mismatch
            }
        };

        self.ledger.credit_fee(submitter, payment.fee);
        info!(trie = T::NAME, %header, confirmations, ?result, %submitter, fee = %payment.fee, "verified inclusion proof");

        Ok(result)
    }

    fn check_payment(&self, payment: Payment) -> Result<(), FeeError> {
        let Payment { fee, transferred } = payment;
        if fee != transferred {
            return Err(FeeError::TransferMismatch { fee, transferred });
        }

        let required = self.params.stake.verification_fee;
        if fee < required {
            return Err(FeeError::TooSmall { fee, required });
        }
        if fee > required {
            return Err(FeeError::TooLarge { fee, required });
        }

        Ok(())
    }
}
