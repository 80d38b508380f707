//! The ethash-backed [`PowOracle`].

use std::collections::BTreeMap;

use ethrelay_params::chain::PowParams;
use ethrelay_primitives::{buf::Buf32, header::Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    dataset_proof::DatasetProof,
    errors::PowOracleError,
    hashimoto::{hashimoto, meets_target, HashimotoOutput},
    oracle::{PowOracle, PowVerdict},
    witness::{DatasetPage, FullPowWitness, LookupWitness},
};

/// The commitment to one epoch's dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochDescriptor {
    /// Merkle root over the dataset pages.
    pub root: Buf32,

    /// Number of 128-byte pages in the dataset.
    pub pages: u64,

    /// Length of every page branch.
    pub depth: u32,
}

impl EpochDescriptor {
    fn authenticate(
        &self,
        access: usize,
        index: u64,
        page: &DatasetPage,
        proof: &DatasetProof,
    ) -> Result<(), PowOracleError> {
        if proof.position() != index {
            return Err(PowOracleError::PagePosition {
                access,
                expected: index,
                actual: proof.position(),
            });
        }

        if proof.cohashes().len() != self.depth as usize || !proof.verify(page, self.root) {
            return Err(PowOracleError::DatasetProof(access));
        }

        trace!(access, index, "authenticated dataset page");
        Ok(())
    }
}

/// Returns which dataset access of `header`'s hashimoto run the sampled check authenticates.
///
/// `accesses` must be non-zero.
pub fn sample_access(header: &Header, accesses: usize) -> usize {
    let hash = header.hash();
    let word = u32::from_le_bytes([hash.0[0], hash.0[1], hash.0[2], hash.0[3]]);
    word as usize % accesses
}

/// A [`PowOracle`] checking ethash against committed per-epoch dataset roots.
#[derive(Debug, Clone, Default)]
pub struct EthashOracle {
    params: PowParams,
    epochs: BTreeMap<u64, EpochDescriptor>,
}

impl EthashOracle {
    /// Creates an oracle without any committed epochs.
    pub fn new(params: PowParams) -> Result<Self, PowOracleError> {
        params
            .validate()
            .map_err(|err| PowOracleError::InvalidParams(err.to_string()))?;

        Ok(Self {
            params,
            epochs: BTreeMap::new(),
        })
    }

    /// Commits the dataset of `epoch`, returning the descriptor it replaces, if any.
    pub fn register_epoch(
        &mut self,
        epoch: u64,
        descriptor: EpochDescriptor,
    ) -> Result<Option<EpochDescriptor>, PowOracleError> {
        if descriptor.pages == 0 {
            return Err(PowOracleError::EmptyDataset);
        }

        debug!(epoch, root = %descriptor.root, pages = descriptor.pages, "registered dataset epoch");
        Ok(self.epochs.insert(epoch, descriptor))
    }

    /// Returns the committed descriptor for `epoch`.
    pub fn epoch(&self, epoch: u64) -> Option<&EpochDescriptor> {
        self.epochs.get(&epoch)
    }

    fn descriptor_for(&self, header: &Header) -> Result<&EpochDescriptor, PowOracleError> {
        let epoch = self.params.epoch_of(header.number);
        self.epochs
            .get(&epoch)
            .ok_or(PowOracleError::UnknownEpoch(epoch))
    }

    fn check_shape(&self, actual: usize) -> Result<(), PowOracleError> {
        let expected = self.params.dataset_accesses;
        if actual != expected {
            return Err(PowOracleError::WitnessShape { expected, actual });
        }
        Ok(())
    }
}

fn verdict(header: &Header, out: &HashimotoOutput) -> PowVerdict {
    if out.mix_digest == header.mix_hash && meets_target(&out.result, &header.difficulty) {
        PowVerdict::Valid
    } else {
        PowVerdict::Invalid
    }
}

impl PowOracle for EthashOracle {
    fn verify_sample(
        &self,
        header: &Header,
        witness: &LookupWitness,
    ) -> Result<PowVerdict, PowOracleError> {
        let descriptor = self.descriptor_for(header)?;
        self.check_shape(witness.pages.len())?;

        let sampled = sample_access(header, self.params.dataset_accesses);
        let out = hashimoto::<PowOracleError>(
            &header.seal_hash(),
            header.nonce,
            descriptor.pages,
            self.params.dataset_accesses,
            |access, index| {
                let page = witness.pages[access];
                if access == sampled {
                    descriptor.authenticate(access, index, &page, &witness.sample_proof)?;
                }
                Ok(page)
            },
        )?;

        let verdict = verdict(header, &out);
        debug!(number = header.number, sampled, ?verdict, "sampled pow check");
        Ok(verdict)
    }

    fn verify_full(
        &self,
        header: &Header,
        witness: &FullPowWitness,
    ) -> Result<PowVerdict, PowOracleError> {
        let descriptor = self.descriptor_for(header)?;
        self.check_shape(witness.pages.len())?;
        self.check_shape(witness.proofs.len())?;

        let out = hashimoto::<PowOracleError>(
            &header.seal_hash(),
            header.nonce,
            descriptor.pages,
            self.params.dataset_accesses,
            |access, index| {
                let page = witness.pages[access];
                descriptor.authenticate(access, index, &page, &witness.proofs[access])?;
                Ok(page)
            },
        )?;

        let verdict = verdict(header, &out);
        debug!(number = header.number, ?verdict, "full pow check");
        Ok(verdict)
    }
}
