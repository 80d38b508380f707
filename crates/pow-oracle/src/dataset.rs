//! An in-memory ethash dataset, used by disputers to build witnesses.

use std::convert::Infallible;

use ethrelay_primitives::{buf::Buf32, header::Header};

use crate::{
    dataset_proof::{branch, build_levels, page_leaf},
    errors::PowOracleError,
    ethash::{sample_access, EpochDescriptor},
    hashimoto::{hashimoto, HashimotoOutput},
    witness::{DatasetPage, FullPowWitness, LookupWitness},
};

/// The full page list of one epoch together with its Merkle tree.
#[derive(Debug, Clone)]
pub struct EthashDataset {
    pages: Vec<DatasetPage>,
    levels: Vec<Vec<Buf32>>,
}

impl EthashDataset {
    /// Builds the dataset and its Merkle tree from the page list.
    pub fn new(pages: Vec<DatasetPage>) -> Result<Self, PowOracleError> {
        if pages.is_empty() {
            return Err(PowOracleError::EmptyDataset);
        }

        let levels = build_levels(pages.iter().map(page_leaf).collect());
        Ok(Self { pages, levels })
    }

    /// Returns the descriptor to commit for this dataset's epoch.
    pub fn descriptor(&self) -> EpochDescriptor {
        EpochDescriptor {
            root: self.levels[self.levels.len() - 1][0],
            pages: self.pages.len() as u64,
            depth: (self.levels.len() - 1) as u32,
        }
    }

    /// Returns the page at `index`, if any.
    pub fn page(&self, index: u64) -> Option<&DatasetPage> {
        self.pages.get(usize::try_from(index).ok()?)
    }

    /// Runs hashimoto for `header` against this dataset.
    pub fn hashimoto(&self, header: &Header, accesses: usize) -> HashimotoOutput {
        let res = hashimoto::<Infallible>(
            &header.seal_hash(),
            header.nonce,
            self.pages.len() as u64,
            accesses,
            |_, index| Ok(self.pages[index as usize]),
        );
        match res {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    /// Builds a witness that authenticates every access `header`'s hashimoto run makes.
    pub fn full_witness(&self, header: &Header, accesses: usize) -> FullPowWitness {
        let indices = self.accessed_pages(header, accesses);
        FullPowWitness {
            pages: indices.iter().map(|i| self.pages[*i as usize]).collect(),
            proofs: indices.iter().map(|i| branch(&self.levels, *i)).collect(),
        }
    }

    /// Builds a witness that authenticates only the sampled access of `header`'s hashimoto run.
    pub fn lookup_witness(&self, header: &Header, accesses: usize) -> LookupWitness {
        let indices = self.accessed_pages(header, accesses);
        let sampled = indices[sample_access(header, accesses)];
        LookupWitness {
            pages: indices.iter().map(|i| self.pages[*i as usize]).collect(),
            sample_proof: branch(&self.levels, sampled),
        }
    }

    fn accessed_pages(&self, header: &Header, accesses: usize) -> Vec<u64> {
        let mut indices = Vec::with_capacity(accesses);
        let res = hashimoto::<Infallible>(
            &header.seal_hash(),
            header.nonce,
            self.pages.len() as u64,
            accesses,
            |_, index| {
                indices.push(index);
                Ok(self.pages[index as usize])
            },
        );
        if let Err(never) = res {
            match never {}
        }
        indices
    }
}
