//! Witnesses carrying the dataset pages a hashimoto run reads.

use serde::{Deserialize, Serialize};

use crate::dataset_proof::DatasetProof;

/// One 128-byte dataset page as 32 little-endian words, i.e. two consecutive 64-byte dataset
/// items.
pub type DatasetPage = [u32; 32];

/// Witness for the sampled check: every accessed page, and a branch for just one of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupWitness {
    /// The page read by each dataset access, in access order.
    pub pages: Vec<DatasetPage>,

    /// Branch for the page read by the sampled access.
    pub sample_proof: DatasetProof,
}

/// Witness for the conclusive check: every accessed page with its branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullPowWitness {
    /// The page read by each dataset access, in access order.
    pub pages: Vec<DatasetPage>,

    /// Branch for each page, in access order.
    pub proofs: Vec<DatasetProof>,
}
