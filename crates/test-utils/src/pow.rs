//! Proof-of-work fixtures: a scriptable oracle and a synthetic ethash dataset to mine against.

use std::collections::BTreeSet;

use ethrelay_pow_oracle::{
    dataset::EthashDataset, dataset_proof::DatasetProof, hashimoto::meets_target, EthashOracle,
    FullPowWitness, LookupWitness, PowOracle, PowOracleError, PowVerdict,
};
use ethrelay_params::chain::PowParams;
use ethrelay_primitives::{buf::Buf32, header::Header};

/// A [`PowOracle`] with scripted verdicts.
///
/// Every header is valid unless marked otherwise. A header marked as evading the sample passes
/// the sampled check even when its PoW is invalid.
#[derive(Debug, Clone, Default)]
pub struct MockPowOracle {
    invalid: BTreeSet<Buf32>,
    evading: BTreeSet<Buf32>,
    failure: Option<PowOracleError>,
}

impl MockPowOracle {
    /// Creates an oracle that considers every header valid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the header with `hash` as carrying invalid PoW.
    pub fn mark_invalid(&mut self, hash: Buf32) {
        self.invalid.insert(hash);
    }

    /// Lets the header with `hash` pass the sampled check regardless of its PoW.
    pub fn evade_sampling(&mut self, hash: Buf32) {
        self.evading.insert(hash);
    }

    /// Makes every subsequent check fail with `err`.
    pub fn fail_with(&mut self, err: PowOracleError) {
        self.failure = Some(err);
    }

    fn check(&self, header: &Header, sampled: bool) -> Result<PowVerdict, PowOracleError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let hash = header.hash();
        if !self.invalid.contains(&hash) || (sampled && self.evading.contains(&hash)) {
            Ok(PowVerdict::Valid)
        } else {
            Ok(PowVerdict::Invalid)
        }
    }
}

impl PowOracle for MockPowOracle {
    fn verify_sample(
        &self,
        header: &Header,
        _witness: &LookupWitness,
    ) -> Result<PowVerdict, PowOracleError> {
        self.check(header, true)
    }

    fn verify_full(
        &self,
        header: &Header,
        _witness: &FullPowWitness,
    ) -> Result<PowVerdict, PowOracleError> {
        self.check(header, false)
    }
}

/// A lookup witness carrying nothing, for oracles that do not read it.
pub fn empty_lookup_witness() -> LookupWitness {
    LookupWitness {
        pages: Vec::new(),
        sample_proof: DatasetProof::new(0, Vec::new()),
    }
}

/// A full witness carrying nothing, for oracles that do not read it.
pub fn empty_full_witness() -> FullPowWitness {
    FullPowWitness {
        pages: Vec::new(),
        proofs: Vec::new(),
    }
}

/// Builds a deterministic dataset of `pages` pages.
pub fn synthetic_dataset(pages: u32) -> EthashDataset {
    let pages = (0..pages)
        .map(|i| std::array::from_fn(|j| i.wrapping_mul(0x0101_0101) ^ j as u32))
        .collect();
    EthashDataset::new(pages).expect("dataset is not empty")
}

/// Creates an [`EthashOracle`] that has `dataset` committed for `epoch`.
pub fn ethash_oracle(params: PowParams, epoch: u64, dataset: &EthashDataset) -> EthashOracle {
    let mut oracle = EthashOracle::new(params).expect("pow params are valid");
    oracle
        .register_epoch(epoch, dataset.descriptor())
        .expect("dataset is not empty");
    oracle
}

/// Searches a nonce that seals `header` against `dataset` and sets its nonce and mix.
///
/// Only practical for tiny difficulties.
pub fn mine(mut header: Header, dataset: &EthashDataset, accesses: usize) -> Header {
    for nonce in 0.. {
        header.nonce = nonce;
        let out = dataset.hashimoto(&header, accesses);
        if meets_target(&out.result, &header.difficulty) {
            header.mix_hash = out.mix_digest;
            return header;
        }
    }
    unreachable!("nonce space exhausted")
}

/// Makes sure `header` does not carry a valid seal for `dataset` by pointing its mix elsewhere.
pub fn break_seal(mut header: Header, dataset: &EthashDataset, accesses: usize) -> Header {
    let honest = dataset.hashimoto(&header, accesses).mix_digest;
    header.mix_hash = Buf32(honest.0.map(|b| !b));
    header
}
