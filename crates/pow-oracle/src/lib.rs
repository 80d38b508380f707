//! Proof-of-work verification for source-chain headers.
//!
//! The relay never holds an ethash dataset. It holds one committed Merkle root per dataset epoch
//! and checks PoW claims against witnesses (dataset pages plus their Merkle branches) supplied by
//! whoever disputes a header. [`PowOracle`] is the seam the dispute engine talks to;
//! [`EthashOracle`] is the implementation backed by committed epoch roots.

pub mod dataset;
pub mod dataset_proof;
pub mod errors;
pub mod ethash;
pub mod hashimoto;
pub mod oracle;
pub mod witness;

pub use errors::PowOracleError;
pub use ethash::{EpochDescriptor, EthashOracle};
pub use oracle::{PowOracle, PowVerdict};
pub use witness::{DatasetPage, FullPowWitness, LookupWitness};
