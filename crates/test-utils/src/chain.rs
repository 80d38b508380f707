//! Builders for header chains that pass every structural check.

use ethnum::U256;
use ethrelay_params::relay::RelayParams;
use ethrelay_primitives::{buf::Buf32, header::Header};

/// RLP of mainnet block 8084509.
pub const MAINNET_HEADER_RLP: &str = "f90217a0f325431224239d833b7d870b4d6d7fd2e6ab4b80857022daa012a9a08277e09fa01dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d493479406b8c5883ec71bc3f4b332081519f23834c8706ea00ceb1811de623435b9e6e35e75b2faa0e732d364b2a3781bc6e9d6b5212b860ba056e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421a056e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421b90100000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000008707896d68b38322837b5c1d837a120080845d1ddeaa99d883010817846765746888676f312e31302e34856c696e7578a04db51f8d4a4200dbdcbf0bd0c7bd8c104dfcfa61fb5ba7ef767183f86b1d57d588c23b0a7000b8c2c7";

/// Seconds between consecutive headers built here.
pub const BLOCK_TIME: u64 = 13;

/// Mainnet block 8084509, used as the trusted genesis of most relay fixtures.
pub fn mainnet_header() -> Header {
    let bytes = hex::decode(MAINNET_HEADER_RLP).expect("fixture is valid hex");
    Header::from_rlp(&bytes).expect("fixture is a valid header")
}

/// A header with a tiny difficulty, so that children can be mined against a synthetic dataset.
///
/// Use together with [`low_difficulty_params`].
pub fn low_difficulty_genesis() -> Header {
    Header {
        number: 1_000,
        difficulty: U256::new(16),
        gas_limit: 8_000_000,
        timestamp: 1_600_000_000,
        ..Default::default()
    }
}

/// Relay parameters whose difficulty floor lets [`low_difficulty_genesis`] descendants keep their
/// tiny difficulty.
pub fn low_difficulty_params() -> RelayParams {
    let mut params = RelayParams::default();
    params.difficulty.minimum = 1;
    params
}

/// Builds a structurally valid child of `parent`.
///
/// Children of the same parent built with different `tag`s are distinct headers, which is how
/// tests build forks.
pub fn valid_child(parent: &Header, params: &RelayParams, tag: u8) -> Header {
    let timestamp = parent.timestamp + BLOCK_TIME;
    Header {
        parent_hash: parent.hash(),
        beneficiary: parent.beneficiary,
        state_root: Buf32([tag; 32]),
        difficulty: params.difficulty.expected_difficulty(parent, timestamp),
        number: parent.number + 1,
        gas_limit: parent.gas_limit,
        timestamp,
        extra_data: vec![tag],
        ..Default::default()
    }
}

/// Builds `len` structurally valid headers extending `parent`.
pub fn valid_chain(parent: &Header, params: &RelayParams, len: usize, tag: u8) -> Vec<Header> {
    let mut chain: Vec<Header> = Vec::with_capacity(len);
    for _ in 0..len {
        let tip = chain.last().unwrap_or(parent);
        let child = valid_child(tip, params, tag);
        chain.push(child);
    }
    chain
}
