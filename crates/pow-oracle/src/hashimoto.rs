//! The hashimoto digest at the core of ethash.

use ethnum::U256;
use ethrelay_primitives::{
    buf::Buf32,
    keccak::{keccak256_concat, keccak512},
};

use crate::witness::DatasetPage;

/// FNV prime used by ethash's mixing function.
const FNV_PRIME: u32 = 0x0100_0193;

/// Number of 32-bit words in the mix.
const MIX_WORDS: usize = 32;

/// Number of 32-bit words in the keccak-512 seed.
const SEED_WORDS: usize = 16;

/// Result of a hashimoto run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashimotoOutput {
    /// Compressed mix, which a valid header carries as its `mix_hash`.
    pub mix_digest: Buf32,

    /// Final PoW value, compared against the difficulty target.
    pub result: Buf32,
}

/// Ethash's non-associative mixing function.
pub const fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(FNV_PRIME) ^ b
}

/// Runs hashimoto over a dataset of `pages` pages.
///
/// `lookup` is called once per access with the access index and the page index it reads, and
/// returns that page (failing if the caller cannot produce or authenticate it).
pub fn hashimoto<E>(
    seal_hash: &Buf32,
    nonce: u64,
    pages: u64,
    accesses: usize,
    mut lookup: impl FnMut(usize, u64) -> Result<DatasetPage, E>,
) -> Result<HashimotoOutput, E> {
    let seed = keccak512([seal_hash.as_ref(), &nonce.to_le_bytes()[..]].concat());
    let seed_words: [u32; SEED_WORDS] = std::array::from_fn(|i| {
        u32::from_le_bytes([seed[4 * i], seed[4 * i + 1], seed[4 * i + 2], seed[4 * i + 3]])
    });
    let seed_head = seed_words[0];

    let mut mix: [u32; MIX_WORDS] = std::array::from_fn(|i| seed_words[i % SEED_WORDS]);

    for access in 0..accesses {
        let index = u64::from(fnv(access as u32 ^ seed_head, mix[access % MIX_WORDS])) % pages;
        let page = lookup(access, index)?;
        for (word, item) in mix.iter_mut().zip(page) {
            *word = fnv(*word, item);
        }
    }

    let mut digest = [0u8; 32];
    for (chunk, words) in digest.chunks_exact_mut(4).zip(mix.chunks_exact(4)) {
        let folded = fnv(fnv(fnv(words[0], words[1]), words[2]), words[3]);
        chunk.copy_from_slice(&folded.to_le_bytes());
    }

    let result = keccak256_concat([&seed[..], &digest[..]]);

    Ok(HashimotoOutput {
        mix_digest: Buf32(digest),
        result,
    })
}

/// Returns `true` if `result` meets the target for `difficulty`, i.e. `result <= 2^256 /
/// difficulty`.
///
/// A zero difficulty never meets the target.
pub fn meets_target(result: &Buf32, difficulty: &U256) -> bool {
    if *difficulty == U256::ZERO {
        return false;
    }

    // floor(2^256 / d) without representing 2^256; d = 1 saturates at the largest value
    let mut target = U256::MAX / *difficulty;
    if U256::MAX % *difficulty == *difficulty - U256::ONE {
        target = target.saturating_add(U256::ONE);
    }

    U256::from_be_bytes(result.0) <= target
}
