//! Keccak hashing helpers.
//!
//! These are the original Keccak variants (pre-NIST padding) used by the source chain, not
//! SHA3-256/512.

use sha3::{Digest, Keccak256, Keccak512};

use crate::buf::Buf32;

/// Computes the keccak-256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> Buf32 {
    Buf32(Keccak256::digest(data.as_ref()).into())
}

/// Computes the keccak-256 digest over the concatenation of `parts`.
pub fn keccak256_concat<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Buf32 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    Buf32(hasher.finalize().into())
}

/// Computes the keccak-512 digest of `data`.
pub fn keccak512(data: impl AsRef<[u8]>) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Keccak512::digest(data.as_ref()));
    out
}
