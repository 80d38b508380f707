//! This crate contains the general types and pure functions that are shared across the relay
//! crates: fixed-size hashes and identities, the source-chain block [`Header`](header::Header)
//! with its canonical RLP codec, and the keccak hashing helpers.
//!
//! Note that this crate lies at the bottom of the crate-hierarchy in this workspace i.e., it does
//! not depend on any other crate in this workspace.

pub mod buf;
pub mod errors;
pub mod header;
pub mod keccak;
pub mod serde_u256;
pub mod uint;
