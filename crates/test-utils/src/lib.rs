//! Fixtures shared by the relay crates' tests.

pub mod arbitrary_generator;
pub mod chain;
pub mod pow;
pub mod trie;
