//! Module to generate arbitrary values for testing.

use arbitrary::{Arbitrary, Unstructured};
use ethrelay_primitives::buf::{Address, Buf32};
use proptest::prelude::*;
use rand::{rngs::OsRng, CryptoRng, RngCore};

/// The default buffer size for the `ArbitraryGenerator`.
const ARB_GEN_LEN: usize = 1024;

/// A generator for producing arbitrary data based on a persistent buffer.
#[derive(Debug)]
pub struct ArbitraryGenerator {
    /// Persistent buffer
    buf: Vec<u8>,
}

impl Default for ArbitraryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitraryGenerator {
    /// Creates a new `ArbitraryGenerator` with a default buffer size.
    pub fn new() -> Self {
        Self::new_with_size(ARB_GEN_LEN)
    }

    /// Creates a new `ArbitraryGenerator` with a buffer of `s` bytes.
    pub fn new_with_size(s: usize) -> Self {
        Self { buf: vec![0u8; s] }
    }

    /// Generates an arbitrary instance of type `T` using the default RNG, [`OsRng`].
    pub fn generate<'a, T>(&'a mut self) -> T
    where
        T: Arbitrary<'a> + Clone,
    {
        self.generate_with_rng::<T, OsRng>(&mut OsRng)
    }

    /// Generates an arbitrary instance of type `T` from the bytes `rng` produces.
    pub fn generate_with_rng<'a, T, R>(&'a mut self, rng: &mut R) -> T
    where
        T: Arbitrary<'a> + Clone,
        R: RngCore + CryptoRng,
    {
        rng.fill_bytes(&mut self.buf);
        let mut u = Unstructured::new(&self.buf);
        T::arbitrary(&mut u).expect("Failed to generate arbitrary instance")
    }
}

/// Generates an arbitrary [`Buf32`].
pub fn arb_buf32() -> impl Strategy<Value = Buf32> {
    any::<[u8; 32]>().prop_map(Buf32)
}

/// Generates an arbitrary [`Address`].
pub fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address)
}

/// Generates `n` distinct arbitrary addresses.
pub fn distinct_addresses(n: usize) -> Vec<Address> {
    let mut generator = ArbitraryGenerator::new();
    let mut out: Vec<Address> = Vec::with_capacity(n);
    while out.len() < n {
        let candidate: Address = generator.generate();
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}
