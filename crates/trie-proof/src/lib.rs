//! Merkle-Patricia trie inclusion proofs.
//!
//! The relay does not store any trie data. A verifier supplies the trie nodes on the path from a
//! header's transactions or receipts root to the leaf holding the value, and this crate checks
//! that the nodes hash-link up to the root and that the path resolves to exactly that value.

pub mod errors;
mod nibbles;
pub mod proof;

pub use errors::ProofError;
pub use proof::{
    verify_inclusion, MptProof, ReceiptProof, ReceiptsTrie, TransactionProof, TransactionsTrie,
    TrieRoot,
};
