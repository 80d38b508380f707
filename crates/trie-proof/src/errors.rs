//! Errors produced while checking an inclusion proof.

use ethrelay_primitives::buf::Buf32;
use rlp::DecoderError;
use thiserror::Error;

/// Reasons an inclusion proof does not establish the claimed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    /// A node in the proof is not valid RLP or has an unexpected shape.
    #[error("malformed trie node at depth {depth}: {reason}")]
    MalformedNode {
        /// Index of the node along the path.
        depth: usize,

        /// What was wrong with it.
        reason: String,
    },

    /// A node does not hash to the reference held by its parent (or the root).
    #[error("node at depth {depth} does not match expected hash {expected}")]
    HashMismatch {
        /// Index of the node along the path.
        depth: usize,

        /// The hash the node was expected to have.
        expected: Buf32,
    },

    /// The proof ran out of nodes before reaching a leaf.
    #[error("proof ended after {0} nodes without reaching the value")]
    Incomplete(usize),

    /// The key leads away from the nodes supplied, i.e. the key is absent from the trie.
    #[error("key diverges from the trie at nibble {0}")]
    PathDiverges(usize),

    /// The path resolves, but to a different value.
    #[error("value stored under the key differs from the claimed value")]
    ValueMismatch,

    /// The proof carries nodes past the one that resolved the key.
    #[error("{0} unused trailing nodes in proof")]
    TrailingNodes(usize),
}

impl ProofError {
    pub(crate) fn malformed(depth: usize, err: DecoderError) -> Self {
        Self::MalformedNode {
            depth,
            reason: err.to_string(),
        }
    }
}
