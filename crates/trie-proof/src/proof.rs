//! Inclusion proof verification.

use std::marker::PhantomData;

use ethrelay_primitives::{buf::Buf32, header::Header, keccak::keccak256};
use rlp::{DecoderError, Rlp};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    errors::ProofError,
    nibbles::{decode_compact, to_nibbles},
};

/// Number of items in a branch node: 16 children and a value slot.
const BRANCH_ITEMS: usize = 17;

/// Number of items in a leaf or extension node.
const SHORT_ITEMS: usize = 2;

/// Length of a hashed child reference.
const HASH_REF_LEN: usize = 32;

/// A reference from a node (or the header) to the next node on the path.
#[derive(Debug, Clone, Copy)]
enum NodeRef<'a> {
    /// The next node is the next entry of the proof and must hash to this value.
    Hash(Buf32),

    /// The next node is shorter than a hash and embedded in its parent.
    Inline(&'a [u8]),
}

/// Verifies that `value` is stored under `key` in the trie with root `root`.
///
/// `nodes` are the RLP-encoded trie nodes on the path from the root to the node holding the
/// value, in order. Nodes shorter than 32 bytes that their parent embeds are not part of the list.
pub fn verify_inclusion(
    root: Buf32,
    key: &[u8],
    value: &[u8],
    nodes: &[Vec<u8>],
) -> Result<(), ProofError> {
    let path = to_nibbles(key);
    let mut cursor = 0;
    let mut consumed = 0;
    let mut next = NodeRef::Hash(root);
    let mut depth = 0;

    loop {
        let malformed = move |e: DecoderError| ProofError::malformed(depth, e);

        let raw: &[u8] = match next {
            NodeRef::Hash(expected) => {
                let node = nodes.get(consumed).ok_or(ProofError::Incomplete(consumed))?;
                consumed += 1;
                if keccak256(node) != expected {
                    return Err(ProofError::HashMismatch { depth, expected });
                }
                node.as_slice()
            }
            NodeRef::Inline(raw) => raw,
        };

        let node = Rlp::new(raw);
        let count = node.item_count().map_err(malformed)?;
        trace!(depth, items = count, nibble = cursor, "walking trie node");

        match count {
            BRANCH_ITEMS => {
                let Some(&nibble) = path.get(cursor) else {
                    let stored = node.at(16).and_then(|v| v.data()).map_err(malformed)?;
                    return finish(stored, value, nodes.len() - consumed);
                };

                let child = node.at(nibble as usize).map_err(malformed)?;
                next = child_ref(&child)
                    .map_err(malformed)?
                    .ok_or(ProofError::PathDiverges(cursor))?;
                cursor += 1;
            }
            SHORT_ITEMS => {
                let encoded = node.at(0).and_then(|v| v.data()).map_err(malformed)?;
                let compact = decode_compact(encoded).ok_or_else(|| ProofError::MalformedNode {
                    depth,
                    reason: "invalid hex-prefix path".to_string(),
                })?;

                if !path[cursor..].starts_with(&compact.nibbles) {
                    return Err(ProofError::PathDiverges(cursor));
                }
                cursor += compact.nibbles.len();

                if compact.is_leaf {
                    if cursor != path.len() {
                        return Err(ProofError::PathDiverges(cursor));
                    }
                    let stored = node.at(1).and_then(|v| v.data()).map_err(malformed)?;
                    return finish(stored, value, nodes.len() - consumed);
                }

                let child = node.at(1).map_err(malformed)?;
                next = child_ref(&child)
                    .map_err(malformed)?
                    .ok_or(ProofError::PathDiverges(cursor))?;
            }
            other => {
                return Err(ProofError::MalformedNode {
                    depth,
                    reason: format!("node has {other} items"),
                });
            }
        }

        depth += 1;
    }
}

fn child_ref<'a>(item: &Rlp<'a>) -> Result<Option<NodeRef<'a>>, DecoderError> {
    if item.is_list() {
        return Ok(Some(NodeRef::Inline(item.as_raw())));
    }

    let data = item.data()?;
    match data.len() {
        0 => Ok(None),
        HASH_REF_LEN => Ok(Buf32::from_slice(data).map(NodeRef::Hash)),
        _ => Err(DecoderError::RlpInvalidLength),
    }
}

fn finish(stored: &[u8], value: &[u8], unused: usize) -> Result<(), ProofError> {
    if stored != value {
        return Err(ProofError::ValueMismatch);
    }
    if unused > 0 {
        return Err(ProofError::TrailingNodes(unused));
    }

    Ok(())
}

/// Selects which trie root of a [`Header`] a proof is checked against.
///
/// This is implemented by marker types so that transaction and receipt proofs share the
/// verification logic but cannot be mixed up.
pub trait TrieRoot {
    /// Human-readable name of the trie, used in logs.
    const NAME: &'static str;

    /// Returns the root of this trie committed to by `header`.
    fn root(header: &Header) -> Buf32;
}

/// Marker for the transactions trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionsTrie;

/// Marker for the receipts trie.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptsTrie;

impl TrieRoot for TransactionsTrie {
    const NAME: &'static str = "transactions";

    fn root(header: &Header) -> Buf32 {
        header.transactions_root
    }
}

impl TrieRoot for ReceiptsTrie {
    const NAME: &'static str = "receipts";

    fn root(header: &Header) -> Buf32 {
        header.receipts_root
    }
}

/// An inclusion proof for one of a header's tries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MptProof<T> {
    /// The trie key, e.g. the RLP-encoded index of a transaction within its block.
    #[serde(with = "hex::serde")]
    key: Vec<u8>,

    /// RLP-encoded nodes from the root to the value.
    nodes: Vec<Vec<u8>>,

    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> MptProof<T> {
    /// Creates a proof for `key` from its path nodes.
    pub const fn new(key: Vec<u8>, nodes: Vec<Vec<u8>>) -> Self {
        Self {
            key,
            nodes,
            _marker: PhantomData,
        }
    }

    /// Creates a proof for the entry at `index` of a block's transaction or receipt list; such
    /// tries are keyed by the RLP encoding of the index.
    pub fn for_index(index: u64, nodes: Vec<Vec<u8>>) -> Self {
        Self::new(rlp::encode(&index).to_vec(), nodes)
    }

    /// Creates a proof from the nodes packed as a single RLP list.
    pub fn from_rlp_node_list(key: Vec<u8>, encoded: &[u8]) -> Result<Self, ProofError> {
        let list = Rlp::new(encoded);
        if !list.is_list() {
            return Err(ProofError::MalformedNode {
                depth: 0,
                reason: "node list is not an rlp list".to_string(),
            });
        }

        let nodes = list.iter().map(|node| node.as_raw().to_vec()).collect();

        Ok(Self::new(key, nodes))
    }

    /// Returns the trie key.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Returns the path nodes.
    pub fn nodes(&self) -> &[Vec<u8>] {
        &self.nodes
    }
}

impl<T: TrieRoot> MptProof<T> {
    /// Verifies that `value` is included in the trie of `header` selected by `T`.
    pub fn verify(&self, header: &Header, value: &[u8]) -> Result<(), ProofError> {
        let root = T::root(header);
        let res = verify_inclusion(root, &self.key, value, &self.nodes);
        trace!(trie = T::NAME, %root, ok = res.is_ok(), "checked inclusion proof");

        res
    }
}

/// Proof of a transaction's inclusion in a header's transactions trie.
pub type TransactionProof = MptProof<TransactionsTrie>;

/// Proof of a receipt's inclusion in a header's receipts trie.
pub type ReceiptProof = MptProof<ReceiptsTrie>;

#[cfg(test)]
mod tests {
    use ethrelay_primitives::header::EMPTY_TRIE_ROOT;
    use ethrelay_test_utils::trie::TestTrie;

    use super::*;

    fn puppy_trie() -> TestTrie {
        TestTrie::from_entries([
            (b"do".to_vec(), b"verb".to_vec()),
            (b"horse".to_vec(), b"stallion".to_vec()),
            (b"doge".to_vec(), b"coin".to_vec()),
            (b"dog".to_vec(), b"puppy".to_vec()),
        ])
    }

    #[test]
    fn test_known_root() {
        assert_eq!(
            puppy_trie().root().to_string(),
            "0x5991bb8c6514148a29db676a14ac506cd2cd5775ace63c30a4fe457715e9ac84"
        );
        assert_eq!(TestTrie::default().root(), EMPTY_TRIE_ROOT);
    }

    #[test]
    fn test_verify_every_entry() {
        let trie = puppy_trie();
        for (key, value) in trie.entries() {
            let nodes = trie.proof(key);
            assert_eq!(verify_inclusion(trie.root(), key, value, &nodes), Ok(()), "key {key:?}");
        }
    }

    #[test]
    fn test_value_stored_in_branch() {
        // "do" is a prefix of "dog", so its value lives in a branch value slot
        let trie = puppy_trie();
        let nodes = trie.proof(b"do");
        assert!(verify_inclusion(trie.root(), b"do", b"verb", &nodes).is_ok());
        assert_eq!(
            verify_inclusion(trie.root(), b"do", b"noun", &nodes),
            Err(ProofError::ValueMismatch)
        );
    }

    #[test]
    fn test_wrong_value_is_rejected() {
        let trie = puppy_trie();
        let nodes = trie.proof(b"horse");
        assert_eq!(
            verify_inclusion(trie.root(), b"horse", b"pony", &nodes),
            Err(ProofError::ValueMismatch)
        );
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let trie = puppy_trie();
        let nodes = trie.proof(b"dog");
        let root = Buf32([7; 32]);
        assert_eq!(
            verify_inclusion(root, b"dog", b"puppy", &nodes),
            Err(ProofError::HashMismatch { depth: 0, expected: root })
        );
    }

    #[test]
    fn test_tampered_node_is_rejected() {
        let trie = puppy_trie();
        let mut nodes = trie.proof(b"horse");
        let last = nodes.len() - 1;
        let byte = nodes[last].len() - 1;
        nodes[last][byte] ^= 1;

        assert!(matches!(
            verify_inclusion(trie.root(), b"horse", b"stallion", &nodes),
            Err(ProofError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_and_padded_proofs() {
        let trie = puppy_trie();
        let mut nodes = trie.proof(b"horse");
        let full = nodes.len();

        nodes.push(nodes[0].clone());
        assert_eq!(
            verify_inclusion(trie.root(), b"horse", b"stallion", &nodes),
            Err(ProofError::TrailingNodes(1))
        );

        nodes.truncate(full - 1);
        assert_eq!(
            verify_inclusion(trie.root(), b"horse", b"stallion", &nodes),
            Err(ProofError::Incomplete(full - 1))
        );
    }

    #[test]
    fn test_absent_key() {
        let trie = puppy_trie();
        let nodes = trie.proof(b"dog");
        assert!(matches!(
            verify_inclusion(trie.root(), b"cat", b"meow", &nodes),
            Err(ProofError::PathDiverges(_))
        ));
    }

    #[test]
    fn test_transaction_proof_against_header() {
        let txs: Vec<Vec<u8>> = (0u8..20).map(|i| vec![0xf8, i, i, i]).collect();
        let trie = TestTrie::from_indexed(&txs);
        let header = Header {
            transactions_root: trie.root(),
            ..Default::default()
        };

        for (i, tx) in txs.iter().enumerate() {
            let key = rlp::encode(&(i as u64)).to_vec();
            let proof = TransactionProof::for_index(i as u64, trie.proof(&key));
            assert!(proof.verify(&header, tx).is_ok(), "tx {i}");
        }

        // the same proof says nothing about the receipts trie
        let key = rlp::encode(&3u64).to_vec();
        let receipt = ReceiptProof::for_index(3, trie.proof(&key));
        assert!(receipt.verify(&header, &txs[3]).is_err());
    }

    #[test]
    fn test_from_rlp_node_list() {
        let trie = puppy_trie();
        let nodes = trie.proof(b"doge");

        let mut stream = rlp::RlpStream::new_list(nodes.len());
        for node in &nodes {
            stream.append_raw(node, 1);
        }
        let packed = stream.out().to_vec();

        let proof = TransactionProof::from_rlp_node_list(b"doge".to_vec(), &packed).unwrap();
        assert_eq!(proof.nodes(), nodes.as_slice());
        assert_eq!(proof.key(), b"doge");

        assert!(TransactionProof::from_rlp_node_list(vec![], &hex::decode("8401020304").unwrap())
            .is_err());
    }
}
