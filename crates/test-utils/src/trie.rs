//! An in-memory Merkle Patricia trie that produces roots and inclusion proofs.
//!
//! This is a from-scratch builder: every call recomputes the whole trie from the sorted entries.
//! It is meant for fixtures with a handful of entries, not for anything that needs to be fast.

use std::collections::BTreeMap;

use ethrelay_primitives::{buf::Buf32, keccak::keccak256};
use rlp::RlpStream;

/// Child references shorter than this are embedded in their parent instead of hashed.
const HASH_REF_LEN: usize = 32;

/// A key-value set and the trie built over it.
#[derive(Debug, Clone, Default)]
pub struct TestTrie {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl TestTrie {
    /// Builds a trie from key-value pairs. Later duplicates of a key win.
    pub fn from_entries(entries: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Builds a trie keyed the way a block keys its transactions and receipts: by the RLP
    /// encoding of each value's index.
    pub fn from_indexed(values: &[Vec<u8>]) -> Self {
        Self::from_entries(
            values
                .iter()
                .enumerate()
                .map(|(i, value)| (rlp::encode(&(i as u64)).to_vec(), value.clone())),
        )
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    /// Returns the entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.entries.iter()
    }

    /// Returns the root hash.
    pub fn root(&self) -> Buf32 {
        if self.entries.is_empty() {
            return keccak256(rlp::NULL_RLP);
        }

        let items = self.items();
        keccak256(encode_node(&as_slices(&items), None, &mut Vec::new()))
    }

    /// Returns the proof nodes for `key`, root first.
    ///
    /// Embedded nodes are left out. For a key that is not in the trie this still returns the
    /// nodes along the part of its path that exists.
    pub fn proof(&self, key: &[u8]) -> Vec<Vec<u8>> {
        if self.entries.is_empty() {
            return vec![rlp::NULL_RLP.to_vec()];
        }

        let items = self.items();
        let target = to_nibbles(key);
        let mut nodes = Vec::new();
        let root = encode_node(&as_slices(&items), Some(&target), &mut nodes);
        if root.len() < HASH_REF_LEN {
            nodes.push(root);
        }

        nodes.reverse();
        nodes
    }

    fn items(&self) -> Vec<(Vec<u8>, &[u8])> {
        self.entries
            .iter()
            .map(|(key, value)| (to_nibbles(key), value.as_slice()))
            .collect()
    }
}

fn as_slices<'a>(items: &'a [(Vec<u8>, &'a [u8])]) -> Vec<(&'a [u8], &'a [u8])> {
    items
        .iter()
        .map(|(path, value)| (path.as_slice(), *value))
        .collect()
}

fn to_nibbles(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().flat_map(|b| [b >> 4, b & 0x0f]).collect()
}

fn hex_prefix(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let flag = if is_leaf { 2 } else { 0 };
    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);

    let rest = if nibbles.len() % 2 == 1 {
        out.push(((flag + 1) << 4) | nibbles[0]);
        &nibbles[1..]
    } else {
        out.push(flag << 4);
        nibbles
    };
    out.extend(rest.chunks_exact(2).map(|pair| (pair[0] << 4) | pair[1]));

    out
}

/// Appends the reference to `child` to `stream`.
fn append_ref(stream: &mut RlpStream, child: &[u8]) {
    if child.len() < HASH_REF_LEN {
        stream.append_raw(child, 1);
    } else {
        stream.append(&keccak256(child));
    }
}

/// Encodes the node holding `items`, whose paths are relative to the node.
///
/// While `target` is `Some`, it is the remaining path of the key being proven, and every hashed
/// node on that path is pushed to `proof` after its children.
fn encode_node(
    items: &[(&[u8], &[u8])],
    target: Option<&[u8]>,
    proof: &mut Vec<Vec<u8>>,
) -> Vec<u8> {
    let node = if let [(path, value)] = items {
        let mut stream = RlpStream::new_list(2);
        stream.append(&hex_prefix(path, true));
        stream.append(&value.to_vec());
        stream.out().to_vec()
    } else {
        let shared = common_prefix(items);
        if shared > 0 {
            let prefix = &items[0].0[..shared];
            let child_target = target
                .filter(|t| t.starts_with(prefix))
                .map(|t| &t[shared..]);
            let rest: Vec<_> = items.iter().map(|(p, v)| (&p[shared..], *v)).collect();
            let child = encode_node(&rest, child_target, proof);

            let mut stream = RlpStream::new_list(2);
            stream.append(&hex_prefix(prefix, false));
            append_ref(&mut stream, &child);
            stream.out().to_vec()
        } else {
            let mut stream = RlpStream::new_list(17);
            for nibble in 0..16u8 {
                let slot: Vec<_> = items
                    .iter()
                    .filter(|(p, _)| p.first() == Some(&nibble))
                    .map(|(p, v)| (&p[1..], *v))
                    .collect();
                if slot.is_empty() {
                    stream.append_empty_data();
                    continue;
                }

                let child_target = target
                    .filter(|t| t.first() == Some(&nibble))
                    .map(|t| &t[1..]);
                let child = encode_node(&slot, child_target, proof);
                append_ref(&mut stream, &child);
            }

            match items.iter().find(|(p, _)| p.is_empty()) {
                Some((_, value)) => stream.append(&value.to_vec()),
                None => stream.append_empty_data(),
            };
            stream.out().to_vec()
        }
    };

    if target.is_some() && node.len() >= HASH_REF_LEN {
        proof.push(node.clone());
    }
    node
}

/// Length of the path prefix all of `items` share, stopping before any path runs out.
fn common_prefix(items: &[(&[u8], &[u8])]) -> usize {
    let shortest = items.iter().map(|(p, _)| p.len()).min().unwrap_or(0);
    (0..shortest)
        .take_while(|&i| items.iter().all(|(p, _)| p[i] == items[0].0[i]))
        .count()
}
