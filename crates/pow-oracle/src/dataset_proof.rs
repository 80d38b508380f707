//! Merkle branches authenticating dataset pages against a committed epoch root.

use ethrelay_primitives::{
    buf::Buf32,
    keccak::{keccak256, keccak256_concat},
};
use serde::{Deserialize, Serialize};

use crate::witness::DatasetPage;

/// A Merkle branch for a single dataset page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetProof {
    /// The 0-based index of the page within the dataset.
    position: u64,

    /// The sibling hashes from the leaf level up to (but excluding) the root.
    cohashes: Vec<Buf32>,
}

impl DatasetProof {
    /// Creates a new page branch.
    pub const fn new(position: u64, cohashes: Vec<Buf32>) -> Self {
        Self { position, cohashes }
    }

    /// Returns the sibling hashes of this branch.
    pub fn cohashes(&self) -> &[Buf32] {
        &self.cohashes
    }

    /// Returns the 0-based index of the page this branch is for.
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Computes the root implied by `page` and this branch.
    pub fn compute_root(&self, page: &DatasetPage) -> Buf32 {
        let mut cur_hash = page_leaf(page);

        let mut pos = self.position;
        for cohash in &self.cohashes {
            cur_hash = if pos & 1 == 0 {
                hash_pair(&cur_hash, cohash)
            } else {
                hash_pair(cohash, &cur_hash)
            };
            pos >>= 1;
        }

        cur_hash
    }

    /// Verifies `page` against the committed dataset `root`.
    pub fn verify(&self, page: &DatasetPage, root: Buf32) -> bool {
        self.compute_root(page) == root
    }
}

/// Hashes a page into its Merkle leaf.
pub fn page_leaf(page: &DatasetPage) -> Buf32 {
    let mut bytes = [0u8; 128];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(page) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    keccak256(bytes)
}

/// Hashes two sibling nodes into their parent.
pub(crate) fn hash_pair(left: &Buf32, right: &Buf32) -> Buf32 {
    keccak256_concat([left.as_ref(), right.as_ref()])
}

/// Builds every level of the Merkle tree over `leaves`, from the leaves up to the root.
///
/// An odd node at the end of a level is paired with itself.
pub(crate) fn build_levels(leaves: Vec<Buf32>) -> Vec<Vec<Buf32>> {
    let mut levels = vec![leaves];
    loop {
        let prev = &levels[levels.len() - 1];
        if prev.len() <= 1 {
            break;
        }

        let next = prev
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();
        levels.push(next);
    }
    levels
}

/// Extracts the branch for the leaf at `index` from the `levels` built by [`build_levels`].
pub(crate) fn branch(levels: &[Vec<Buf32>], index: u64) -> DatasetProof {
    let mut cohashes = Vec::with_capacity(levels.len().saturating_sub(1));
    let mut pos = index as usize;
    for level in &levels[..levels.len().saturating_sub(1)] {
        let sibling = pos ^ 1;
        cohashes.push(*level.get(sibling).unwrap_or(&level[pos]));
        pos >>= 1;
    }
    DatasetProof::new(index, cohashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(n: u32) -> Vec<DatasetPage> {
        (0..n).map(|i| [i.wrapping_mul(0x9e37_79b9); 32]).collect()
    }

    fn tree(pages: &[DatasetPage]) -> Vec<Vec<Buf32>> {
        build_levels(pages.iter().map(page_leaf).collect())
    }

    #[test]
    fn test_every_branch_verifies() {
        for n in [1, 2, 3, 5, 8, 13] {
            let pages = pages(n);
            let levels = tree(&pages);
            let root = levels.last().unwrap()[0];

            for (i, page) in pages.iter().enumerate() {
                let proof = branch(&levels, i as u64);
                assert!(proof.verify(page, root), "page {i} of {n}");
            }
        }
    }

    #[test]
    fn test_single_page_root_is_leaf() {
        let pages = pages(1);
        let levels = tree(&pages);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0][0], page_leaf(&pages[0]));
        assert!(branch(&levels, 0).cohashes().is_empty());
    }

    #[test]
    fn test_wrong_page_or_position_fails() {
        let pages = pages(8);
        let levels = tree(&pages);
        let root = levels.last().unwrap()[0];

        let proof = branch(&levels, 3);
        assert!(!proof.verify(&pages[4], root));

        let moved = DatasetProof::new(2, proof.cohashes().to_vec());
        assert!(!moved.verify(&pages[3], root));
    }
}
