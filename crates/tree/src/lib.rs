//! Merkledrop Tree
//!
//! Canonical binary hash tree over claim leaf encodings. Layer 0 is the
//! deduplicated, ascending-sorted keccak-256 digests of the leaves; each
//! parent hashes the byte-wise sorted concatenation of its children, so a
//! verifier walking a proof needs only sibling values, no positional
//! information. An odd trailing element carries up unchanged.

use std::collections::HashMap;

use merkledrop_core::keccak256;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Cannot build a tree over zero leaves")]
    EmptyTree,
    #[error("Leaf not found in tree: {0}")]
    LeafNotFound(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;

/// Hash a node pair, sorting the operands first so the parent is
/// independent of left/right order.
fn pair_hash(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    if a <= b {
        buf[..32].copy_from_slice(a);
        buf[32..].copy_from_slice(b);
    } else {
        buf[..32].copy_from_slice(b);
        buf[32..].copy_from_slice(a);
    }
    keccak256(&buf)
}

/// An immutable Merkle tree. All layers are retained so proofs are a
/// single map lookup plus an `O(log n)` walk.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<[u8; 32]>>,
    positions: HashMap<[u8; 32], usize>,
}

impl MerkleTree {
    /// Build a tree over packed-but-unhashed leaf encodings.
    ///
    /// Leaf content is hashed here, exactly once. Duplicate digests merge
    /// into one layer-0 element.
    pub fn build<E: AsRef<[u8]>>(leaf_encodings: &[E]) -> Result<Self> {
        if leaf_encodings.is_empty() {
            return Err(TreeError::EmptyTree);
        }

        let mut layer: Vec<[u8; 32]> = leaf_encodings
            .iter()
            .map(|encoding| keccak256(encoding.as_ref()))
            .collect();
        layer.sort_unstable();
        layer.dedup();

        let positions = layer
            .iter()
            .enumerate()
            .map(|(i, digest)| (*digest, i))
            .collect();

        let mut layers = vec![layer];
        while layers[layers.len() - 1].len() > 1 {
            let current = &layers[layers.len() - 1];
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for chunk in current.chunks(2) {
                if chunk.len() == 2 {
                    next.push(pair_hash(&chunk[0], &chunk[1]));
                } else {
                    // odd trailing element carries up unchanged
                    next.push(chunk[0]);
                }
            }
            layers.push(next);
        }

        Ok(Self { layers, positions })
    }

    /// The root digest.
    pub fn root(&self) -> [u8; 32] {
        // build() guarantees a final single-element layer
        self.layers[self.layers.len() - 1][0]
    }

    /// Number of distinct leaves in layer 0.
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Inclusion proof for a leaf encoding: the ordered sibling digests
    /// from layer 0 up to (excluding) the root layer. A carried-up element
    /// contributes no sibling at that layer.
    pub fn proof<E: AsRef<[u8]>>(&self, leaf_encoding: E) -> Result<Vec<[u8; 32]>> {
        let digest = keccak256(leaf_encoding.as_ref());
        let mut index = *self
            .positions
            .get(&digest)
            .ok_or_else(|| TreeError::LeafNotFound(hex::encode(digest)))?;

        let mut proof = Vec::new();
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = index ^ 1;
            if sibling < layer.len() {
                proof.push(layer[sibling]);
            }
            index /= 2;
        }
        Ok(proof)
    }
}

/// Recompute the root from a leaf encoding and its proof.
///
/// This is the walk the on-chain verifier runs: hash the leaf, then fold
/// in each sibling with the order-independent pair hash.
pub fn verify_proof<E: AsRef<[u8]>>(root: &[u8; 32], leaf_encoding: E, proof: &[[u8; 32]]) -> bool {
    let mut node = keccak256(leaf_encoding.as_ref());
    for sibling in proof {
        node = pair_hash(&node, sibling);
    }
    node == *root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encodings(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| format!("leaf-{i}").into_bytes()).collect()
    }

    #[test]
    fn test_empty_build_rejected() {
        let none: Vec<Vec<u8>> = vec![];
        assert!(matches!(MerkleTree::build(&none), Err(TreeError::EmptyTree)));
    }

    #[test]
    fn test_single_leaf_root_is_leaf_digest() {
        let leaves = encodings(1);
        let tree = MerkleTree::build(&leaves).unwrap();
        assert_eq!(tree.root(), keccak256(&leaves[0]));
        assert_eq!(tree.proof(&leaves[0]).unwrap(), Vec::<[u8; 32]>::new());
    }

    #[test]
    fn test_two_leaves_pair_hash() {
        let leaves = encodings(2);
        let tree = MerkleTree::build(&leaves).unwrap();
        let expected = pair_hash(&keccak256(&leaves[0]), &keccak256(&leaves[1]));
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn test_proof_soundness() {
        for n in [1usize, 2, 3, 5, 17] {
            let leaves = encodings(n);
            let tree = MerkleTree::build(&leaves).unwrap();
            let root = tree.root();
            for leaf in &leaves {
                let proof = tree.proof(leaf).unwrap();
                assert!(verify_proof(&root, leaf, &proof), "n={n} leaf failed");
            }
        }
    }

    #[test]
    fn test_odd_layer_carry() {
        // Three leaves: layers are 3 -> 2 -> 1. The carried-up element
        // skips its missing sibling, so its proof has one digest while the
        // paired elements have two.
        let leaves = encodings(3);
        let tree = MerkleTree::build(&leaves).unwrap();
        let root = tree.root();

        let mut lengths: Vec<usize> = leaves
            .iter()
            .map(|leaf| tree.proof(leaf).unwrap().len())
            .collect();
        lengths.sort_unstable();
        assert_eq!(lengths, vec![1, 2, 2]);

        for leaf in &leaves {
            let proof = tree.proof(leaf).unwrap();
            assert!(verify_proof(&root, leaf, &proof));
        }
    }

    #[test]
    fn test_root_independent_of_input_order() {
        let mut leaves = encodings(7);
        let tree_a = MerkleTree::build(&leaves).unwrap();
        leaves.reverse();
        let tree_b = MerkleTree::build(&leaves).unwrap();
        assert_eq!(tree_a.root(), tree_b.root());
    }

    #[test]
    fn test_duplicate_leaves_merge() {
        let leaves = vec![b"same".to_vec(), b"same".to_vec(), b"other".to_vec()];
        let tree = MerkleTree::build(&leaves).unwrap();
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_unknown_leaf_rejected() {
        let leaves = encodings(4);
        let tree = MerkleTree::build(&leaves).unwrap();
        assert!(matches!(
            tree.proof(b"not-a-leaf"),
            Err(TreeError::LeafNotFound(_))
        ));
    }

    #[test]
    fn test_bad_proof_fails_verification() {
        let leaves = encodings(5);
        let tree = MerkleTree::build(&leaves).unwrap();
        let root = tree.root();
        let mut proof = tree.proof(&leaves[0]).unwrap();
        proof[0][0] ^= 0xff;
        assert!(!verify_proof(&root, &leaves[0], &proof));
    }

    #[test]
    fn test_deterministic() {
        let leaves = encodings(17);
        let tree_a = MerkleTree::build(&leaves).unwrap();
        let tree_b = MerkleTree::build(&leaves).unwrap();
        assert_eq!(tree_a.root(), tree_b.root());
        for leaf in &leaves {
            assert_eq!(tree_a.proof(leaf).unwrap(), tree_b.proof(leaf).unwrap());
        }
    }
}
