//! Script-tree Merkle commitment and proof construction (BIP341)
//!
//! Builds the binary tree over TapLeafHashes, yielding the merkle root the
//! output key commits to and, per leaf, the ordered sibling-hash path a
//! control block reveals at spend time. TapBranch sorts its two children
//! lexicographically before hashing, so the root is independent of which
//! child was inserted first.

use crate::error::{Result, TaprootError};
use crate::script::LeafScript;
use crate::tagged_hash::{tagged_hash_parts, TAG_TAP_BRANCH};
use crate::types::{Hash, MerkleProof};
use serde::{Deserialize, Serialize};

/// One node of an explicit (bracketed) tree shape
///
/// Leaf positions refer to indices into the leaf list handed to
/// [`build_tree`]; the shape is validated structurally at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeNode {
    Leaf(usize),
    Branch(Box<ShapeNode>, Box<ShapeNode>),
}

/// How the flat leaf list pairs into a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeShape {
    /// Pair adjacent leaves level by level; a trailing odd node carries up
    Balanced,
    /// Pair exactly as bracketed, permitting unbalanced trees
    Explicit(ShapeNode),
}

/// Result of committing to a leaf set: the root plus one proof per leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapTree {
    merkle_root: Option<Hash>,
    proofs: Vec<MerkleProof>,
}

impl TapTree {
    /// The committed root; `None` for an empty tree (key-path only)
    pub fn merkle_root(&self) -> Option<Hash> {
        self.merkle_root
    }

    /// Number of leaves committed
    pub fn leaf_count(&self) -> usize {
        self.proofs.len()
    }

    /// Sibling-hash path for one leaf, immediate sibling first
    pub fn proof(&self, leaf_index: usize) -> Result<&MerkleProof> {
        self.proofs
            .get(leaf_index)
            .ok_or(TaprootError::LeafIndexOutOfRange {
                index: leaf_index,
                leaf_count: self.proofs.len(),
            })
    }
}

/// TapBranchHash of two child hashes, sorted lexicographically first
pub fn tap_branch_hash(a: &Hash, b: &Hash) -> Hash {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    tagged_hash_parts(TAG_TAP_BRANCH, &[left, right])
}

/// Fold a leaf hash up through a merkle proof to the candidate root
pub fn fold_proof(leaf_hash: &Hash, proof: &[Hash]) -> Hash {
    let mut node = *leaf_hash;
    for sibling in proof {
        node = tap_branch_hash(&node, sibling);
    }
    node
}

/// Build the merkle commitment over `leaves` paired according to `shape`
///
/// Zero leaves yield a rootless tree (key-path-only commitment). A single
/// leaf is its own root with an empty proof. Fails with `InvalidTreeShape`
/// if an explicit shape does not reference every leaf index exactly once.
pub fn build_tree(leaves: &[LeafScript], shape: &TreeShape) -> Result<TapTree> {
    if leaves.is_empty() {
        if let TreeShape::Explicit(_) = shape {
            return Err(TaprootError::InvalidTreeShape(
                "explicit shape given for an empty leaf set".into(),
            ));
        }
        return Ok(TapTree {
            merkle_root: None,
            proofs: Vec::new(),
        });
    }

    let root = match shape {
        TreeShape::Balanced => build_balanced(leaves),
        TreeShape::Explicit(node) => {
            let mut seen = vec![false; leaves.len()];
            let subtree = build_explicit(node, leaves, &mut seen)?;
            if seen.iter().any(|used| !used) {
                return Err(TaprootError::InvalidTreeShape(
                    "shape does not reference every leaf".into(),
                ));
            }
            subtree
        }
    };

    // Re-order proofs from shape order to leaf-index order
    let mut proofs = vec![MerkleProof::new(); leaves.len()];
    for (index, proof) in root.proofs {
        proofs[index] = proof;
    }

    Ok(TapTree {
        merkle_root: Some(root.hash),
        proofs,
    })
}

struct Subtree {
    hash: Hash,
    proofs: Vec<(usize, MerkleProof)>,
}

fn leaf_subtree(index: usize, leaf: &LeafScript) -> Subtree {
    Subtree {
        hash: leaf.tap_leaf_hash(),
        proofs: vec![(index, MerkleProof::new())],
    }
}

fn join(mut a: Subtree, mut b: Subtree) -> Subtree {
    // Each leaf under one child gains the other child's hash as the next
    // root-ward proof element
    for (_, proof) in &mut a.proofs {
        proof.push(b.hash);
    }
    for (_, proof) in &mut b.proofs {
        proof.push(a.hash);
    }
    let hash = tap_branch_hash(&a.hash, &b.hash);
    let mut proofs = a.proofs;
    proofs.append(&mut b.proofs);
    Subtree { hash, proofs }
}

fn build_balanced(leaves: &[LeafScript]) -> Subtree {
    let mut level: Vec<Subtree> = leaves
        .iter()
        .enumerate()
        .map(|(i, leaf)| leaf_subtree(i, leaf))
        .collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut nodes = level.into_iter();
        while let Some(a) = nodes.next() {
            match nodes.next() {
                Some(b) => next.push(join(a, b)),
                None => next.push(a),
            }
        }
        level = next;
    }

    level.remove(0)
}

fn build_explicit(node: &ShapeNode, leaves: &[LeafScript], seen: &mut [bool]) -> Result<Subtree> {
    match node {
        ShapeNode::Leaf(index) => {
            let leaf = leaves
                .get(*index)
                .ok_or(TaprootError::InvalidTreeShape(
                    "shape references a leaf index past the leaf list".into(),
                ))?;
            if seen[*index] {
                return Err(TaprootError::InvalidTreeShape(
                    "shape references a leaf twice".into(),
                ));
            }
            seen[*index] = true;
            Ok(leaf_subtree(*index, leaf))
        }
        ShapeNode::Branch(left, right) => {
            let l = build_explicit(left, leaves, seen)?;
            let r = build_explicit(right, leaves, seen)?;
            Ok(join(l, r))
        }
    }
}
