//! Control block construction, serialization, and verification (BIP341)
//!
//! The control block is the witness-level proof revealing a leaf's position
//! in the script tree: `(leaf_version | parity) || internal_key ||
//! merkle_path`. A verifier folds the revealed leaf up through the path and
//! recomputes the output key; the spend is valid iff it reproduces the key
//! committed on-chain.

use crate::error::{Result, TaprootError};
use crate::merkle::{build_tree, fold_proof, TreeShape};
use crate::script::{tap_leaf_hash_with_version, LeafScript, TAPROOT_LEAF_MASK};
use crate::taproot::compute_output_key;
use crate::types::{ByteString, Hash, Parity, XOnlyKeyBytes};

/// Control block base size: version/parity byte + 32-byte internal key
pub const TAPROOT_CONTROL_BASE_SIZE: usize = 33;

/// Size of one merkle-path element
pub const TAPROOT_CONTROL_NODE_SIZE: usize = 32;

/// Maximum merkle-path depth (BIP341)
pub const TAPROOT_CONTROL_MAX_NODE_COUNT: usize = 128;

/// The script-path spend proof: leaf version, output-key parity, internal
/// key, and the leaf's merkle path
///
/// Ephemeral by design: built fresh per spend attempt from the same inputs
/// that produced the commitment, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlBlock {
    pub leaf_version: u8,
    pub output_key_parity: Parity,
    pub internal_key: XOnlyKeyBytes,
    pub merkle_path: Vec<Hash>,
}

impl ControlBlock {
    /// Build the control block proving `leaf_index`'s position in the tree
    ///
    /// The leaf version is taken from the leaf being revealed. Fails with
    /// `LeafIndexOutOfRange` for an invalid position and `InvalidTreeShape`
    /// if the shape does not cover the leaf list.
    pub fn build(
        internal_key: &XOnlyKeyBytes,
        leaves: &[LeafScript],
        shape: &TreeShape,
        leaf_index: usize,
        output_key_parity: Parity,
    ) -> Result<Self> {
        let leaf = leaves
            .get(leaf_index)
            .ok_or(TaprootError::LeafIndexOutOfRange {
                index: leaf_index,
                leaf_count: leaves.len(),
            })?;
        let tree = build_tree(leaves, shape)?;
        let merkle_path = tree.proof(leaf_index)?.clone();
        if merkle_path.len() > TAPROOT_CONTROL_MAX_NODE_COUNT {
            return Err(TaprootError::InvalidControlBlock(
                "merkle path exceeds the 128-node limit".into(),
            ));
        }

        Ok(ControlBlock {
            leaf_version: leaf.version(),
            output_key_parity,
            internal_key: *internal_key,
            merkle_path,
        })
    }

    /// Serialize to the wire format: `(version | parity) || internal_key ||
    /// path...`; total length is `33 + 32 * depth`
    pub fn serialize(&self) -> ByteString {
        let parity_bit = match self.output_key_parity {
            Parity::Even => 0,
            Parity::Odd => 1,
        };
        let mut out =
            Vec::with_capacity(TAPROOT_CONTROL_BASE_SIZE + 32 * self.merkle_path.len());
        out.push(self.leaf_version | parity_bit);
        out.extend_from_slice(&self.internal_key);
        for node in &self.merkle_path {
            out.extend_from_slice(node);
        }
        out
    }

    /// Parse a serialized control block
    ///
    /// Fails with `InvalidControlBlock` unless the length is `33 + 32k`
    /// with `k <= 128`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < TAPROOT_CONTROL_BASE_SIZE
            || (data.len() - TAPROOT_CONTROL_BASE_SIZE) % TAPROOT_CONTROL_NODE_SIZE != 0
        {
            return Err(TaprootError::InvalidControlBlock(
                "length is not 33 + 32k".into(),
            ));
        }
        let depth = (data.len() - TAPROOT_CONTROL_BASE_SIZE) / TAPROOT_CONTROL_NODE_SIZE;
        if depth > TAPROOT_CONTROL_MAX_NODE_COUNT {
            return Err(TaprootError::InvalidControlBlock(
                "merkle path exceeds the 128-node limit".into(),
            ));
        }

        let output_key_parity = if data[0] & 0x01 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        };
        let mut internal_key = [0u8; 32];
        internal_key.copy_from_slice(&data[1..33]);

        let merkle_path = data[TAPROOT_CONTROL_BASE_SIZE..]
            .chunks_exact(TAPROOT_CONTROL_NODE_SIZE)
            .map(|chunk| {
                let mut node = [0u8; 32];
                node.copy_from_slice(chunk);
                node
            })
            .collect();

        Ok(ControlBlock {
            leaf_version: data[0] & TAPROOT_LEAF_MASK,
            output_key_parity,
            internal_key,
            merkle_path,
        })
    }

    /// Verify that revealing `leaf_script` under this control block
    /// reproduces `claimed_output_key`
    ///
    /// Folds the leaf hash up the path with the same sorted TapBranch rule
    /// used at construction, recomputes the output key, and compares key
    /// and parity. Returns false, never an error, on any mismatch: a failed
    /// proof is an expected outcome, not a crash.
    pub fn verify(&self, leaf_script: &LeafScript, claimed_output_key: &XOnlyKeyBytes) -> bool {
        let leaf_hash = tap_leaf_hash_with_version(self.leaf_version, leaf_script.as_bytes());
        let candidate_root = fold_proof(&leaf_hash, &self.merkle_path);
        match compute_output_key(&self.internal_key, Some(&candidate_root)) {
            Ok((output_key, parity)) => {
                output_key == *claimed_output_key && parity == self.output_key_parity
            }
            Err(_) => false,
        }
    }
}
