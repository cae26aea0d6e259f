//! # Taproot Engine
//!
//! Pure-function implementation of the Taproot commitment machinery
//! (BIP340/341/342): tagged hashing, script-tree Merkle commitments,
//! TapTweak key derivation, control blocks, and the two spend
//! authorization paths.
//!
//! ## Architecture
//!
//! Commit phase: leaf scripts feed the Merkle commitment, whose root
//! tweaks the internal key into the output key embedded on-chain.
//! Reveal phase: the same inputs deterministically rebuild the tree, so a
//! spender derives the control block (script path) or the tweaked private
//! key (key path) without stored state.
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every operation is a deterministic function over
//!    immutable byte/scalar/point values; no I/O, no shared mutable state
//! 2. **Byte-Exact Interop**: TapLeaf encodings, control blocks, and
//!    witness layouts match Bitcoin consensus serialization exactly
//! 3. **Typed Failure**: structural preconditions are checked before any
//!    cryptographic operation; proof mismatches are values, not panics
//!
//! ## Usage
//!
//! ```rust
//! use taproot_engine::merkle::{build_tree, TreeShape};
//! use taproot_engine::script::{LeafScript, OP_TRUE};
//! use taproot_engine::taproot::compute_output_key;
//!
//! // Internal key from BIP341's test vectors (x-only form of 1*G is fine too)
//! let internal_key: [u8; 32] = [
//!     0x79, 0xbe, 0x66, 0x7e, 0xf9, 0xdc, 0xbb, 0xac, 0x55, 0xa0, 0x62, 0x95,
//!     0xce, 0x87, 0x0b, 0x07, 0x02, 0x9b, 0xfc, 0xdb, 0x2d, 0xce, 0x28, 0xd9,
//!     0x59, 0xf2, 0x81, 0x5b, 0x16, 0xf8, 0x17, 0x98,
//! ];
//! let leaves = vec![LeafScript::new(vec![OP_TRUE])];
//! let tree = build_tree(&leaves, &TreeShape::Balanced).unwrap();
//! let (output_key, _parity) =
//!     compute_output_key(&internal_key, tree.merkle_root().as_ref()).unwrap();
//! ```

pub mod control_block;
pub mod error;
pub mod merkle;
pub mod point;
pub mod script;
pub mod spend;
pub mod tagged_hash;
pub mod taproot;
pub mod types;
pub mod varint;

pub use control_block::ControlBlock;
pub use error::{Result, TaprootError};
pub use merkle::{build_tree, ShapeNode, TapTree, TreeShape};
pub use script::{LeafScript, ScriptBuilder};
pub use spend::{key_path_witness, script_path_witness, Witness};
pub use taproot::{compute_output_key, compute_tweaked_private_key, taproot_script_pubkey};
