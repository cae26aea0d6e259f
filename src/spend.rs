//! Spend authorization: key-path signing and script-path witness assembly
//!
//! Two independent terminal protocols, selected once per spend:
//!
//! - Key path: derive the tweaked private key and Schnorr-sign the sighash;
//!   the witness is the lone signature element.
//! - Script path: reveal one leaf plus its control block; the witness is
//!   `[script inputs...] || [leaf script] || [control block]`. Consensus
//!   parses the witness by position from the end, so the builder fixes the
//!   last two elements itself and the wrong order is unrepresentable.
//!
//! The Schnorr primitive is the `secp256k1` crate's; the aux-rand input is
//! caller-supplied, and nonce-reuse discipline across concurrent signs of
//! the same key is the caller's responsibility (BIP340).

use crate::control_block::{ControlBlock, TAPROOT_CONTROL_BASE_SIZE, TAPROOT_CONTROL_NODE_SIZE};
use crate::error::{Result, TaprootError};
use crate::merkle::{build_tree, TreeShape};
use crate::script::LeafScript;
use crate::taproot::{compute_output_key, compute_tweaked_private_key};
use crate::types::{ByteString, Hash, XOnlyKeyBytes};
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message, Secp256k1, SecretKey, XOnlyPublicKey};

/// Witness data: stack of witness elements
pub type Witness = Vec<ByteString>;

/// Sighash type byte meaning SIGHASH_DEFAULT; omitted from the signature
/// element (64 bytes instead of 65)
pub const SIGHASH_DEFAULT: u8 = 0x00;

/// Maximum size of one witness stack element
pub const MAX_WITNESS_ELEMENT_SIZE: usize = 520;

/// Authorize a key-path spend: witness = `[signature]`
///
/// Always tweaks: there is no untweaked Taproot key-path signature, even
/// for an empty script commitment. The sighash is computed by the caller's
/// transaction layer; `aux_rand` feeds BIP340 nonce generation. A
/// `sighash_type` other than default appends the flag byte, producing a
/// 65-byte element.
pub fn key_path_witness(
    sighash: &Hash,
    internal_private: &SecretKey,
    internal_key: &XOnlyKeyBytes,
    merkle_root: Option<&Hash>,
    sighash_type: u8,
    aux_rand: &[u8; 32],
) -> Result<Witness> {
    let secp = Secp256k1::new();
    let tweaked = compute_tweaked_private_key(internal_private, internal_key, merkle_root)?;
    let keypair = Keypair::from_secret_key(&secp, &tweaked);
    let message = Message::from_digest(*sighash);
    let signature = secp.sign_schnorr_with_aux_rand(&message, &keypair, aux_rand);

    let mut element = signature.as_ref().to_vec();
    if sighash_type != SIGHASH_DEFAULT {
        element.push(sighash_type);
    }
    Ok(vec![element])
}

/// Authorize a script-path spend: witness =
/// `[script inputs...] || [leaf script] || [control block]`
///
/// `script_inputs` are whatever stack items the chosen leaf's conditions
/// require (preimages, signatures over the leaf); they are opaque here.
/// Before returning, the assembled control block is verified against the
/// recomputed output key; failure aborts with `ScriptPathInvalid` rather
/// than emitting an unspendable witness.
pub fn script_path_witness(
    script_inputs: Vec<ByteString>,
    leaves: &[LeafScript],
    shape: &TreeShape,
    leaf_index: usize,
    internal_key: &XOnlyKeyBytes,
) -> Result<Witness> {
    let leaf = leaves
        .get(leaf_index)
        .ok_or(TaprootError::LeafIndexOutOfRange {
            index: leaf_index,
            leaf_count: leaves.len(),
        })?;

    let tree = build_tree(leaves, shape)?;
    let (output_key, parity) = compute_output_key(internal_key, tree.merkle_root().as_ref())?;
    let control = ControlBlock::build(internal_key, leaves, shape, leaf_index, parity)?;
    if !control.verify(leaf, &output_key) {
        return Err(TaprootError::ScriptPathInvalid);
    }

    let mut witness = script_inputs;
    witness.push(leaf.as_bytes().to_vec());
    witness.push(control.serialize());
    Ok(witness)
}

/// Verify a key-path witness element against a sighash and output key
///
/// Accepts the 64-byte form or the 65-byte form with a non-default
/// trailing sighash flag (a default flag must use the 64-byte form).
pub fn verify_key_path_signature(
    element: &[u8],
    sighash: &Hash,
    output_key: &XOnlyKeyBytes,
) -> bool {
    let sig_bytes = match element.len() {
        64 => &element[..64],
        65 if element[64] != SIGHASH_DEFAULT => &element[..64],
        _ => return false,
    };
    let Ok(signature) = Signature::from_slice(sig_bytes) else {
        return false;
    };
    let Ok(pubkey) = XOnlyPublicKey::from_slice(output_key) else {
        return false;
    };
    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*sighash);
    secp.verify_schnorr(&signature, &message, &pubkey).is_ok()
}

/// Validate Taproot witness structure
///
/// Key path: a single 64- or 65-byte signature. Script path: at least the
/// leaf script and a well-sized control block, with every element within
/// the 520-byte stack limit except the script and control block themselves.
pub fn validate_taproot_witness_structure(witness: &Witness, is_script_path: bool) -> bool {
    if witness.is_empty() {
        return false;
    }

    if is_script_path {
        if witness.len() < 2 {
            return false;
        }
        let control_block = &witness[witness.len() - 1];
        if control_block.len() < TAPROOT_CONTROL_BASE_SIZE
            || (control_block.len() - TAPROOT_CONTROL_BASE_SIZE) % TAPROOT_CONTROL_NODE_SIZE != 0
        {
            return false;
        }
        witness[..witness.len() - 2]
            .iter()
            .all(|element| element.len() <= MAX_WITNESS_ELEMENT_SIZE)
    } else {
        witness.len() == 1 && (witness[0].len() == 64 || witness[0].len() == 65)
    }
}
