//! TapTweak key derivation (BIP341)
//!
//! The output key published on-chain is the internal key shifted by the
//! tweak scalar `t = tagged_hash("TapTweak", internal_key || merkle_root)`:
//! `P' = lift_x(P) + t*G`. The matching private scalar is `d' = d + t` after
//! even-y normalization of `d`. Every P2TR output is tweaked; an empty
//! script commitment only shortens the tweak input, it never skips the
//! tweak.

use crate::error::{Result, TaprootError};
use crate::point;
use crate::tagged_hash::{tagged_hash_parts, TAG_TAP_TWEAK};
use crate::types::{ByteString, Hash, Parity, XOnlyKeyBytes};
use secp256k1::{Scalar, Secp256k1, SecretKey};

/// Taproot output script prefix: OP_1
pub const TAPROOT_SCRIPT_PREFIX: u8 = 0x51;

/// Taproot output script length: OP_1, push-32, 32-byte output key
pub const TAPROOT_SCRIPT_LENGTH: usize = 34;

/// TapTweak scalar for an internal key and optional merkle root
///
/// `None` feeds zero extra bytes into the hash, the BIP341 key-path-only
/// form.
pub fn tap_tweak_scalar(
    internal_key: &XOnlyKeyBytes,
    merkle_root: Option<&Hash>,
) -> Result<Scalar> {
    let digest = match merkle_root {
        Some(root) => tagged_hash_parts(TAG_TAP_TWEAK, &[internal_key, root]),
        None => tagged_hash_parts(TAG_TAP_TWEAK, &[internal_key]),
    };
    Scalar::from_be_bytes(digest).map_err(|_| TaprootError::TweakOutOfRange)
}

/// Compute the tweaked output key: `x_only(lift_x(internal) + t*G)`
///
/// Returns the x-only key bytes and the parity dropped by the x-only
/// normalization; the parity goes into the control block at spend time.
/// Deterministic: identical inputs always produce the identical key, which
/// is what lets a spender rebuild the commitment without stored state.
pub fn compute_output_key(
    internal_key: &XOnlyKeyBytes,
    merkle_root: Option<&Hash>,
) -> Result<(XOnlyKeyBytes, Parity)> {
    let internal = point::lift_x(internal_key).map_err(|_| TaprootError::InvalidInternalKey)?;
    let tweak = tap_tweak_scalar(internal_key, merkle_root)?;
    let tweak_point = point::scalar_base_mul(&tweak)?;
    let output = point::point_add(&internal, &tweak_point)?;
    Ok(point::x_only(&output))
}

/// Check that `output_key` is the tweak of `internal_key` under `merkle_root`
pub fn validate_output_key(
    internal_key: &XOnlyKeyBytes,
    merkle_root: Option<&Hash>,
    output_key: &XOnlyKeyBytes,
) -> Result<bool> {
    let (expected, _) = compute_output_key(internal_key, merkle_root)?;
    Ok(expected == *output_key)
}

/// Compute the private scalar matching [`compute_output_key`]
///
/// Normalizes `d` to the even-y representative first (negating it if `d*G`
/// has odd y), then adds the tweak. The normalization is unskippable here
/// rather than left to callers; forgetting it is the classic Taproot
/// signing bug. Fails with `SigningKeyMismatch` if `d*G` does not match
/// `internal_key`.
pub fn compute_tweaked_private_key(
    internal_private: &SecretKey,
    internal_key: &XOnlyKeyBytes,
    merkle_root: Option<&Hash>,
) -> Result<SecretKey> {
    let secp = Secp256k1::new();
    let public = internal_private.public_key(&secp);
    let (x_bytes, _) = point::x_only(&public);
    if x_bytes != *internal_key {
        return Err(TaprootError::SigningKeyMismatch);
    }

    let normalized = if point::is_even(&public) {
        *internal_private
    } else {
        internal_private.negate()
    };

    let tweak = tap_tweak_scalar(internal_key, merkle_root)?;
    normalized.add_tweak(&tweak).map_err(TaprootError::from)
}

/// Taproot output script: `OP_1 <32-byte output key>`
pub fn taproot_script_pubkey(output_key: &XOnlyKeyBytes) -> ByteString {
    let mut script = Vec::with_capacity(TAPROOT_SCRIPT_LENGTH);
    script.push(TAPROOT_SCRIPT_PREFIX);
    script.push(0x20);
    script.extend_from_slice(output_key);
    script
}

/// Validate that a script is P2TR: `OP_1 <32-byte program>`
pub fn validate_taproot_script(script: &[u8]) -> bool {
    script.len() == TAPROOT_SCRIPT_LENGTH
        && script[0] == TAPROOT_SCRIPT_PREFIX
        && script[1] == 0x20
}

/// Extract the output key from a P2TR script
pub fn extract_taproot_output_key(script: &[u8]) -> Option<XOnlyKeyBytes> {
    if !validate_taproot_script(script) {
        return None;
    }
    let mut output_key = [0u8; 32];
    output_key.copy_from_slice(&script[2..34]);
    Some(output_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Internal key used for the hash-lock output in chapter 6 of the
    // source material (address tb1p53ncq9y...kd43h)
    const INTERNAL_KEY_HEX: &str =
        "50be5fc44ec580c387bf45df275aaa8b27e2d7716af31f10eeed357d126bb4d3";
    const HASH_LOCK_LEAF_HASH_HEX: &str =
        "fe78d8523ce9603014b28739a51ef826f791aa17511e617af6dc96a8f10f659e";
    const SINGLE_LEAF_OUTPUT_KEY_HEX: &str =
        "a46780148be98aaa861ad0b5dfc5c9b935d515c7be8c9e2bc6cedfa594e2b6d9";
    const EMPTY_ROOT_OUTPUT_KEY_HEX: &str =
        "7e9e22f81c870d9f3b57389ff2dbbba5a7ed4b8352b38cffd474bfb9d8265cff";

    fn internal_key() -> XOnlyKeyBytes {
        hex::decode(INTERNAL_KEY_HEX).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_output_key_known_vector_single_leaf() {
        let root: Hash = hex::decode(HASH_LOCK_LEAF_HASH_HEX)
            .unwrap()
            .try_into()
            .unwrap();
        let (output_key, parity) = compute_output_key(&internal_key(), Some(&root)).unwrap();
        assert_eq!(hex::encode(output_key), SINGLE_LEAF_OUTPUT_KEY_HEX);
        assert_eq!(parity, Parity::Odd);
    }

    #[test]
    fn test_output_key_known_vector_empty_root() {
        let (output_key, parity) = compute_output_key(&internal_key(), None).unwrap();
        assert_eq!(hex::encode(output_key), EMPTY_ROOT_OUTPUT_KEY_HEX);
        assert_eq!(parity, Parity::Even);
    }

    #[test]
    fn test_validate_output_key() {
        let (output_key, _) = compute_output_key(&internal_key(), None).unwrap();
        assert!(validate_output_key(&internal_key(), None, &output_key).unwrap());
        assert!(!validate_output_key(&internal_key(), None, &[0x03; 32]).unwrap());
    }

    #[test]
    fn test_invalid_internal_key_rejected() {
        let result = compute_output_key(&[0u8; 32], None);
        assert_eq!(result, Err(TaprootError::InvalidInternalKey));
    }

    #[test]
    fn test_tweaked_private_key_matches_output_key() {
        let secp = Secp256k1::new();
        let private = SecretKey::from_slice(&[0x17; 32]).unwrap();
        let (xonly, _) = private.x_only_public_key(&secp);
        let internal = xonly.serialize();
        let root = [0x42u8; 32];

        let tweaked = compute_tweaked_private_key(&private, &internal, Some(&root)).unwrap();
        let (expected, _) = compute_output_key(&internal, Some(&root)).unwrap();
        let (derived, _) = tweaked.x_only_public_key(&secp);
        assert_eq!(derived.serialize(), expected);
    }

    #[test]
    fn test_signing_key_mismatch_detected() {
        let private = SecretKey::from_slice(&[0x17; 32]).unwrap();
        let result = compute_tweaked_private_key(&private, &internal_key(), None);
        assert_eq!(result, Err(TaprootError::SigningKeyMismatch));
    }

    #[test]
    fn test_script_pubkey_round_trip() {
        let (output_key, _) = compute_output_key(&internal_key(), None).unwrap();
        let script = taproot_script_pubkey(&output_key);
        assert_eq!(script.len(), TAPROOT_SCRIPT_LENGTH);
        assert!(validate_taproot_script(&script));
        assert_eq!(extract_taproot_output_key(&script), Some(output_key));
    }

    #[test]
    fn test_validate_taproot_script_rejects_malformed() {
        assert!(!validate_taproot_script(&[0x51, 0x20]));
        let mut wrong_prefix = taproot_script_pubkey(&[1u8; 32]);
        wrong_prefix[0] = 0x52;
        assert!(!validate_taproot_script(&wrong_prefix));
        assert_eq!(extract_taproot_output_key(&wrong_prefix), None);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn secret_key_strategy() -> impl Strategy<Value = SecretKey> {
        prop::collection::vec(any::<u8>(), 32..=32)
            .prop_filter_map("valid secret key", |bytes| {
                SecretKey::from_slice(&bytes).ok()
            })
    }

    fn root_strategy() -> impl Strategy<Value = Option<Hash>> {
        prop::option::of(prop::collection::vec(any::<u8>(), 32..=32).prop_map(|bytes| {
            let mut root = [0u8; 32];
            root.copy_from_slice(&bytes);
            root
        }))
    }

    proptest! {
        /// Output-key derivation is deterministic
        #[test]
        fn prop_output_key_deterministic(
            private in secret_key_strategy(),
            root in root_strategy()
        ) {
            let secp = Secp256k1::new();
            let internal = private.x_only_public_key(&secp).0.serialize();
            let first = compute_output_key(&internal, root.as_ref()).unwrap();
            let second = compute_output_key(&internal, root.as_ref()).unwrap();
            prop_assert_eq!(first, second);
        }

        /// d'*G always lands on the output key, including for odd-y d*G
        #[test]
        fn prop_tweaked_private_key_consistency(
            private in secret_key_strategy(),
            root in root_strategy()
        ) {
            let secp = Secp256k1::new();
            let internal = private.x_only_public_key(&secp).0.serialize();
            let (output_key, _) = compute_output_key(&internal, root.as_ref()).unwrap();
            let tweaked =
                compute_tweaked_private_key(&private, &internal, root.as_ref()).unwrap();
            let (derived, _) = tweaked.x_only_public_key(&secp);
            prop_assert_eq!(derived.serialize(), output_key);
        }
    }
}
