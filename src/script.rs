//! Leaf script representation and TapLeaf serialization
//!
//! A leaf script is an opaque, byte-serializable program plus a leaf
//! version byte (0xc0 for tapscript). Scripts are never evaluated here;
//! evaluation is the script interpreter's job. The crate only guarantees
//! byte-exact serialization: opcode encoding, push-data length prefixes,
//! and the TapLeaf encoding `version || compact_size(len) || script`.

use crate::error::{Result, TaprootError};
use crate::tagged_hash::{tagged_hash_parts, TAG_TAP_LEAF};
use crate::types::{ByteString, Hash};
use crate::varint::{decode_varint, encode_varint};
use serde::{Deserialize, Serialize};

/// OP_0 / OP_FALSE - Push empty array
pub const OP_0: u8 = 0x00;

/// OP_PUSHDATA1 - Push next byte as data length
pub const OP_PUSHDATA1: u8 = 0x4c;

/// OP_PUSHDATA2 - Push next 2 bytes (little-endian) as data length
pub const OP_PUSHDATA2: u8 = 0x4d;

/// OP_PUSHDATA4 - Push next 4 bytes (little-endian) as data length
pub const OP_PUSHDATA4: u8 = 0x4e;

/// OP_1 / OP_TRUE - Push 1 onto stack
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = 0x51;

/// OP_2 - Push 2 onto stack
pub const OP_2: u8 = 0x52;

/// OP_DROP - Remove top stack item
pub const OP_DROP: u8 = 0x75;

/// OP_EQUAL - Push 1 if top two items are equal, 0 otherwise
pub const OP_EQUAL: u8 = 0x87;

/// OP_EQUALVERIFY - Same as OP_EQUAL, but runs OP_VERIFY afterward
pub const OP_EQUALVERIFY: u8 = 0x88;

/// OP_SHA256 - The input is hashed using SHA-256
pub const OP_SHA256: u8 = 0xa8;

/// OP_CHECKSIG - Verify a signature against a public key
pub const OP_CHECKSIG: u8 = 0xac;

/// OP_CHECKSIGVERIFY - Same as OP_CHECKSIG, but runs OP_VERIFY afterward
pub const OP_CHECKSIGVERIFY: u8 = 0xad;

/// OP_CHECKSEQUENCEVERIFY - Relative timelock check (BIP112)
pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;

/// Tapscript leaf version (BIP342)
pub const TAPROOT_LEAF_TAPSCRIPT: u8 = 0xc0;

/// Mask selecting the leaf-version bits of a control block's first byte;
/// the low bit carries the output-key parity instead
pub const TAPROOT_LEAF_MASK: u8 = 0xfe;

/// Incremental builder for script byte sequences
///
/// Push-data encoding follows Bitcoin's minimal-push rules: lengths below
/// 0x4c use a direct length opcode, larger pushes use OP_PUSHDATA1/2/4.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    bytes: ByteString,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw opcode
    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.bytes.push(opcode);
        self
    }

    /// Append a data push with its length prefix
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.bytes.push(len as u8);
        } else if len <= 0xff {
            self.bytes.push(OP_PUSHDATA1);
            self.bytes.push(len as u8);
        } else if len <= 0xffff {
            self.bytes.push(OP_PUSHDATA2);
            self.bytes.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.bytes.push(OP_PUSHDATA4);
            self.bytes.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.bytes.extend_from_slice(data);
        self
    }

    /// Finish building, producing a tapscript-version leaf
    pub fn into_leaf(self) -> LeafScript {
        LeafScript::new(self.bytes)
    }

    /// Finish building, producing the raw script bytes
    pub fn into_bytes(self) -> ByteString {
        self.bytes
    }
}

/// One spending-condition script plus its leaf version
///
/// Immutable once constructed; identity for hashing purposes is the
/// serialized byte form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafScript {
    script: ByteString,
    version: u8,
}

impl LeafScript {
    /// Wrap raw script bytes with the default tapscript version (0xc0)
    pub fn new(script: ByteString) -> Self {
        LeafScript {
            script,
            version: TAPROOT_LEAF_TAPSCRIPT,
        }
    }

    /// Wrap raw script bytes with an explicit leaf version
    ///
    /// The version's low bit must be clear; it is reserved for the
    /// output-key parity in the control block's first byte.
    pub fn with_version(script: ByteString, version: u8) -> Result<Self> {
        if version & !TAPROOT_LEAF_MASK != 0 {
            return Err(TaprootError::InvalidLeafVersion(version));
        }
        Ok(LeafScript { script, version })
    }

    /// Parse a TapLeaf encoding: `version || compact_size(len) || script`
    pub fn from_tap_leaf_encoding(data: &[u8]) -> Result<Self> {
        let version = *data
            .first()
            .ok_or(TaprootError::Serialization("empty tap leaf encoding".into()))?;
        let (len, consumed) = decode_varint(&data[1..])?;
        let script = &data[1 + consumed..];
        if script.len() as u64 != len {
            return Err(TaprootError::Serialization(
                "tap leaf length prefix does not match script length".into(),
            ));
        }
        Self::with_version(script.to_vec(), version)
    }

    /// Raw script bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.script
    }

    /// Leaf version byte
    pub fn version(&self) -> u8 {
        self.version
    }

    /// TapLeaf encoding: `version || compact_size(len) || script`
    pub fn tap_leaf_encoding(&self) -> ByteString {
        let mut out = Vec::with_capacity(self.script.len() + 4);
        out.push(self.version);
        out.extend_from_slice(&encode_varint(self.script.len() as u64));
        out.extend_from_slice(&self.script);
        out
    }

    /// TapLeafHash: tagged hash of the TapLeaf encoding
    ///
    /// Depends only on this leaf's bytes and version, never the tree shape.
    pub fn tap_leaf_hash(&self) -> Hash {
        tap_leaf_hash_with_version(self.version, &self.script)
    }
}

/// TapLeafHash for an explicit version/script pair
///
/// Control-block verification hashes the revealed script under the
/// version carried in the control block, so the version is a parameter.
pub fn tap_leaf_hash_with_version(version: u8, script: &[u8]) -> Hash {
    tagged_hash_parts(
        TAG_TAP_LEAF,
        &[&[version], &encode_varint(script.len() as u64), script],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hash-lock leaf used throughout chapter 6 of the source material
    const HASH_LOCK_SCRIPT_HEX: &str =
        "a820936a185caaa266bb9cbe981e9e05cb78cd732b0b3280eb944412bb6f8f8f07af8851";
    const HASH_LOCK_LEAF_HASH_HEX: &str =
        "fe78d8523ce9603014b28739a51ef826f791aa17511e617af6dc96a8f10f659e";

    #[test]
    fn test_builder_produces_known_hash_lock_script() {
        let preimage_hash =
            hex::decode("936a185caaa266bb9cbe981e9e05cb78cd732b0b3280eb944412bb6f8f8f07af")
                .unwrap();
        let leaf = ScriptBuilder::new()
            .push_opcode(OP_SHA256)
            .push_slice(&preimage_hash)
            .push_opcode(OP_EQUALVERIFY)
            .push_opcode(OP_TRUE)
            .into_leaf();

        assert_eq!(hex::encode(leaf.as_bytes()), HASH_LOCK_SCRIPT_HEX);
        assert_eq!(leaf.version(), TAPROOT_LEAF_TAPSCRIPT);
    }

    #[test]
    fn test_tap_leaf_hash_known_vector() {
        let leaf = LeafScript::new(hex::decode(HASH_LOCK_SCRIPT_HEX).unwrap());
        assert_eq!(hex::encode(leaf.tap_leaf_hash()), HASH_LOCK_LEAF_HASH_HEX);
    }

    #[test]
    fn test_tap_leaf_encoding_layout() {
        let leaf = LeafScript::new(vec![OP_TRUE]);
        assert_eq!(leaf.tap_leaf_encoding(), vec![0xc0, 0x01, OP_TRUE]);
    }

    #[test]
    fn test_tap_leaf_encoding_round_trip() {
        let leaf = LeafScript::new(hex::decode(HASH_LOCK_SCRIPT_HEX).unwrap());
        let parsed = LeafScript::from_tap_leaf_encoding(&leaf.tap_leaf_encoding()).unwrap();
        assert_eq!(parsed, leaf);
    }

    #[test]
    fn test_tap_leaf_encoding_rejects_bad_length() {
        // Length prefix claims 2 bytes but only 1 follows
        let result = LeafScript::from_tap_leaf_encoding(&[0xc0, 0x02, OP_TRUE]);
        assert!(result.is_err());
    }

    #[test]
    fn test_leaf_version_parity_bit_rejected() {
        assert_eq!(
            LeafScript::with_version(vec![OP_TRUE], 0xc1),
            Err(TaprootError::InvalidLeafVersion(0xc1))
        );
        assert!(LeafScript::with_version(vec![OP_TRUE], 0xc2).is_ok());
    }

    #[test]
    fn test_tap_leaf_encoding_rejects_non_minimal_length_prefix() {
        // 0xfd-prefixed length for a 1-byte script does not round-trip
        let result = LeafScript::from_tap_leaf_encoding(&[0xc0, 0xfd, 0x01, 0x00, OP_TRUE]);
        assert!(result.is_err());
    }

    #[test]
    fn test_push_slice_encodings() {
        // Short push: direct length byte
        let short = ScriptBuilder::new().push_slice(&[0xaa; 32]).into_bytes();
        assert_eq!(short[0], 0x20);
        assert_eq!(short.len(), 33);

        // 0x4c and above: OP_PUSHDATA1
        let medium = ScriptBuilder::new().push_slice(&[0xbb; 80]).into_bytes();
        assert_eq!(medium[0], OP_PUSHDATA1);
        assert_eq!(medium[1], 80);
        assert_eq!(medium.len(), 82);

        // Above 255: OP_PUSHDATA2
        let large = ScriptBuilder::new().push_slice(&[0xcc; 300]).into_bytes();
        assert_eq!(large[0], OP_PUSHDATA2);
        assert_eq!(&large[1..3], &300u16.to_le_bytes());
    }

    #[test]
    fn test_leaf_hash_changes_with_version() {
        let script = vec![OP_TRUE];
        let tapscript = LeafScript::new(script.clone());
        let future = LeafScript::with_version(script, 0xc2).unwrap();
        assert_ne!(tapscript.tap_leaf_hash(), future.tap_leaf_hash());
    }
}
