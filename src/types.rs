//! Core types shared across the Taproot commitment engine

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Serialized x-only public key: 32-byte x coordinate, even y implied (BIP340)
pub type XOnlyKeyBytes = [u8; 32];

/// Merkle proof: ordered sibling hashes, immediate sibling first
pub type MerkleProof = Vec<Hash>;

/// Y-coordinate parity of a curve point
pub use secp256k1::Parity;
