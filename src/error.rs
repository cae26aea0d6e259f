//! Error types for Taproot commitment and spend construction

use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum TaprootError {
    #[error("Internal key is not a valid x-only public key")]
    InvalidInternalKey,

    #[error("Value is not a valid curve point")]
    InvalidPoint,

    #[error("Leaf index {index} out of range for tree with {leaf_count} leaves")]
    LeafIndexOutOfRange { index: usize, leaf_count: usize },

    #[error("Invalid tree shape: {0}")]
    InvalidTreeShape(Cow<'static, str>),

    #[error("Invalid control block: {0}")]
    InvalidControlBlock(Cow<'static, str>),

    #[error("Leaf version {0:#04x} has the parity bit set")]
    InvalidLeafVersion(u8),

    #[error("Script path does not reproduce the committed output key")]
    ScriptPathInvalid,

    #[error("Private key does not correspond to the internal public key")]
    SigningKeyMismatch,

    #[error("Tweak hash is not a valid scalar (exceeds the curve order)")]
    TweakOutOfRange,

    #[error("Serialization error: {0}")]
    Serialization(Cow<'static, str>),

    #[error("Secp256k1 operation failed: {0}")]
    Secp256k1(secp256k1::Error),
}

impl From<secp256k1::Error> for TaprootError {
    fn from(error: secp256k1::Error) -> Self {
        TaprootError::Secp256k1(error)
    }
}

pub type Result<T> = std::result::Result<T, TaprootError>;
