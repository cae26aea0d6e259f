//! Bitcoin CompactSize encoding/decoding
//!
//! Encoding rules:
//! - If value < 0xfd: single byte
//! - If value <= 0xffff: 0xfd prefix + 2 bytes (little-endian)
//! - If value <= 0xffffffff: 0xfe prefix + 4 bytes (little-endian)
//! - Otherwise: 0xff prefix + 8 bytes (little-endian)
//!
//! The TapLeaf encoding prefixes a script with its CompactSize length; this
//! must match Bitcoin Core's serialization exactly.

use crate::error::{Result, TaprootError};

/// Encode a u64 value as a Bitcoin CompactSize integer
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

/// Decode a CompactSize integer from the front of `data`
///
/// Returns the value and the number of bytes consumed. Non-minimal
/// encodings are rejected: Bitcoin Core rejects values that fit a
/// shorter tier, e.g. values < 0xfd carried under a 0xfd prefix.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data
        .first()
        .ok_or(TaprootError::Serialization("empty varint".into()))?;

    let (width, value, floor) = match first {
        0xfd => (3, read_le(data, 2)?, 0xfd),
        0xfe => (5, read_le(data, 4)?, 0x10000),
        0xff => (9, read_le(data, 8)?, 0x100000000),
        b => return Ok((b as u64, 1)),
    };
    if value < floor {
        return Err(TaprootError::Serialization(
            "non-minimal varint encoding".into(),
        ));
    }
    Ok((value, width))
}

fn read_le(data: &[u8], len: usize) -> Result<u64> {
    if data.len() < 1 + len {
        return Err(TaprootError::Serialization(
            "truncated varint payload".into(),
        ));
    }
    let mut value = 0u64;
    for (i, byte) in data[1..1 + len].iter().enumerate() {
        value |= (*byte as u64) << (8 * i);
    }
    Ok(value)
}
